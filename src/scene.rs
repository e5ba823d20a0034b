/*

    Scene: everything the renderer reads, wired together.

    The geometry, material registry and camera are assembled at load
    time and never mutated during rendering, which is what lets the
    worker threads share the Scene behind a plain Arc.

*/

use std::path::Path;

use crate::camera::Camera;
use crate::loader::LoadError;
use crate::material::MaterialRegistry;
use crate::prelude::*;
use crate::shapes::HittableList;

#[derive(Debug, Clone, Deserialize, SmartDefault)]
#[serde(default)]
pub struct RenderSettings {
    /// Count of random samples for each pixel
    #[default = 16]
    pub samples_per_pixel: usize,

    /// Maximum number of ray bounces into the scene
    #[default = 10]
    pub max_depth: usize,

    /// Size of each tile in pixels (a tile covers tile_size^2
    /// consecutive framebuffer indices)
    #[default = 16]
    pub tile_size: usize,

    /// Worker thread override, None means one per hardware thread.
    /// Set to 1 for a deterministic single-threaded render.
    pub threads: Option<usize>,

    /// Background gradient at the horizon (ray.y = -1)
    #[default(Vector3::ONE)]
    pub background_horizon: Vector3,

    /// Background gradient at the zenith (ray.y = +1)
    #[default(Vector3::new(0.5, 0.7, 1.0))]
    pub background_zenith: Vector3,
}

/// Placement applied to the loaded mesh before the BVH is frozen
#[derive(Debug, Clone, Deserialize, SmartDefault)]
#[serde(default)]
pub struct MeshPlacement {
    #[default(Vector3::ONE)]
    pub scale: Vector3,

    /// Rotation in degrees about `rotate_axis` through the mesh origin
    #[default = 0.0]
    pub rotate_degrees: Float,

    #[default(Vector3::Y)]
    pub rotate_axis: Vector3,

    #[default(Vector3::ZERO)]
    pub position: Vector3,

    /// Override every triangle with this registry material
    pub material: Option<String>,

    #[default = false]
    pub double_sided: bool,
}

#[derive(Debug, Clone, Deserialize, SmartDefault)]
#[serde(default)]
pub struct SceneConfig {
    pub camera: Camera,
    pub settings: RenderSettings,
    pub mesh: MeshPlacement,

    #[default("render".to_string())]
    pub image_name: String,
}

impl SceneConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, LoadError> {
        let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SceneConfig =
            serde_json::from_str(&source).map_err(|source| LoadError::Config {
                path: path.to_path_buf(),
                source,
            })?;
        info!("Loaded render config from {}", path.display());
        Ok(config)
    }
}

#[derive(Debug)]
pub struct Scene {
    pub world: HittableList,
    pub registry: MaterialRegistry,
    pub camera: Camera,
    pub settings: RenderSettings,
}

impl Scene {
    pub fn new(
        world: HittableList,
        registry: MaterialRegistry,
        camera: Camera,
        settings: RenderSettings,
    ) -> Self {
        Self {
            world,
            registry,
            camera,
            settings,
        }
    }
}
