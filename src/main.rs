/*

    A small tile-parallel path tracer for triangle meshes.

    Usage: raytracer <model.obj> [config.json]

    The OBJ file provides the geometry (and materials through mtllib),
    the optional JSON config overrides camera, render settings and the
    mesh placement. Output lands next to the working directory as a
    PNG named after the config's image_name.

*/

use std::{env, path::Path, process};

use tracing::{error, info};

use ember_tracer::loader;
use ember_tracer::material::MaterialRegistry;
use ember_tracer::prelude::*;
use ember_tracer::renderer;
use ember_tracer::scene::{Scene, SceneConfig};
use ember_tracer::shapes::{Hittable, HittableList};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging on console
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let (obj_path, config_path) = match args.len() {
        2 => (args[1].as_str(), None),
        3 => (args[1].as_str(), Some(args[2].as_str())),
        _ => {
            error!("Usage: {} <model.obj> [config.json]", args[0]);
            process::exit(1);
        }
    };

    let config = match config_path {
        Some(path) => SceneConfig::from_json_file(Path::new(path)).map_err(|e| {
            error!("Failed to load config: {}", e);
            Box::<dyn std::error::Error>::from(e)
        })?,
        None => {
            info!("No config provided, rendering with defaults");
            SceneConfig::default()
        }
    };

    let mut registry = MaterialRegistry::default();
    let mut mesh = loader::load_obj(Path::new(obj_path), &mut registry).map_err(|e| {
        error!("Failed to load model: {}", e);
        Box::<dyn std::error::Error>::from(e)
    })?;

    // Placement order matters: shape changes first, rigid motion last
    let placement = &config.mesh;
    mesh.scale(placement.scale);
    mesh.rotate(
        degrees_to_radians(placement.rotate_degrees),
        &placement.rotate_axis,
    );
    mesh.set_origin(placement.position);
    if let Some(name) = &placement.material {
        mesh.set_material(registry.index_of(name));
    }
    if placement.double_sided {
        mesh.set_double_sided(true);
    }
    info!(
        "Placed mesh with {} triangles, bounds {:?}",
        mesh.triangle_count(),
        mesh.bounds()
    );

    let mut world = HittableList::new();
    world.add(Box::new(mesh));

    let mut camera = config.camera.clone();
    camera.setup();

    let scene = Arc::new(Scene::new(world, registry, camera, config.settings.clone()));
    let image = renderer::render(&scene, config.image_name.clone());

    image.save_png("./")?;
    info!("Finished execution.");
    Ok(())
}
