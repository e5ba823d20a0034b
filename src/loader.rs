/*

    Wavefront OBJ / MTL reading.

    Only the subset the renderer needs is handled: v, f (with fan
    triangulation for polygons), mtllib and usemtl on the OBJ side,
    newmtl / Kd / map_Kd on the MTL side. Everything else is skipped.

    All failures at this boundary are ordinary LoadError values, the
    render core itself never sees them.

*/

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::material::{Lambertian, MaterialRegistry, TexturedLambertian};
use crate::mesh::Mesh;
use crate::prelude::*;
use crate::texture::Texture;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed vertex at line {line}: '{text}'")]
    Vertex { line: usize, text: String },

    #[error("malformed face at line {line}: '{text}'")]
    Face { line: usize, text: String },

    #[error("face references vertex {index} at line {line} but only {count} vertices are defined")]
    VertexIndex {
        line: usize,
        index: usize,
        count: usize,
    },

    #[error("malformed material statement at line {line}: '{text}'")]
    Material { line: usize, text: String },

    #[error("failed to decode texture {path}: {source}")]
    Texture {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("failed to parse config {path}: {source}")]
    Config {
        path: PathBuf,
        source: serde_json::Error,
    },
}

fn read_file(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read an OBJ file into a Mesh, registering any referenced materials
pub fn load_obj(path: &Path, registry: &mut MaterialRegistry) -> Result<Mesh, LoadError> {
    let source = read_file(path)?;
    let base_dir = path.parent().unwrap_or(Path::new("."));

    let triangles = parse_obj(&source, base_dir, registry)?;
    info!("Loaded {} triangles from {}", triangles.len(), path.display());
    Ok(Mesh::new(triangles))
}

fn parse_obj(
    source: &str,
    base_dir: &Path,
    registry: &mut MaterialRegistry,
) -> Result<Vec<crate::shapes::Triangle>, LoadError> {
    use crate::shapes::Triangle;

    let mut vertices: Vec<Vector3> = Vec::new();
    let mut triangles: Vec<Triangle> = Vec::new();
    let mut current_material = MaterialRegistry::MISSING_TEXTURE;

    for (index, raw) in source.lines().enumerate() {
        let line_number = index + 1;
        let line = raw.trim();

        if let Some(rest) = line.strip_prefix("v ") {
            vertices.push(parse_vertex(rest, line_number)?);
        } else if let Some(rest) = line.strip_prefix("f ") {
            let corners = parse_face(rest, &vertices, line_number)?;
            // Fan triangulation covers quads and larger convex polygons
            for i in 1..corners.len() - 1 {
                triangles.push(Triangle::new(
                    corners[0],
                    corners[i],
                    corners[i + 1],
                    current_material,
                ));
            }
        } else if let Some(rest) = line.strip_prefix("mtllib ") {
            load_mtl(&base_dir.join(rest.trim()), registry)?;
        } else if let Some(rest) = line.strip_prefix("usemtl ") {
            current_material = registry.index_of(rest.trim());
        }
        // vn / vt / o / g / s and comments are skipped
    }

    Ok(triangles)
}

fn parse_vertex(text: &str, line: usize) -> Result<Vector3, LoadError> {
    let mut parts = text.split_whitespace();
    let mut next_float = || -> Option<Float> { parts.next()?.parse().ok() };

    match (next_float(), next_float(), next_float()) {
        (Some(x), Some(y), Some(z)) => Ok(Vector3::new(x, y, z)),
        _ => Err(LoadError::Vertex {
            line,
            text: text.to_string(),
        }),
    }
}

/// Resolve the vertex positions of one face line. Accepts `v`, `v/t`,
/// `v//n` and `v/t/n` index triplets, 1-based as OBJ defines them.
fn parse_face(text: &str, vertices: &[Vector3], line: usize) -> Result<Vec<Vector3>, LoadError> {
    let mut corners = Vec::new();

    for triplet in text.split_whitespace() {
        let index_text = triplet.split('/').next().unwrap_or("");
        let index: usize = index_text.parse().map_err(|_| LoadError::Face {
            line,
            text: text.to_string(),
        })?;

        if index == 0 || index > vertices.len() {
            return Err(LoadError::VertexIndex {
                line,
                index,
                count: vertices.len(),
            });
        }
        corners.push(vertices[index - 1]);
    }

    if corners.len() < 3 {
        return Err(LoadError::Face {
            line,
            text: text.to_string(),
        });
    }
    Ok(corners)
}

/// Per-material state accumulated while walking an MTL file
struct MtlBuilder {
    name: String,
    kd: Option<Vector3>,
    map_kd: Option<Texture>,
}

impl MtlBuilder {
    fn register(self, registry: &mut MaterialRegistry) {
        match (self.map_kd, self.kd) {
            (Some(texture), _) => {
                registry.add(&self.name, Box::new(TexturedLambertian::new(texture)));
            }
            (None, Some(kd)) => {
                registry.add(&self.name, Box::new(Lambertian::new(kd)));
            }
            (None, None) => {
                warn!("material '{}' defines no Kd or map_Kd, skipping", self.name);
            }
        }
    }
}

fn load_mtl(path: &Path, registry: &mut MaterialRegistry) -> Result<(), LoadError> {
    let source = read_file(path)?;
    let base_dir = path.parent().unwrap_or(Path::new("."));
    let mut building: Option<MtlBuilder> = None;

    for (index, raw) in source.lines().enumerate() {
        let line_number = index + 1;
        let line = raw.trim();

        if let Some(name) = line.strip_prefix("newmtl ") {
            if let Some(done) = building.take() {
                done.register(registry);
            }
            debug!("parsing material '{}'", name.trim());
            building = Some(MtlBuilder {
                name: name.trim().to_string(),
                kd: None,
                map_kd: None,
            });
        } else if let Some(rest) = line.strip_prefix("Kd ") {
            let builder = building.as_mut().ok_or_else(|| LoadError::Material {
                line: line_number,
                text: line.to_string(),
            })?;
            builder.kd = Some(parse_vertex(rest, line_number).map_err(|_| LoadError::Material {
                line: line_number,
                text: line.to_string(),
            })?);
        } else if let Some(rest) = line.strip_prefix("map_Kd ") {
            let builder = building.as_mut().ok_or_else(|| LoadError::Material {
                line: line_number,
                text: line.to_string(),
            })?;
            let texture_path = base_dir.join(rest.trim());
            let texture = Texture::load(&texture_path).map_err(|source| LoadError::Texture {
                path: texture_path.clone(),
                source,
            })?;
            builder.map_kd = Some(texture);
        }
        // Ns, Ka, Ks, Ke, Ni, d, illum are accepted but ignored
    }

    if let Some(done) = building.take() {
        done.register(registry);
    }
    Ok(())
}
