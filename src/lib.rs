
pub mod ray;
pub mod bbox;
pub mod bvh;
pub mod mesh;
pub mod image;
pub mod scene;
pub mod camera;
pub mod shapes;
pub mod numeric;
pub mod interval;
pub mod material;
pub mod texture;
pub mod threadpool;
pub mod renderer;
pub mod loader;
pub mod sampler;

pub mod prelude;
