//! Scene collaborators: camera, model and the vertex format they share with the pipeline.

pub mod camera;
pub mod model;
pub mod vertex;

pub use camera::Camera;
pub use model::{Model, ModelError, Submesh};
pub use vertex::Vertex;
