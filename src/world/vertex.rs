use nalgebra as na;
use na::{Point3, Vector3};

use crate::pipeline::ShaderVertex;
use crate::util::Color;

/// Vertex of a loaded model: object space position, normal and material colors.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    pub position: Vector3<f32>,
    pub normal: Vector3<f32>,   // Zero, when the model has no normals.
    pub ambient: Vector3<f32>,  // rgb in [0.0, 1.0].
    pub diffuse: Vector3<f32>,
    pub emissive: Vector3<f32>,
}

impl Vertex {
    pub fn ambient_color(&self) -> Color {
        return Color::new(self.ambient.x, self.ambient.y, self.ambient.z);
    }
}

impl ShaderVertex for Vertex {
    fn position(&self) -> Point3<f32> {
        return Point3::from(self.position);
    }

    fn weighted_sum(vertices: [&Self; 3], weights: Vector3<f32>) -> Self {
        let [a, b, c] = vertices;
        let mix = |x: Vector3<f32>, y: Vector3<f32>, z: Vector3<f32>| x * weights.x + y * weights.y + z * weights.z;
        return Vertex {
            position: mix(a.position, b.position, c.position),
            normal: mix(a.normal, b.normal, c.normal),
            ambient: mix(a.ambient, b.ambient, c.ambient),
            diffuse: mix(a.diffuse, b.diffuse, c.diffuse),
            emissive: mix(a.emissive, b.emissive, c.emissive),
        };
    }
}
