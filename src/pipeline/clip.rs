use nalgebra as na;
use na::{vector, Vector4};

use super::rasterizer::ShaderVertex;

/// Smallest w accepted before the perspective divide.
pub const W_EPSILON: f32 = 1e-5;

/// Plane in homogeneous clip space, a point p is inside when normal.dot(p) - offset >= 0.
#[derive(Debug, Clone, Copy)]
pub struct ClipPlane {
    pub normal: [f32; 4],
    pub offset: f32,
}

impl ClipPlane {
    const fn new(x: f32, y: f32, z: f32, w: f32, offset: f32) -> Self {
        return Self {
            normal: [x, y, z, w],
            offset,
        };
    }

    pub fn distance(&self, p: &Vector4<f32>) -> f32 {
        let n = self.normal;
        return n[0] * p.x + n[1] * p.y + n[2] * p.z + n[3] * p.w - self.offset;
    }
}

/// The six planes of the view volume -w <= x, y, z <= w.
pub const FRUSTUM_PLANES: [ClipPlane; 6] = [
    ClipPlane::new(1.0, 0.0, 0.0, 1.0, 0.0),  // Left.
    ClipPlane::new(-1.0, 0.0, 0.0, 1.0, 0.0), // Right.
    ClipPlane::new(0.0, 1.0, 0.0, 1.0, 0.0),  // Bottom.
    ClipPlane::new(0.0, -1.0, 0.0, 1.0, 0.0), // Top.
    ClipPlane::new(0.0, 0.0, 1.0, 1.0, 0.0),  // Near.
    ClipPlane::new(0.0, 0.0, -1.0, 1.0, 0.0), // Far.
];

/// Planes polygons are actually cut against. Everything else is left to the bounding box and
/// the per-pixel depth range check.
pub const CUTTING_PLANES: [ClipPlane; 2] = [
    ClipPlane::new(0.0, 0.0, 1.0, 1.0, 0.0),
    ClipPlane::new(0.0, 0.0, 0.0, 1.0, W_EPSILON),
];

/// Vertex shader output: clip space position and the data passed through to the pixel shader.
#[derive(Debug, Clone)]
pub struct ClipVertex<V> {
    pub position: Vector4<f32>,
    pub data: V,
}

impl<V: ShaderVertex> ClipVertex<V> {
    /// Point on the segment a -> b at parameter t.
    fn lerp(a: &Self, b: &Self, t: f32) -> Self {
        return Self {
            position: a.position + (b.position - a.position) * t,
            data: V::weighted_sum([&a.data, &b.data, &a.data], vector![1.0 - t, t, 0.0]),
        };
    }
}

/// True when all three vertices are outside of the same view volume plane, so the triangle can't
/// cover anything.
pub fn is_trivially_rejected(positions: [&Vector4<f32>; 3]) -> bool {
    if positions.iter().all(|p| p.w <= 0.0) {
        return true;
    }
    return FRUSTUM_PLANES
        .iter()
        .any(|plane| positions.iter().all(|p| plane.distance(p) < 0.0));
}

/// True when at least one vertex is in front of the near plane or has too small w.
pub fn needs_clipping(positions: [&Vector4<f32>; 3]) -> bool {
    return CUTTING_PLANES
        .iter()
        .any(|plane| positions.iter().any(|p| plane.distance(p) < 0.0));
}

/// Sutherland-Hodgman pass of a convex polygon against a single plane.
pub fn clip_polygon<V: ShaderVertex>(polygon: &[ClipVertex<V>], plane: &ClipPlane) -> Vec<ClipVertex<V>> {
    let mut result = Vec::with_capacity(polygon.len() + 1);
    for i in 0..polygon.len() {
        let current = &polygon[i];
        let next = &polygon[(i + 1) % polygon.len()];
        let current_distance = plane.distance(&current.position);
        let next_distance = plane.distance(&next.position);

        if current_distance >= 0.0 {
            result.push(current.clone());
        }
        if (current_distance >= 0.0) != (next_distance >= 0.0) {
            let t = current_distance / (current_distance - next_distance);
            result.push(ClipVertex::lerp(current, next, t));
        }
    }
    return result;
}

/// Cuts a triangle against the near and w planes and fans the remaining polygon back into
/// triangles. Result is empty when nothing is left.
pub fn clip_triangle<V: ShaderVertex>(triangle: [ClipVertex<V>; 3]) -> Vec<[ClipVertex<V>; 3]> {
    let mut polygon = triangle.to_vec();
    for plane in CUTTING_PLANES.iter() {
        polygon = clip_polygon(&polygon, plane);
        if polygon.len() < 3 {
            return Vec::new();
        }
    }

    let mut triangles = Vec::with_capacity(polygon.len() - 2);
    for i in 1..polygon.len() - 1 {
        triangles.push([polygon[0].clone(), polygon[i].clone(), polygon[i + 1].clone()]);
    }
    return triangles;
}
