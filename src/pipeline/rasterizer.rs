use std::rc::Rc;

use nalgebra as na;
use na::{vector, Point3, Vector3, Vector4};
use thiserror::Error;

use super::buffer::Buffer;
use super::clip::{clip_triangle, is_trivially_rejected, needs_clipping, ClipVertex};
use crate::util::{from_hom_point, to_hom_point, Color};

/// Value depth buffer is reset to, anything drawn is nearer.
pub const FAR_DEPTH: f32 = f32::MAX;

/// Triangles with doubled screen area below this are treated as degenerate.
const DEGENERATE_AREA: f32 = 1e-6;

/// Data a vertex buffer element has to provide to go through the pipeline.
pub trait ShaderVertex: Clone {
    /// Object space position.
    fn position(&self) -> Point3<f32>;

    /// Weighted combination of three vertices, used both for clipping and for interpolation of
    /// the data handed to the pixel shader. Weights sum up to 1.
    fn weighted_sum(vertices: [&Self; 3], weights: Vector3<f32>) -> Self;
}

/// Type representing vertex shader: object space position in homogeneous coordinates and the
/// vertex itself in, clip space position and data for the pixel shader out.
pub type VertexShader<V> = dyn Fn(Vector4<f32>, V) -> (Vector4<f32>, V);

/// Type representing pixel shader: interpolated vertex data and NDC depth in, color out.
pub type PixelShader<V> = dyn Fn(V, f32) -> Color;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RasterError {
    #[error("depth buffer is {depth_width}x{depth_height}, but render target is {width}x{height}")]
    DimensionMismatch {
        width: usize,
        height: usize,
        depth_width: usize,
        depth_height: usize,
    },
    #[error("nothing is bound as {0}")]
    Unbound(&'static str),
}

/// Counters collected during a single draw call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrawStats {
    pub triangles: usize,
    pub rejected: usize,
    pub clipped: usize,
    pub vertices_shaded: usize,
    pub pixels_shaded: usize,
}

/// Vertex after the perspective divide and the viewport transform.
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    z: f32,     // NDC depth, interpolated linearly in screen space.
    inv_w: f32, // Used for perspective correct interpolation of vertex data.
}

/// Triangle rasterizer with pluggable vertex and pixel shaders.
/// V is the vertex buffer element, RT is the render target element.
pub struct Rasterizer<V, RT> {
    width: usize,
    height: usize,
    render_target: Option<Buffer<RT>>,
    depth_buffer: Option<Buffer<f32>>,
    vertex_buffer: Option<Rc<Buffer<V>>>,
    index_buffer: Option<Rc<Buffer<u32>>>,
    vertex_shader: Option<Box<VertexShader<V>>>,
    pixel_shader: Option<Box<PixelShader<V>>>,
}

impl<V, RT> Default for Rasterizer<V, RT> {
    fn default() -> Self {
        return Self {
            width: 0,
            height: 0,
            render_target: None,
            depth_buffer: None,
            vertex_buffer: None,
            index_buffer: None,
            vertex_shader: None,
            pixel_shader: None,
        };
    }
}

impl<V, RT> Rasterizer<V, RT>
where
    V: ShaderVertex,
    RT: Copy + From<Color>,
{
    pub fn new() -> Self {
        return Self::default();
    }

    /// Sets dimensions used to map normalized device coordinates to pixels.
    pub fn set_viewport(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    /// Binds output buffers. Without a depth buffer triangles are drawn in submission order.
    /// On error previous binding stays as it was.
    pub fn set_render_target(
        &mut self,
        render_target: Buffer<RT>,
        depth_buffer: Option<Buffer<f32>>,
    ) -> Result<(), RasterError> {
        if let Some(depth_buffer) = &depth_buffer {
            if !depth_buffer.same_dimensions(&render_target) {
                return Err(RasterError::DimensionMismatch {
                    width: render_target.width(),
                    height: render_target.height(),
                    depth_width: depth_buffer.width(),
                    depth_height: depth_buffer.height(),
                });
            }
        }
        self.render_target = Some(render_target);
        self.depth_buffer = depth_buffer;
        return Ok(());
    }

    pub fn render_target(&self) -> Option<&Buffer<RT>> {
        return self.render_target.as_ref();
    }

    pub fn render_target_mut(&mut self) -> Option<&mut Buffer<RT>> {
        return self.render_target.as_mut();
    }

    pub fn depth_buffer(&self) -> Option<&Buffer<f32>> {
        return self.depth_buffer.as_ref();
    }

    pub fn set_vertex_buffer(&mut self, vertex_buffer: Rc<Buffer<V>>) {
        self.vertex_buffer = Some(vertex_buffer);
    }

    pub fn set_index_buffer(&mut self, index_buffer: Rc<Buffer<u32>>) {
        self.index_buffer = Some(index_buffer);
    }

    pub fn set_vertex_shader(&mut self, shader: impl Fn(Vector4<f32>, V) -> (Vector4<f32>, V) + 'static) {
        self.vertex_shader = Some(Box::new(shader));
    }

    pub fn set_pixel_shader(&mut self, shader: impl Fn(V, f32) -> Color + 'static) {
        self.pixel_shader = Some(Box::new(shader));
    }

    /// Drops shaders together with whatever they captured.
    pub fn clear_shaders(&mut self) {
        self.vertex_shader = None;
        self.pixel_shader = None;
    }

    /// Sets every pixel of the render target to color and resets the depth buffer, if bound.
    pub fn clear_render_target(&mut self, color: RT) -> Result<(), RasterError> {
        let render_target = self
            .render_target
            .as_mut()
            .ok_or(RasterError::Unbound("render target"))?;
        render_target.fill(color);
        if let Some(depth_buffer) = self.depth_buffer.as_mut() {
            depth_buffer.fill(FAR_DEPTH);
        }
        return Ok(());
    }

    /// Draws vertex_count indices starting at start_index from the bound index buffer as a list
    /// of triangles. Trailing indices, which don't make a full triangle, are ignored.
    pub fn draw(&mut self, vertex_count: usize, start_index: usize) -> Result<DrawStats, RasterError> {
        let Rasterizer {
            width,
            height,
            render_target,
            depth_buffer,
            vertex_buffer,
            index_buffer,
            vertex_shader,
            pixel_shader,
        } = self;
        let render_target = render_target.as_mut().ok_or(RasterError::Unbound("render target"))?;
        let vertex_buffer = vertex_buffer.as_ref().ok_or(RasterError::Unbound("vertex buffer"))?;
        let index_buffer = index_buffer.as_ref().ok_or(RasterError::Unbound("index buffer"))?;
        let vertex_shader = vertex_shader.as_deref().ok_or(RasterError::Unbound("vertex shader"))?;
        let pixel_shader = pixel_shader.as_deref().ok_or(RasterError::Unbound("pixel shader"))?;

        // Clamping to the render target too, so a viewport bigger than the target can't write
        // out of its bounds.
        let viewport = (
            (*width).min(render_target.width()),
            (*height).min(render_target.height()),
            *width as f32,
            *height as f32,
        );

        let mut stats = DrawStats::default();
        // Every vertex index is shaded once per draw call.
        let mut shaded_vertices: Vec<Option<ClipVertex<V>>> = vec![None; vertex_buffer.get_number_of_elements()];
        let end_index = start_index + vertex_count;
        let mut triangle_start = start_index;
        while triangle_start + 3 <= end_index {
            let mut fetch = |offset: usize| -> ClipVertex<V> {
                let vertex_index = index_buffer[triangle_start + offset] as usize;
                if let Some(shaded) = &shaded_vertices[vertex_index] {
                    return shaded.clone();
                }
                let vertex = vertex_buffer[vertex_index].clone();
                let (position, data) = vertex_shader(to_hom_point(vertex.position().coords), vertex);
                let shaded = ClipVertex { position, data };
                shaded_vertices[vertex_index] = Some(shaded.clone());
                stats.vertices_shaded += 1;
                return shaded;
            };
            let triangle = [fetch(0), fetch(1), fetch(2)];
            triangle_start += 3;
            stats.triangles += 1;

            let positions = [&triangle[0].position, &triangle[1].position, &triangle[2].position];
            if is_trivially_rejected(positions) {
                stats.rejected += 1;
                continue;
            }
            if needs_clipping(positions) {
                stats.clipped += 1;
                for clipped_triangle in clip_triangle(triangle) {
                    stats.pixels_shaded += rasterize_triangle(
                        &clipped_triangle,
                        viewport,
                        render_target,
                        depth_buffer.as_mut(),
                        pixel_shader,
                    );
                }
            } else {
                stats.pixels_shaded +=
                    rasterize_triangle(&triangle, viewport, render_target, depth_buffer.as_mut(), pixel_shader);
            }
        }

        log::debug!(
            "Draw call: {} triangles, {} rejected, {} clipped, {} vertices and {} pixels shaded",
            stats.triangles,
            stats.rejected,
            stats.clipped,
            stats.vertices_shaded,
            stats.pixels_shaded
        );
        return Ok(stats);
    }
}

/// Edge function: doubled signed area of (a, b, p). Positive, when p is on the inner side of
/// a -> b for a triangle with positive area.
fn edge_function(a: &ScreenVertex, b: &ScreenVertex, p_x: f32, p_y: f32) -> f32 {
    return (b.x - a.x) * (p_y - a.y) - (b.y - a.y) * (p_x - a.x);
}

/// Top-left fill rule. Triangles are brought to positive area first, so with y pointing down
/// top edges go right and left edges go up.
fn is_top_left(a: &ScreenVertex, b: &ScreenVertex) -> bool {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    return (dy == 0.0 && dx > 0.0) || dy < 0.0;
}

/// Perspective divide and viewport transform. (0, 0) is the top left pixel corner.
fn to_screen_vertex(position: &Vector4<f32>, viewport_width: f32, viewport_height: f32) -> ScreenVertex {
    let ndc = from_hom_point(*position);
    return ScreenVertex {
        x: (ndc.x + 1.0) * viewport_width / 2.0,
        y: (1.0 - ndc.y) * viewport_height / 2.0,
        z: ndc.z,
        inv_w: 1.0 / position.w,
    };
}

/// Fills a single clipped triangle, returns the number of pixels handed to the pixel shader.
fn rasterize_triangle<V: ShaderVertex, RT: From<Color>>(
    triangle: &[ClipVertex<V>; 3],
    viewport: (usize, usize, f32, f32),
    render_target: &mut Buffer<RT>,
    mut depth_buffer: Option<&mut Buffer<f32>>,
    pixel_shader: &PixelShader<V>,
) -> usize {
    let (max_width, max_height, viewport_width, viewport_height) = viewport;
    let mut screen = [
        to_screen_vertex(&triangle[0].position, viewport_width, viewport_height),
        to_screen_vertex(&triangle[1].position, viewport_width, viewport_height),
        to_screen_vertex(&triangle[2].position, viewport_width, viewport_height),
    ];
    let mut data = [&triangle[0].data, &triangle[1].data, &triangle[2].data];
    if screen.iter().any(|v| !(v.x.is_finite() && v.y.is_finite() && v.z.is_finite())) {
        return 0;
    }

    let mut area = edge_function(&screen[0], &screen[1], screen[2].x, screen[2].y);
    if area.abs() < DEGENERATE_AREA {
        return 0;
    }
    // Same winding for everything, so the fill rule treats shared edges the same way.
    if area < 0.0 {
        screen.swap(1, 2);
        data.swap(1, 2);
        area = -area;
    }

    // Bounding box in pixels, intersected with the viewport.
    let min_x = screen.iter().map(|v| v.x).fold(f32::MAX, f32::min).floor().max(0.0) as usize;
    let min_y = screen.iter().map(|v| v.y).fold(f32::MAX, f32::min).floor().max(0.0) as usize;
    let max_x = (screen.iter().map(|v| v.x).fold(f32::MIN, f32::max).ceil() as usize).min(max_width);
    let max_y = (screen.iter().map(|v| v.y).fold(f32::MIN, f32::max).ceil() as usize).min(max_height);

    let edges = [(1, 2), (2, 0), (0, 1)];
    let top_left = edges.map(|(a, b)| is_top_left(&screen[a], &screen[b]));
    let mut pixels_shaded = 0;
    for y in min_y..max_y {
        for x in min_x..max_x {
            let p_x = x as f32 + 0.5;
            let p_y = y as f32 + 0.5;
            let mut weights = [0.0; 3];
            let mut covered = true;
            for (i, (a, b)) in edges.iter().enumerate() {
                let weight = edge_function(&screen[*a], &screen[*b], p_x, p_y);
                if weight < 0.0 || (weight == 0.0 && !top_left[i]) {
                    covered = false;
                    break;
                }
                weights[i] = weight / area;
            }
            if !covered {
                continue;
            }

            let z = weights[0] * screen[0].z + weights[1] * screen[1].z + weights[2] * screen[2].z;
            if z > 1.0 {
                // Behind the far plane.
                continue;
            }
            if let Some(depth_buffer) = depth_buffer.as_mut() {
                let stored = depth_buffer.item_at(x, y);
                if z >= *stored {
                    continue;
                }
                *stored = z;
            }

            let perspective_weights = vector![
                weights[0] * screen[0].inv_w,
                weights[1] * screen[1].inv_w,
                weights[2] * screen[2].inv_w
            ];
            let perspective_weights = perspective_weights / perspective_weights.sum();
            let interpolated = V::weighted_sum(data, perspective_weights);
            *render_target.item_at(x, y) = RT::from(pixel_shader(interpolated, z));
            pixels_shaded += 1;
        }
    }
    return pixels_shaded;
}
