//! CPU rasterization pipeline: buffers, clipping and the rasterizer with its shader slots.

pub mod buffer;
pub mod clip;
pub mod rasterizer;

pub use buffer::Buffer;
pub use rasterizer::{DrawStats, PixelShader, RasterError, Rasterizer, ShaderVertex, VertexShader, FAR_DEPTH};
