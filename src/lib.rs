//! Software rasterization renderer: turns a model and a camera into an image on the CPU.

pub mod app;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod renderer;
pub mod settings;
pub mod util;
pub mod world;

pub use error::{Error, Result};
pub use renderer::{RasterizationRenderer, Renderer};
pub use settings::Settings;
