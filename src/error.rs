use thiserror::Error;

use crate::output::OutputError;
use crate::pipeline::RasterError;
use crate::settings::SettingsError;
use crate::world::ModelError;

/// Anything that stops a frame from being produced.
#[derive(Error, Debug)]
pub enum Error {
    #[error("settings: {0}")]
    Settings(#[from] SettingsError),
    #[error("model: {0}")]
    Model(#[from] ModelError),
    #[error("rasterizer: {0}")]
    Raster(#[from] RasterError),
    #[error("output: {0}")]
    Output(#[from] OutputError),
    #[error("renderer is used before init()")]
    NotInitialized,
}

pub type Result<T> = std::result::Result<T, Error>;
