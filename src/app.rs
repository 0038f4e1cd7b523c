use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::renderer::{RasterizationRenderer, Renderer};
use crate::settings::Settings;

/// Struct, defining execution context: optional settings file and overrides on top of it.
#[derive(Debug, Default, Clone)]
pub struct Params {
    pub config_path: Option<PathBuf>,
    pub model_path: Option<PathBuf>,
    pub result_path: Option<PathBuf>,
    pub width: Option<usize>,
    pub height: Option<usize>,
    pub transparency: Option<f32>,
}

/// Settings file picked up from the working directory, when no other one is given.
pub const DEFAULT_CONFIG_PATH: &str = "settings.toml";

/// Explicitly given settings file, otherwise default_path if such file exists.
pub fn config_path_or_default(config_path: Option<PathBuf>, default_path: &Path) -> Option<PathBuf> {
    if config_path.is_some() {
        return config_path;
    }
    if default_path.is_file() {
        log::info!("Using settings from {}", default_path.display());
        return Some(default_path.to_path_buf());
    }
    return None;
}

/// Settings from the file (or defaults) with overrides applied. Result is validated.
pub fn build_settings(params: &Params) -> Result<Settings> {
    let mut settings = match &params.config_path {
        Some(path) => Settings::load_from_file(path)?,
        None => Settings::default(),
    };
    if let Some(model_path) = &params.model_path {
        settings.model_path = model_path.clone();
    }
    if let Some(result_path) = &params.result_path {
        settings.result_path = result_path.clone();
    }
    if let Some(width) = params.width {
        settings.width = width;
    }
    if let Some(height) = params.height {
        settings.height = height;
    }
    if let Some(transparency) = params.transparency {
        settings.transparency = transparency;
    }
    settings.validate()?;
    return Ok(settings);
}

/// Renders a single frame as described by params.
pub fn run(params: Params) -> Result<()> {
    let settings = build_settings(&params)?;
    log::info!(
        "Rendering {} at {}x{} into {}",
        settings.model_path.display(),
        settings.width,
        settings.height,
        settings.result_path.display()
    );

    let mut renderer = RasterizationRenderer::new(settings);
    renderer.init()?;
    renderer.update();
    renderer.render()?;
    renderer.destroy();
    return Ok(());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::settings::SettingsError;

    #[test]
    fn overrides_are_applied_on_top_of_file() {
        let directory = tempfile::tempdir().unwrap();
        let config_path = directory.path().join("settings.toml");
        std::fs::write(&config_path, "width = 10\nheight = 20\ntransparency = 0.25\n").unwrap();

        let settings = build_settings(&Params {
            config_path: Some(config_path),
            height: Some(30),
            model_path: Some(PathBuf::from("teapot.obj")),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(settings.width, 10);
        assert_eq!(settings.height, 30);
        assert_eq!(settings.transparency, 0.25);
        assert_eq!(settings.model_path, PathBuf::from("teapot.obj"));
    }

    #[test]
    fn default_config_is_used_only_when_present() {
        let directory = tempfile::tempdir().unwrap();
        let default_path = directory.path().join(DEFAULT_CONFIG_PATH);
        assert_eq!(config_path_or_default(None, &default_path), None);

        std::fs::write(&default_path, "width = 10\n").unwrap();
        assert_eq!(config_path_or_default(None, &default_path), Some(default_path.clone()));

        let explicit = directory.path().join("other.toml");
        assert_eq!(config_path_or_default(Some(explicit.clone()), &default_path), Some(explicit));
    }

    #[test]
    fn invalid_override_is_rejected() {
        let result = build_settings(&Params {
            transparency: Some(-1.0),
            ..Default::default()
        });
        assert!(matches!(result, Err(Error::Settings(SettingsError::Invalid { .. }))));
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let directory = tempfile::tempdir().unwrap();
        let result = build_settings(&Params {
            config_path: Some(directory.path().join("missing.toml")),
            ..Default::default()
        });
        assert!(matches!(result, Err(Error::Settings(SettingsError::Io(_)))));
    }

    #[test]
    fn run_writes_the_result() {
        let directory = tempfile::tempdir().unwrap();
        let model_path = directory.path().join("quad.obj");
        let result_path = directory.path().join("quad.png");
        std::fs::write(&model_path, "v -1 -1 -2\nv 1 -1 -2\nv 1 1 -2\nv -1 1 -2\nf 1 2 3 4\n").unwrap();

        run(Params {
            model_path: Some(model_path),
            result_path: Some(result_path.clone()),
            width: Some(8),
            height: Some(8),
            ..Default::default()
        })
        .unwrap();
        assert!(result_path.exists());
    }
}
