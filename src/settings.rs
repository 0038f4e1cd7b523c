use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("can't access settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("can't parse settings: {0}")]
    Parse(String),
    #[error("can't serialize settings: {0}")]
    Serialize(String),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Everything renderer needs to know to produce a frame. Missing fields take default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub width: usize,
    pub height: usize,
    pub model_path: PathBuf,
    pub camera_position: [f32; 3],
    pub camera_theta: f32,         // Degrees.
    pub camera_phi: f32,           // Degrees.
    pub camera_angle_of_view: f32, // Vertical, degrees.
    pub camera_z_near: f32,
    pub camera_z_far: f32,
    pub transparency: f32, // Weight of the rendered scene against the background.
    pub result_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        return Self {
            width: 1920,
            height: 1080,
            model_path: PathBuf::from("models/cube.obj"),
            camera_position: [0.0, 0.0, 1.0],
            camera_theta: 0.0,
            camera_phi: 0.0,
            camera_angle_of_view: 60.0,
            camera_z_near: 0.001,
            camera_z_far: 100.0,
            transparency: 1.0,
            result_path: PathBuf::from("result.png"),
        };
    }
}

impl Settings {
    /// Reads settings from a TOML file. Values aren't validated here.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path)?;
        return toml::from_str(&contents).map_err(|e| SettingsError::Parse(e.to_string()));
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let contents = toml::to_string_pretty(self).map_err(|e| SettingsError::Serialize(e.to_string()))?;
        std::fs::write(path, contents)?;
        return Ok(());
    }

    /// Checks values, which would make a frame impossible or meaningless.
    pub fn validate(&self) -> Result<(), SettingsError> {
        fn invalid(field: &'static str, reason: String) -> Result<(), SettingsError> {
            return Err(SettingsError::Invalid { field, reason });
        }

        if self.width == 0 || self.height == 0 {
            return invalid("size", format!("{}x{} has no pixels", self.width, self.height));
        }
        let floats = [
            ("camera_position", self.camera_position[0]),
            ("camera_position", self.camera_position[1]),
            ("camera_position", self.camera_position[2]),
            ("camera_theta", self.camera_theta),
            ("camera_phi", self.camera_phi),
            ("camera_angle_of_view", self.camera_angle_of_view),
            ("camera_z_near", self.camera_z_near),
            ("camera_z_far", self.camera_z_far),
            ("transparency", self.transparency),
        ];
        for (field, value) in floats {
            if !value.is_finite() {
                return invalid(field, format!("{} is not a finite number", value));
            }
        }
        if !(0.0..=1.0).contains(&self.transparency) {
            return invalid("transparency", format!("{} is outside of [0, 1]", self.transparency));
        }
        if self.camera_z_near <= 0.0 {
            return invalid("camera_z_near", format!("{} has to be positive", self.camera_z_near));
        }
        if self.camera_z_far <= self.camera_z_near {
            return invalid(
                "camera_z_far",
                format!("{} has to be greater than z_near {}", self.camera_z_far, self.camera_z_near),
            );
        }
        if self.camera_angle_of_view <= 0.0 || self.camera_angle_of_view >= 180.0 {
            return invalid(
                "camera_angle_of_view",
                format!("{} is outside of (0, 180)", self.camera_angle_of_view),
            );
        }
        return Ok(());
    }
}
