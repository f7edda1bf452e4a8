use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::view::PointerButton;

pub const CONFIG_ENV_VAR: &str = "TILEVIEW_CONFIG";

/// Tunables for the world view. Every field is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewConfig {
    pub tile_length_px: f32,
    pub key_pan_step_px: f32,
    /// Extra tiles the camera may pan past each grid edge.
    pub pan_margin_tiles: u32,
    pub tooltip_offset_px: f32,
    pub tooltip_line_height_px: f32,
    pub pan_button: PointerButton,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            tile_length_px: 32.0,
            key_pan_step_px: 8.0,
            pan_margin_tiles: 3,
            tooltip_offset_px: 10.0,
            tooltip_line_height_px: 14.0,
            pan_button: PointerButton::Middle,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to read view config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse view config {path} at {field}: {message}")]
    Parse {
        path: PathBuf,
        field: String,
        message: String,
    },
    #[error("invalid view config {path}: {field} must be {expected}")]
    Invalid {
        path: PathBuf,
        field: &'static str,
        expected: &'static str,
    },
}

/// Loads the file named by `TILEVIEW_CONFIG`, or defaults when it is unset.
pub fn load_view_config() -> Result<ViewConfig, ConfigError> {
    match env::var(CONFIG_ENV_VAR) {
        Ok(value) => {
            let config = load_view_config_file(Path::new(&value))?;
            info!(path = value.as_str(), "view_config_loaded");
            Ok(config)
        }
        Err(env::VarError::NotPresent) => Ok(ViewConfig::default()),
        Err(source) => Err(ConfigError::EnvVar {
            var: CONFIG_ENV_VAR,
            source,
        }),
    }
}

pub fn load_view_config_file(path: &Path) -> Result<ViewConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_view_config(path, &raw)?;
    validate_view_config(path, &config)?;
    Ok(config)
}

fn parse_view_config(path: &Path, raw: &str) -> Result<ViewConfig, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, ViewConfig>(&mut deserializer).map_err(|error| {
        let field = error.path().to_string();
        let field = if field.is_empty() { ".".to_string() } else { field };
        ConfigError::Parse {
            path: path.to_path_buf(),
            field,
            message: error.into_inner().to_string(),
        }
    })
}

fn validate_view_config(path: &Path, config: &ViewConfig) -> Result<(), ConfigError> {
    let positive = [
        ("tile_length_px", config.tile_length_px),
        ("tooltip_line_height_px", config.tooltip_line_height_px),
    ];
    for (field, value) in positive {
        if !value.is_finite() || value <= 0.0 {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                field,
                expected: "a positive number",
            });
        }
    }
    let non_negative = [
        ("key_pan_step_px", config.key_pan_step_px),
        ("tooltip_offset_px", config.tooltip_offset_px),
    ];
    for (field, value) in non_negative {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                field,
                expected: "zero or a positive number",
            });
        }
    }
    Ok(())
}
