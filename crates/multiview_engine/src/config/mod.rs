//! Configuration system
//!
//! Settings that a host may want to keep in a file: renderer output settings,
//! the scheduler's render mode and the auto-render switch.

use std::path::Path;

pub use serde::{Deserialize, Serialize};

use crate::render::settings::RendererSettings;
use crate::scheduler::RenderMode;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match extension(path) {
            Some("toml") => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Some("ron") => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match extension(path) {
            Some("toml") => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            Some("ron") => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// File-backed settings for one multi-view canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiViewConfig {
    /// When the scheduler's render stage runs
    pub render_mode: RenderMode,
    /// Whether the auto-render task starts enabled
    pub auto_render: bool,
    /// Pixel density reported by the platform
    pub device_pixel_ratio: f32,
    /// Renderer output settings
    pub renderer: RendererSettings,
}

impl Default for MultiViewConfig {
    fn default() -> Self {
        Self {
            render_mode: RenderMode::OnDemand,
            auto_render: true,
            device_pixel_ratio: 1.0,
            renderer: RendererSettings::default(),
        }
    }
}

impl Config for MultiViewConfig {}
