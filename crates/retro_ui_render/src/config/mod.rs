//! Configuration system

pub use serde::{Deserialize, Serialize};

use crate::render::color::{PackedColorOrder, TexelFormat};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
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

/// Configuration for the UI render backend
///
/// Everything here describes conventions that differ between UI library builds
/// and device drivers. Nothing is tuned per frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Name published to the UI context as the renderer backend
    pub renderer_name: String,
    /// Byte order of the UI library's packed vertex colors
    pub ui_color_order: PackedColorOrder,
    /// Channel layout used when creating the font atlas texture
    pub atlas_format: TexelFormat,
    /// Try video memory before system memory for the font atlas
    pub prefer_video_memory: bool,
    /// Depth written into every submitted vertex
    pub vertex_depth: f32,
}

impl BackendConfig {
    /// Create a configuration with the given renderer name
    pub fn new(renderer_name: impl Into<String>) -> Self {
        Self {
            renderer_name: renderer_name.into(),
            ..Self::default()
        }
    }

    /// Set the UI library's packed color order
    #[must_use]
    pub fn with_ui_color_order(mut self, order: PackedColorOrder) -> Self {
        self.ui_color_order = order;
        self
    }

    /// Set the font atlas texel format
    #[must_use]
    pub fn with_atlas_format(mut self, format: TexelFormat) -> Self {
        self.atlas_format = format;
        self
    }

    /// Enable or disable the video memory attempt for the font atlas
    #[must_use]
    pub fn with_video_memory(mut self, prefer: bool) -> Self {
        self.prefer_video_memory = prefer;
        self
    }

    /// Set the depth written into submitted vertices
    #[must_use]
    pub fn with_vertex_depth(mut self, depth: f32) -> Self {
        self.vertex_depth = depth;
        self
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            renderer_name: "retro_ui_render".to_string(),
            ui_color_order: PackedColorOrder::Abgr,
            atlas_format: TexelFormat::Argb8888,
            prefer_video_memory: true,
            vertex_depth: 0.0,
        }
    }
}

impl Config for BackendConfig {}
