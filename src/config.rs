use crate::path_tree::history::ShadePalette;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest accepted `history_limit`
pub const MAX_HISTORY_LIMIT: usize = 1000;

/// RGB color triple
pub type Rgb = (u8, u8, u8);

/// How documents are arranged in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Nest documents under directories built from shared path prefixes
    #[default]
    Grouped,
    /// Every document is a top-level row
    Flat,
}

/// Tree model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    #[serde(default)]
    pub mode: DisplayMode,

    /// Tint recently viewed and edited documents
    #[serde(default = "default_true")]
    pub shading_enabled: bool,

    /// Show full paths (with `~` for the home directory) on top-level groups
    #[serde(default = "default_false")]
    pub show_full_path_on_roots: bool,

    /// Number of documents remembered by each of the view and edit histories
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Background the shades are blended into
    #[serde(default = "default_base_color")]
    pub base_color: Rgb,

    /// Shade for recently viewed documents
    #[serde(default = "default_view_shade")]
    pub view_shade: Rgb,

    /// Shade for recently edited documents
    #[serde(default = "default_edit_shade")]
    pub edit_shade: Rgb,
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

fn default_history_limit() -> usize {
    10
}

fn default_base_color() -> Rgb {
    (255, 255, 255)
}

fn default_view_shade() -> Rgb {
    (176, 160, 215)
}

fn default_edit_shade() -> Rgb {
    (245, 190, 140)
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            mode: DisplayMode::default(),
            shading_enabled: true,
            show_full_path_on_roots: false,
            history_limit: default_history_limit(),
            base_color: default_base_color(),
            view_shade: default_view_shade(),
            edit_shade: default_edit_shade(),
        }
    }
}

impl TreeConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let config: TreeConfig =
            serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path.as_ref(), contents).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_limit == 0 {
            return Err(ConfigError::ValidationError(
                "history_limit must be at least 1".to_string(),
            ));
        }
        if self.history_limit > MAX_HISTORY_LIMIT {
            return Err(ConfigError::ValidationError(format!(
                "history_limit must be at most {MAX_HISTORY_LIMIT}"
            )));
        }
        Ok(())
    }

    pub fn palette(&self) -> ShadePalette {
        ShadePalette {
            base: self.base_color,
            view: self.view_shade,
            edit: self.edit_shade,
        }
    }
}

/// Configuration error types
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(msg) => write!(f, "IO error: {msg}"),
            ConfigError::ParseError(msg) => write!(f, "Parse error: {msg}"),
            ConfigError::SerializeError(msg) => write!(f, "Serialize error: {msg}"),
            ConfigError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
