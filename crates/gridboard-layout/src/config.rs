#![forbid(unsafe_code)]

//! Engine configuration as data.
//!
//! Grid size, cell metrics, drag tuning and feedback durations are supplied
//! at construction instead of being baked into the engine. Every section is
//! `#[serde(default)]`, so a file only needs to name what it overrides.
//!
//! # Loading
//!
//! ```toml
//! # gridboard.toml
//! [grid]
//! columns = 4
//!
//! [drag]
//! threshold_px = 6.0
//! ```
//!
//! ```rust,ignore
//! let config = EngineConfig::from_toml_file("gridboard.toml")?.validated()?;
//! ```

#[cfg(feature = "config-file")]
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::drag::DragTuning;
use crate::geometry::{CellMetrics, GridSize, ScreenFit};

/// Suggested highlight lifetime of recently freed cells.
pub const FREED_CELLS_DEFAULT_MS: u64 = 2000;

/// Suggested duration of the bounce-back animation after a rejected drop.
pub const BOUNCE_DEFAULT_MS: u64 = 1000;

// ---------------------------------------------------------------------------
// Top-level EngineConfig
// ---------------------------------------------------------------------------

/// Complete engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub grid: GridSize,
    pub cell: CellMetrics,
    pub drag: DragTuning,
    pub feedback: FeedbackTiming,
    /// Used only by [`EngineConfig::fit_to_screen`].
    pub screen: ScreenFit,
}

/// Display durations the engine suggests with its feedback events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackTiming {
    pub freed_cells_ms: u64,
    pub bounce_ms: u64,
}

impl Default for FeedbackTiming {
    fn default() -> Self {
        Self {
            freed_cells_ms: FREED_CELLS_DEFAULT_MS,
            bounce_ms: BOUNCE_DEFAULT_MS,
        }
    }
}

impl EngineConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config-file")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config-file")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Serialize to a TOML document.
    #[cfg(feature = "config-file")]
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::TomlSerialize)
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.grid.columns == 0 {
            errors.push("grid.columns must be > 0".into());
        }
        if self.grid.rows == 0 {
            errors.push("grid.rows must be > 0".into());
        }

        for (name, value) in [
            ("cell.cell_width", self.cell.cell_width),
            ("cell.cell_height", self.cell.cell_height),
        ] {
            if !(value.is_finite() && value > 0.0) {
                errors.push(format!("{name} must be > 0, got {value}"));
            }
        }
        if !(self.cell.gap.is_finite() && self.cell.gap >= 0.0) {
            errors.push(format!("cell.gap must be >= 0, got {}", self.cell.gap));
        }

        for (name, value) in [
            ("drag.threshold_px", self.drag.threshold_px),
            ("drag.update_hysteresis_px", self.drag.update_hysteresis_px),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                errors.push(format!("{name} must be >= 0, got {value}"));
            }
        }

        let screen = &self.screen;
        if screen.min_cell_width > screen.max_cell_width {
            errors.push(format!(
                "screen.min_cell_width ({}) exceeds screen.max_cell_width ({})",
                screen.min_cell_width, screen.max_cell_width
            ));
        }
        if screen.min_cell_height > screen.max_cell_height {
            errors.push(format!(
                "screen.min_cell_height ({}) exceeds screen.max_cell_height ({})",
                screen.min_cell_height, screen.max_cell_height
            ));
        }

        errors
    }

    /// `self` if [`validate`](Self::validate) reports nothing.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Replace the cell metrics with ones fitted to a screen size.
    #[must_use]
    pub fn fit_to_screen(mut self, screen_width: f64, screen_height: f64) -> Self {
        self.cell = self
            .screen
            .fit(screen_width, screen_height, self.grid, self.cell.gap)
            .metrics;
        self
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur when loading an engine configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config-file")]
    Toml(toml::de::Error),
    /// TOML serialization error.
    #[cfg(feature = "config-file")]
    TomlSerialize(toml::ser::Error),
    /// JSON parse error.
    #[cfg(feature = "config-file")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config-file")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config-file")]
            Self::TomlSerialize(e) => write!(f, "TOML serialization error: {e}"),
            #[cfg(feature = "config-file")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config-file")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config-file")]
            Self::TomlSerialize(e) => Some(e),
            #[cfg(feature = "config-file")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
