#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tuning constants for corner detection and rectification.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RectifyConfig {
    /// Edge threshold as a fraction of the strongest gradient in the image.
    pub edge_threshold: f32,
    /// Fewer strong-edge pixels than this falls back to the default rectangle.
    pub min_edge_points: usize,
    /// Inset of the fallback rectangle, as a fraction of each image dimension.
    pub default_margin: f64,
    /// Edge points are subsampled to at most this many before hull construction.
    pub max_hull_points: usize,
    /// Colour written to output pixels that map outside the source image.
    pub fill: [u8; 4],
    /// Results sampling less than this fraction of output pixels are reported as suspect.
    pub min_coverage: f64,
    /// When non-zero, corners are detected on a copy downscaled so that its
    /// longest side is at most this many pixels.
    pub detect_max_dim: u32,
}

impl Default for RectifyConfig {
    fn default() -> Self {
        Self {
            edge_threshold: 0.3,
            min_edge_points: 10,
            default_margin: 0.05,
            max_hull_points: 1000,
            fill: [0, 0, 0, 0],
            min_coverage: 0.5,
            detect_max_dim: 0,
        }
    }
}

impl RectifyConfig {
    /// Check every field is within its meaningful range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.edge_threshold) {
            return Err(ConfigError::Invalid {
                field: "edge_threshold",
                reason: format!("{} is outside [0, 1]", self.edge_threshold),
            });
        }
        if !(0.0..0.5).contains(&self.default_margin) {
            return Err(ConfigError::Invalid {
                field: "default_margin",
                reason: format!("{} is outside [0, 0.5)", self.default_margin),
            });
        }
        if self.max_hull_points < 3 {
            return Err(ConfigError::Invalid {
                field: "max_hull_points",
                reason: format!("{} is below 3", self.max_hull_points),
            });
        }
        if !(0.0..=1.0).contains(&self.min_coverage) {
            return Err(ConfigError::Invalid {
                field: "min_coverage",
                reason: format!("{} is outside [0, 1]", self.min_coverage),
            });
        }
        Ok(())
    }

    /// Parse and validate a TOML config. Missing keys take their defaults.
    #[cfg(feature = "serde")]
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: RectifyConfig =
            toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
