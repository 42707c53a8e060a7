use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scale::{DAY_MS, HOUR_MS, Scale, ScaleError, ScaleLimits, YEAR_MS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
    #[error(transparent)]
    Scale(#[from] ScaleError),
}

/// Tunables for layout and interaction. Every field has a default, so a
/// config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Coarsest zoom, pixels per millisecond.
    pub min_scale: f64,
    /// Finest zoom, pixels per millisecond.
    pub max_scale: f64,
    /// Zoom level a new timeline session opens at.
    pub initial_scale: f64,
    /// Multiplicative factor for zoom-in/zoom-out actions.
    pub zoom_step: f64,
    /// Wheel delta to zoom exponent: factor = 2^(-delta * sensitivity).
    pub wheel_sensitivity: f64,
    /// Empty time kept before the earliest and after the latest event.
    pub origin_padding_ms: f64,
    /// Screens of off-screen content laid out on each side of the viewport.
    pub buffer_screens: f64,
    pub lane_height: f64,
    pub lane_gap: f64,
    pub min_block_width: f64,
    /// Upper bound on primary ticks per layout pass.
    pub max_ticks: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_scale: 10.0 / YEAR_MS,
            max_scale: 100.0 / HOUR_MS,
            initial_scale: 2.0 / DAY_MS,
            zoom_step: 1.2,
            wheel_sensitivity: 0.01,
            origin_padding_ms: YEAR_MS,
            buffer_screens: 1.0,
            lane_height: 150.0,
            lane_gap: 20.0,
            min_block_width: 0.0,
            max_ticks: 5_000,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json(data: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scale_limits()?;
        self.initial_scale()?;
        if !(self.zoom_step.is_finite() && self.zoom_step > 1.0) {
            return Err(ConfigError::Invalid {
                field: "zoom_step",
                reason: "must be greater than 1",
            });
        }
        if !(self.wheel_sensitivity.is_finite() && self.wheel_sensitivity > 0.0) {
            return Err(ConfigError::Invalid {
                field: "wheel_sensitivity",
                reason: "must be positive",
            });
        }
        for (field, value) in [
            ("origin_padding_ms", self.origin_padding_ms),
            ("buffer_screens", self.buffer_screens),
            ("lane_gap", self.lane_gap),
            ("min_block_width", self.min_block_width),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be finite and non-negative",
                });
            }
        }
        if !(self.lane_height.is_finite() && self.lane_height > 0.0) {
            return Err(ConfigError::Invalid {
                field: "lane_height",
                reason: "must be positive",
            });
        }
        if self.max_ticks == 0 {
            return Err(ConfigError::Invalid {
                field: "max_ticks",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }

    pub fn scale_limits(&self) -> Result<ScaleLimits, ConfigError> {
        let limits = ScaleLimits::new(Scale::new(self.min_scale)?, Scale::new(self.max_scale)?)?;
        Ok(limits)
    }

    /// The configured starting zoom, clamped into the scale limits.
    pub fn initial_scale(&self) -> Result<Scale, ConfigError> {
        let limits = self.scale_limits()?;
        Ok(limits.clamp(Scale::new(self.initial_scale)?))
    }

    /// Vertical distance between the tops of adjacent lanes.
    pub fn lane_pitch(&self) -> f64 {
        self.lane_height + self.lane_gap
    }
}
