//! Continuous mapping between calendar time and canvas pixels.
//!
//! Instants are milliseconds since the Unix epoch, pixels are measured from
//! the view origin. Everything here is stateless.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const HOUR_MS: f64 = 3_600_000.0;
pub const DAY_MS: f64 = 24.0 * HOUR_MS;
/// Nominal month used for density thresholds only.
pub const MONTH_MS: f64 = 30.0 * DAY_MS;
/// Nominal year used for density thresholds only.
pub const YEAR_MS: f64 = 365.0 * DAY_MS;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ScaleError {
    #[error("scale must be finite and strictly positive, got {0}")]
    NotPositive(f64),
    #[error("minimum scale {min} exceeds maximum scale {max}")]
    InvertedLimits { min: f64, max: f64 },
}

/// Zoom level in pixels per millisecond. Always finite and `> 0`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Scale(f64);

impl Scale {
    pub fn new(px_per_ms: f64) -> Result<Self, ScaleError> {
        if px_per_ms.is_finite() && px_per_ms > 0.0 {
            Ok(Self(px_per_ms))
        } else {
            Err(ScaleError::NotPositive(px_per_ms))
        }
    }

    pub fn per_hour(px: f64) -> Result<Self, ScaleError> {
        Self::new(px / HOUR_MS)
    }

    pub fn per_day(px: f64) -> Result<Self, ScaleError> {
        Self::new(px / DAY_MS)
    }

    pub fn per_year(px: f64) -> Result<Self, ScaleError> {
        Self::new(px / YEAR_MS)
    }

    pub fn px_per_ms(self) -> f64 {
        self.0
    }

    /// Pixels covered by a span of `unit_ms` milliseconds at this scale.
    pub fn px_per(self, unit_ms: f64) -> f64 {
        self.0 * unit_ms
    }
}

impl TryFrom<f64> for Scale {
    type Error = ScaleError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Scale> for f64 {
    fn from(scale: Scale) -> Self {
        scale.0
    }
}

/// Inclusive zoom bounds. Requests outside clamp to the nearest bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleLimits {
    min: Scale,
    max: Scale,
}

impl ScaleLimits {
    pub fn new(min: Scale, max: Scale) -> Result<Self, ScaleError> {
        if min > max {
            return Err(ScaleError::InvertedLimits {
                min: min.0,
                max: max.0,
            });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> Scale {
        self.min
    }

    pub fn max(&self) -> Scale {
        self.max
    }

    pub fn clamp(&self, scale: Scale) -> Scale {
        Scale(scale.0.max(self.min.0).min(self.max.0))
    }

    /// `scale * factor`, clamped. A non-finite or non-positive factor leaves
    /// the scale unchanged.
    pub fn rescale(&self, scale: Scale, factor: f64) -> Scale {
        match Scale::new(scale.0 * factor) {
            Ok(next) => self.clamp(next),
            Err(_) if factor.is_finite() && factor > 0.0 => {
                // Underflow to zero or overflow to infinity.
                if factor < 1.0 { self.min } else { self.max }
            }
            Err(_) => scale,
        }
    }
}

impl Default for ScaleLimits {
    /// Roughly 10 px per year at the coarse end, 100 px per hour at the fine end.
    fn default() -> Self {
        Self {
            min: Scale(10.0 / YEAR_MS),
            max: Scale(100.0 / HOUR_MS),
        }
    }
}

/// Pixel offset of `instant` from `origin`.
pub fn to_pixel(origin: f64, instant: f64, scale: Scale) -> f64 {
    (instant - origin) * scale.0
}

/// Instant at `pixel`; the inverse of [`to_pixel`].
pub fn to_instant(origin: f64, pixel: f64, scale: Scale) -> f64 {
    origin + pixel / scale.0
}

/// Pixel width of `[start, end]`. Degenerate or inverted spans are 0 wide.
pub fn width_of(start: f64, end: f64, scale: Scale) -> f64 {
    ((end - start) * scale.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: f64 = 1_577_836_800_000.0; // 2020-01-01T00:00:00Z

    #[test]
    fn rejects_non_positive_scale() {
        assert!(Scale::new(0.0).is_err());
        assert!(Scale::new(-1.0).is_err());
        assert!(Scale::new(f64::NAN).is_err());
        assert!(Scale::new(f64::INFINITY).is_err());
        assert!(Scale::new(1e-12).is_ok());
    }

    #[test]
    fn pixel_round_trip_is_sub_millisecond() {
        let scale = Scale::per_day(2.0).unwrap();
        let t = ORIGIN + 123_456_789_012.0;
        let back = to_instant(ORIGIN, to_pixel(ORIGIN, t, scale), scale);
        assert!((back - t).abs() < 1.0, "drift {}", back - t);
    }

    #[test]
    fn one_day_is_scale_pixels_wide() {
        let scale = Scale::per_day(4.0).unwrap();
        assert!((to_pixel(ORIGIN, ORIGIN + DAY_MS, scale) - 4.0).abs() < 1e-9);
        assert!((width_of(ORIGIN, ORIGIN + 3.0 * DAY_MS, scale) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn inverted_span_has_zero_width() {
        let scale = Scale::per_day(4.0).unwrap();
        assert_eq!(width_of(ORIGIN + DAY_MS, ORIGIN, scale), 0.0);
        assert_eq!(width_of(ORIGIN, f64::NAN, scale), 0.0);
    }

    #[test]
    fn limits_clamp_and_rescale() {
        let limits = ScaleLimits::default();
        let coarse = Scale::per_year(1.0).unwrap();
        assert_eq!(limits.clamp(coarse), limits.min());
        let fine = Scale::per_hour(1_000.0).unwrap();
        assert_eq!(limits.clamp(fine), limits.max());
        assert_eq!(limits.rescale(limits.max(), 2.0), limits.max());
        assert_eq!(limits.rescale(limits.min(), 0.0), limits.min());
        let mid = Scale::per_day(2.0).unwrap();
        assert_eq!(limits.rescale(mid, f64::NAN), mid);
    }

    #[test]
    fn inverted_limits_are_rejected() {
        let a = Scale::per_day(1.0).unwrap();
        let b = Scale::per_day(2.0).unwrap();
        assert!(ScaleLimits::new(b, a).is_err());
        assert!(ScaleLimits::new(a, b).is_ok());
    }

    #[test]
    fn scale_deserializes_through_validation() {
        let ok: Scale = serde_json::from_str("0.5").unwrap();
        assert_eq!(ok.px_per_ms(), 0.5);
        assert!(serde_json::from_str::<Scale>("0").is_err());
    }
}
