//! Sinusoidal time-of-day brightness curve.
//!
//! The curve maps wall-clock time to a brightness percentage using a smooth
//! periodic model: the value oscillates around a base level with a configured
//! amplitude over a configured cycle length, so there are no discontinuities
//! at day boundaries. This is the fallback brightness source when
//! sunrise/sunset data is disabled or unavailable.

use chrono::{NaiveTime, Timelike};
use std::f64::consts::TAU;

use crate::constants::{MAXIMUM_BRIGHTNESS, MINIMUM_BRIGHTNESS};

/// Parameters describing the brightness curve.
///
/// A well-formed configuration keeps `base_level - amplitude >= 0` and
/// `base_level + amplitude <= 100`, but this is not enforced here; evaluation
/// clamps the result to the valid brightness range regardless.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveParameters {
    /// Brightness swing around the base level (percentage points).
    pub amplitude: f64,
    /// Midpoint brightness percentage the curve oscillates around.
    pub base_level: f64,
    /// Curve period in hours (typically 24).
    pub cycle_hours: f64,
    /// Phase shift in hours; moves the curve peak earlier or later.
    pub phase_offset_hours: f64,
}

/// Evaluate the curve at a fractional hour value.
///
/// Accepts any finite or non-finite hour input, including negative and
/// overflowing values; the sine argument wraps naturally, so the result is
/// periodic in `cycle_hours`. A non-finite result falls back to the base
/// level before clamping.
///
/// # Returns
/// Brightness percentage clamped to [0, 100]
pub fn evaluate_at_hours(hours: f64, params: &CurveParameters) -> f64 {
    let phase = TAU * (hours + params.phase_offset_hours) / params.cycle_hours;
    let mut value = params.base_level + params.amplitude * phase.sin();

    if !value.is_finite() {
        value = params.base_level;
    }

    if value.is_finite() {
        value.clamp(MINIMUM_BRIGHTNESS, MAXIMUM_BRIGHTNESS)
    } else {
        // base_level itself was non-finite; settle on the lower bound
        MINIMUM_BRIGHTNESS
    }
}

/// Evaluate the curve at a wall-clock time.
///
/// Converts the time to fractional hours since midnight (seconds included)
/// and delegates to [`evaluate_at_hours`].
pub fn evaluate(now: NaiveTime, params: &CurveParameters) -> f64 {
    let hours = now.num_seconds_from_midnight() as f64 / 3600.0;
    evaluate_at_hours(hours, params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard_params() -> CurveParameters {
        CurveParameters {
            amplitude: 45.0,
            base_level: 50.0,
            cycle_hours: 24.0,
            phase_offset_hours: -6.0,
        }
    }

    #[test]
    fn test_peak_and_trough_values() {
        let params = standard_params();

        // Peak: sin argument reaches pi/2 at 12:00 with a -6h offset
        let peak = evaluate(NaiveTime::from_hms_opt(12, 0, 0).unwrap(), &params);
        assert!((peak - 95.0).abs() < 1e-9, "peak was {}", peak);

        // Antipodal point at midnight
        let trough = evaluate(NaiveTime::from_hms_opt(0, 0, 0).unwrap(), &params);
        assert!((trough - 5.0).abs() < 1e-9, "trough was {}", trough);
    }

    #[test]
    fn test_base_level_at_zero_crossings() {
        let params = standard_params();

        // sin argument is 0 at 06:00 and pi at 18:00
        let morning = evaluate(NaiveTime::from_hms_opt(6, 0, 0).unwrap(), &params);
        assert!((morning - 50.0).abs() < 1e-9);

        let evening = evaluate(NaiveTime::from_hms_opt(18, 0, 0).unwrap(), &params);
        assert!((evening - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_periodicity() {
        let params = standard_params();
        for i in 0..48 {
            let t = i as f64 * 0.5;
            let a = evaluate_at_hours(t, &params);
            let b = evaluate_at_hours(t + params.cycle_hours, &params);
            assert!((a - b).abs() < 1e-6, "period mismatch at t={}", t);
        }
    }

    #[test]
    fn test_negative_and_overflowing_hours() {
        let params = standard_params();
        let a = evaluate_at_hours(-3.5, &params);
        let b = evaluate_at_hours(-3.5 + 24.0, &params);
        assert!((a - b).abs() < 1e-6);

        let c = evaluate_at_hours(100.25, &params);
        assert!((0.0..=100.0).contains(&c));
    }

    #[test]
    fn test_misconfigured_amplitude_is_clamped() {
        let params = CurveParameters {
            amplitude: 90.0,
            base_level: 50.0,
            cycle_hours: 24.0,
            phase_offset_hours: -6.0,
        };

        let peak = evaluate(NaiveTime::from_hms_opt(12, 0, 0).unwrap(), &params);
        assert_eq!(peak, 100.0);

        let trough = evaluate(NaiveTime::from_hms_opt(0, 0, 0).unwrap(), &params);
        assert_eq!(trough, 0.0);
    }

    #[test]
    fn test_non_finite_result_falls_back_to_base_level() {
        let params = CurveParameters {
            amplitude: f64::INFINITY,
            base_level: 60.0,
            cycle_hours: 24.0,
            phase_offset_hours: 0.0,
        };

        // inf * sin(x) is non-finite (or NaN at the zero crossings)
        let value = evaluate(NaiveTime::from_hms_opt(3, 0, 0).unwrap(), &params);
        assert_eq!(value, 60.0);
    }

    #[test]
    fn test_nan_base_level_clamps_to_lower_bound() {
        let params = CurveParameters {
            amplitude: 10.0,
            base_level: f64::NAN,
            cycle_hours: 24.0,
            phase_offset_hours: 0.0,
        };

        let value = evaluate(NaiveTime::from_hms_opt(3, 0, 0).unwrap(), &params);
        assert_eq!(value, 0.0);
    }

    #[test]
    fn test_fractional_seconds_resolution() {
        let params = standard_params();
        let a = evaluate(NaiveTime::from_hms_opt(12, 0, 0).unwrap(), &params);
        let b = evaluate(NaiveTime::from_hms_opt(12, 0, 30).unwrap(), &params);
        // 30 seconds should move the value only marginally near the peak
        assert!((a - b).abs() < 0.01);
    }
}
