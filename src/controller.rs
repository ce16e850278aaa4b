//! Brightness target computation and application.
//!
//! [`BrightnessController`] owns the authoritative "desired brightness"
//! decision: the solar modifier wins outright when it is enabled and has an
//! event for the day, otherwise the sinusoidal curve value is used. This is a
//! precedence policy, not a blend. Application through the backend is
//! best-effort; failures are surfaced to the caller for logging and the tick
//! simply retries next cycle. Changes step through intermediate values over a
//! few seconds rather than jumping, so a large target change is not jarring.

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::backend::BrightnessBackend;
use crate::constants::{SMOOTH_TRANSITION_DURATION_MS, SMOOTH_TRANSITION_STEPS};
use crate::curve::{self, CurveParameters};
use crate::solar::{self, SolarCache, SolarConfig, SolarLookup};

/// Interpolate between two brightness percentages based on progress.
fn interpolate_percent(start: u8, end: u8, progress: f64) -> u8 {
    let start_f = start as f64;
    let end_f = end as f64;
    (start_f + (end_f - start_f) * progress.clamp(0.0, 1.0)).round() as u8
}

pub struct BrightnessController {
    params: CurveParameters,
    solar_config: SolarConfig,
    cache: SolarCache,
    lookup: Box<dyn SolarLookup>,
    backend: Box<dyn BrightnessBackend>,
    transition_duration: Duration,
    transition_steps: u32,
}

impl BrightnessController {
    pub fn new(
        params: CurveParameters,
        solar_config: SolarConfig,
        lookup: Box<dyn SolarLookup>,
        backend: Box<dyn BrightnessBackend>,
    ) -> Self {
        Self {
            params,
            solar_config,
            cache: SolarCache::new(),
            lookup,
            backend,
            transition_duration: Duration::from_millis(SMOOTH_TRANSITION_DURATION_MS),
            transition_steps: SMOOTH_TRANSITION_STEPS,
        }
    }

    /// Override the stepped-transition timing (test seam).
    pub fn with_transition_timing(mut self, duration: Duration, steps: u32) -> Self {
        self.transition_duration = duration;
        self.transition_steps = steps.max(1);
        self
    }

    /// Round and clamp a computed brightness to a whole percentage.
    pub fn to_percent(brightness: f64) -> u8 {
        brightness.clamp(0.0, 100.0).round() as u8
    }

    /// Compute the desired brightness for the given instant.
    ///
    /// The solar lookup is consulted (through the per-day cache) only when
    /// the modifier is enabled; when it reports unavailable the curve value
    /// is the target for this tick.
    pub fn compute_target(&mut self, now: NaiveTime, today: NaiveDate) -> f64 {
        if self.solar_config.enabled {
            if let Some(event) =
                self.cache
                    .event_for(today, &self.solar_config.zipcode, self.lookup.as_ref())
            {
                if let Some(value) = solar::adjust(now, &event, &self.solar_config) {
                    return value;
                }
            }
        }

        curve::evaluate(now, &self.params)
    }

    /// Apply a brightness value through the backend in a single write.
    ///
    /// Rounds to a whole percentage and returns the value actually applied.
    pub fn apply(&mut self, brightness: f64) -> Result<u8> {
        let percent = Self::to_percent(brightness);
        self.backend.set_brightness(percent)?;
        Ok(percent)
    }

    /// Apply a brightness value, stepping smoothly from the current level.
    ///
    /// With no known current level the target is written directly. Otherwise
    /// the change is spread over `transition_steps` intermediate writes with
    /// short sleeps between them, ending exactly on the target. The running
    /// flag is checked before every write so shutdown cuts the transition
    /// short without a further application; the value reached so far is
    /// returned in that case.
    pub fn apply_smooth(
        &mut self,
        target: f64,
        current: Option<u8>,
        running: &AtomicBool,
    ) -> Result<u8> {
        let target_percent = Self::to_percent(target);
        let Some(start) = current else {
            return self.apply(target);
        };

        let steps = self.transition_steps;
        let step_delay = self.transition_duration / steps;
        let mut applied = start;

        for step in 1..=steps {
            if !running.load(Ordering::SeqCst) {
                return Ok(applied);
            }
            let progress = step as f64 / steps as f64;
            let value = interpolate_percent(start, target_percent, progress);
            self.backend.set_brightness(value)?;
            applied = value;
            if step < steps {
                thread::sleep(step_delay);
            }
        }

        Ok(applied)
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }
}
