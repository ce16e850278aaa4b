//! Periodic brightness scheduling loop.
//!
//! The loop wakes on a fixed interval, and while the shared mode is Auto it
//! recomputes the brightness target and applies it through the controller.
//! Manual ticks are no-ops that still reset the timer. The wait is chunked
//! against the running flag so shutdown interrupts it promptly, and every
//! tick is isolated: an apply failure is logged and the loop continues.

use chrono::Local;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::constants::{
    BRIGHTNESS_CHANGE_THRESHOLD, CHECK_INTERVAL_SECS, SLEEP_DETECTION_THRESHOLD_SECS,
};
use crate::controller::BrightnessController;
use crate::logger::Log;
use crate::mode::{Mode, ModeState};

const CHECK_INTERVAL: Duration = Duration::from_secs(CHECK_INTERVAL_SECS);

/// What a single tick did, for logging and tests.
#[derive(Debug, PartialEq, Copy, Clone)]
pub enum TickOutcome {
    /// Brightness was computed and applied.
    Applied(u8),
    /// Mode was Manual; nothing was done.
    SkippedManual,
    /// Target was within the change threshold of the last applied value;
    /// no write was issued.
    NearTarget(u8),
    /// The backend rejected the write; will retry next tick.
    ApplyFailed,
}

pub struct SchedulerLoop {
    interval: Duration,
    running: Arc<AtomicBool>,
    mode: Arc<ModeState>,
}

impl SchedulerLoop {
    pub fn new(interval: Duration, running: Arc<AtomicBool>, mode: Arc<ModeState>) -> Self {
        Self {
            interval,
            running,
            mode,
        }
    }

    /// Execute one tick against the current wall clock.
    pub fn tick(&self, controller: &mut BrightnessController) -> TickOutcome {
        let now = Local::now();
        self.tick_at(controller, now.time(), now.date_naive())
    }

    /// Execute one tick for an explicit instant (test seam).
    pub fn tick_at(
        &self,
        controller: &mut BrightnessController,
        now: chrono::NaiveTime,
        today: chrono::NaiveDate,
    ) -> TickOutcome {
        if self.mode.get() == Mode::Manual {
            return TickOutcome::SkippedManual;
        }

        let target = controller.compute_target(now, today);
        let current = self.mode.last_applied();

        // Leave the hardware alone when the target is within the change
        // threshold of what was last applied
        if let Some(percent) = current {
            let delta = (BrightnessController::to_percent(target) as i16 - percent as i16).abs();
            if delta <= BRIGHTNESS_CHANGE_THRESHOLD as i16 {
                return TickOutcome::NearTarget(percent);
            }
        }

        match controller.apply_smooth(target, current, &self.running) {
            Ok(percent) => {
                self.mode.record_applied(percent);
                TickOutcome::Applied(percent)
            }
            Err(e) => {
                Log::log_warning(&format!("Failed to apply brightness: {}", e));
                Log::log_indented("Will retry on next cycle...");
                TickOutcome::ApplyFailed
            }
        }
    }

    /// Run ticks until the running flag clears.
    ///
    /// Performs no brightness application once shutdown is signalled; the
    /// wait between ticks is interrupted within one check interval.
    pub fn run(&self, controller: &mut BrightnessController) {
        let mut last_tick_time = Instant::now();

        while self.running.load(Ordering::SeqCst) {
            let elapsed = last_tick_time.elapsed();
            if elapsed > Duration::from_secs(SLEEP_DETECTION_THRESHOLD_SECS) + self.interval {
                Log::log_decorated(&format!(
                    "Large time jump detected ({} minutes). System may have resumed from sleep.",
                    elapsed.as_secs() / 60
                ));
            }
            last_tick_time = Instant::now();

            match self.tick(controller) {
                TickOutcome::Applied(percent) => {
                    Log::log_decorated(&format!("Applied brightness: {}%", percent));
                }
                TickOutcome::SkippedManual => {
                    Log::log_decorated("Manual mode active, skipping brightness update");
                }
                TickOutcome::NearTarget(percent) => {
                    Log::log_decorated(&format!(
                        "Brightness {}% already close to target, no update needed",
                        percent
                    ));
                }
                TickOutcome::ApplyFailed => {}
            }

            // Sleep in small chunks so shutdown can interrupt the wait
            let mut slept = Duration::from_secs(0);
            while slept < self.interval && self.running.load(Ordering::SeqCst) {
                let chunk = CHECK_INTERVAL.min(self.interval - slept);
                thread::sleep(chunk);
                slept += chunk;
            }
        }
    }
}
