//! # Brightr
//!
//! An automatic display brightness scheduler for Linux.
//!
//! Brightr adjusts the backlight on a fixed interval following a sinusoidal
//! time-of-day curve, optionally overridden by sunrise/sunset targets for a
//! configured location, while a user-driven auto/manual toggle can pause the
//! automation.
//!
//! ## Architecture
//!
//! - **config**: Configuration loading, validation, and default generation
//! - **constants**: Application-wide constants and defaults
//! - **curve**: Sinusoidal time-of-day brightness evaluation
//! - **solar**: Sunrise/sunset modifier, lookup, and per-day caching
//! - **controller**: Target computation and best-effort application
//! - **backend**: Brightness-setting abstraction (sysfs backlight)
//! - **mode**: Shared auto/manual mode state
//! - **scheduler**: Cancellable periodic recompute-and-apply loop
//! - **signals**: Shutdown and mode-toggle signal handling
//! - **logger**: Structured logging with visual formatting

pub mod backend;
pub mod config;
pub mod constants;
pub mod controller;
pub mod curve;
pub mod logger;
pub mod mode;
pub mod scheduler;
pub mod signals;
pub mod solar;

// Re-export important types for easier access
pub use backend::{BrightnessBackend, SysfsBackend};
pub use config::Config;
pub use controller::BrightnessController;
pub use curve::CurveParameters;
pub use logger::Log;
pub use mode::{Mode, ModeState};
pub use scheduler::{SchedulerLoop, TickOutcome};
pub use solar::{SolarConfig, SolarEvent, SolarLookup};
