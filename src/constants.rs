//! Application constants and default values for brightr.
//!
//! This module contains the configuration defaults, validation limits,
//! and operational constants used throughout the application.

// ═══ Application Configuration Defaults ═══
// These values are used when config options are not specified by the user

pub const DEFAULT_AMPLITUDE: f64 = 25.0; // brightness swing around the base level
pub const DEFAULT_BASE_LEVEL: f64 = 50.0; // midpoint brightness percentage
pub const DEFAULT_CYCLE_HOURS: f64 = 24.0; // one full curve period per day
pub const DEFAULT_PHASE_OFFSET_HOURS: f64 = -6.0; // shifts the curve peak to mid-afternoon
pub const DEFAULT_UPDATE_INTERVAL: u64 = 300; // seconds between scheduler ticks
pub const DEFAULT_USE_SUNRISE_SUNSET: bool = false;
pub const DEFAULT_SUNRISE_BRIGHTNESS: f64 = 40.0; // daytime target percentage
pub const DEFAULT_SUNSET_BRIGHTNESS: f64 = 20.0; // nighttime target percentage
pub const DEFAULT_MIN_MODIFIER: f64 = 0.0;
pub const DEFAULT_MAX_MODIFIER: f64 = 100.0;

// ═══ Validation Limits ═══
// These limits ensure user inputs are within reasonable and safe ranges

// Brightness percentage limits
pub const MINIMUM_BRIGHTNESS: f64 = 0.0;
pub const MAXIMUM_BRIGHTNESS: f64 = 100.0;

// Curve parameter limits
pub const MINIMUM_CYCLE_HOURS: f64 = 0.25; // 15 minutes (prevents degenerate cycles)
pub const MAXIMUM_CYCLE_HOURS: f64 = 168.0; // one week

// Update interval limits
pub const MINIMUM_UPDATE_INTERVAL: u64 = 10; // seconds (prevents excessive wakeups)
pub const MAXIMUM_UPDATE_INTERVAL: u64 = 3600; // 1 hour max to stay responsive

// ═══ Smooth Transition Constants ═══
// Stepped brightness changes instead of abrupt jumps

pub const SMOOTH_TRANSITION_DURATION_MS: u64 = 3000; // total time for a stepped brightness change
pub const SMOOTH_TRANSITION_STEPS: u32 = 10; // intermediate writes per transition
pub const BRIGHTNESS_CHANGE_THRESHOLD: u8 = 5; // skip updates within this many percent of the target

// ═══ Operational Timing Constants ═══
// Internal timing values for application operation

pub const SLEEP_DETECTION_THRESHOLD_SECS: u64 = 300; // 5 minutes - detect system sleep/resume
pub const CHECK_INTERVAL_SECS: u64 = 1; // How often to check the running flag during sleep
pub const SOLAR_LOOKUP_TIMEOUT_SECS: u64 = 5; // HTTP timeout for the geocoding request
pub const SOLAR_LOOKUP_RETRY_TICKS: u32 = 5; // skipped ticks before retrying a failed lookup

// ═══ Geocoding Constants ═══
// Zipcode to coordinate resolution

pub const GEOCODE_URL_BASE: &str = "https://api.zippopotam.us/us";

// ═══ Exit Codes ═══

pub const EXIT_FAILURE: i32 = 1;
