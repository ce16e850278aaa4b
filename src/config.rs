//! Configuration loading and validation for brightr.
//!
//! Settings live in a TOML file, `brightr.toml`, under the XDG config
//! directory (`~/.config/brightr/brightr.toml`). Missing optional fields fall
//! back to the defaults in [`crate::constants`]; a missing file is generated
//! with a commented default configuration on first run.
//!
//! Validation runs once at startup and is the only place configuration errors
//! are fatal. After that the core treats the values as a trusted
//! `CurveParameters` + `SolarConfig` pair.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use crate::constants::*;
use crate::curve::CurveParameters;
use crate::logger::Log;
use crate::solar::SolarConfig;

/// Configuration structure for brightr application settings.
///
/// Loaded from `brightr.toml`. Every field is optional except the brightness
/// curve section's presence; unspecified values use the application defaults.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Brightness swing around the base level, in percentage points.
    pub amplitude: Option<f64>,
    /// Midpoint brightness percentage the curve oscillates around.
    pub base_level: Option<f64>,
    /// Curve period in hours (typically 24).
    pub cycle_hours: Option<f64>,
    /// Phase shift in hours; moves the curve peak earlier or later.
    pub phase_offset_hours: Option<f64>,
    /// Seconds between scheduler ticks.
    pub update_interval: Option<u64>,
    /// US zipcode for sunrise/sunset lookup.
    pub zipcode: Option<String>,
    /// Whether sunrise/sunset targets override the curve.
    pub use_sunrise_sunset: Option<bool>,
    /// Brightness target between sunrise and sunset.
    pub sunrise_brightness: Option<f64>,
    /// Brightness target between sunset and the following sunrise.
    pub sunset_brightness: Option<f64>,
    /// Lower clamp bound for the solar modifier output.
    pub min_modifier: Option<f64>,
    /// Upper clamp bound for the solar modifier output.
    pub max_modifier: Option<f64>,
}

impl Config {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join("brightr").join("brightr.toml"))
    }

    /// Load configuration from the default path, creating a default config
    /// file first if none exists.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }
        Self::load_from_path(&config_path)
    }

    /// Load and validate configuration from an explicit path.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Write a commented default configuration file.
    pub fn create_default_config(path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let content = format!(
            r#"# brightr configuration

# Sinusoidal brightness curve: brightness follows
#   base_level + amplitude * sin(2*pi * (hour + phase_offset_hours) / cycle_hours)
# clamped to 0-100. Keep base_level - amplitude >= 0 and
# base_level + amplitude <= 100 for a curve that never clips.
amplitude = {amplitude:.1}
base_level = {base_level:.1}
cycle_hours = {cycle_hours:.1}
phase_offset_hours = {phase_offset:.1}

# Seconds between brightness updates
update_interval = {interval}

# Sunrise/sunset override. When enabled, daytime uses sunrise_brightness and
# nighttime uses sunset_brightness instead of the curve; the curve remains the
# fallback whenever the location lookup is unavailable.
use_sunrise_sunset = {use_solar}
#zipcode = "10001"
sunrise_brightness = {sunrise_brightness:.1}
sunset_brightness = {sunset_brightness:.1}
min_modifier = {min_modifier:.1}
max_modifier = {max_modifier:.1}
"#,
            amplitude = DEFAULT_AMPLITUDE,
            base_level = DEFAULT_BASE_LEVEL,
            cycle_hours = DEFAULT_CYCLE_HOURS,
            phase_offset = DEFAULT_PHASE_OFFSET_HOURS,
            interval = DEFAULT_UPDATE_INTERVAL,
            use_solar = DEFAULT_USE_SUNRISE_SUNSET,
            sunrise_brightness = DEFAULT_SUNRISE_BRIGHTNESS,
            sunset_brightness = DEFAULT_SUNSET_BRIGHTNESS,
            min_modifier = DEFAULT_MIN_MODIFIER,
            max_modifier = DEFAULT_MAX_MODIFIER,
        );

        fs::write(path, content)
            .with_context(|| format!("Failed to write default config: {}", path.display()))?;
        Log::log_decorated(&format!("Created default config at {}", path.display()));
        Ok(())
    }

    /// Curve parameters with defaults applied.
    pub fn curve_parameters(&self) -> CurveParameters {
        CurveParameters {
            amplitude: self.amplitude.unwrap_or(DEFAULT_AMPLITUDE),
            base_level: self.base_level.unwrap_or(DEFAULT_BASE_LEVEL),
            cycle_hours: self.cycle_hours.unwrap_or(DEFAULT_CYCLE_HOURS),
            phase_offset_hours: self.phase_offset_hours.unwrap_or(DEFAULT_PHASE_OFFSET_HOURS),
        }
    }

    /// Solar modifier configuration with defaults applied.
    pub fn solar_config(&self) -> SolarConfig {
        SolarConfig {
            zipcode: self.zipcode.clone().unwrap_or_default(),
            enabled: self.use_sunrise_sunset.unwrap_or(DEFAULT_USE_SUNRISE_SUNSET),
            sunrise_brightness: self.sunrise_brightness.unwrap_or(DEFAULT_SUNRISE_BRIGHTNESS),
            sunset_brightness: self.sunset_brightness.unwrap_or(DEFAULT_SUNSET_BRIGHTNESS),
            min_modifier: self.min_modifier.unwrap_or(DEFAULT_MIN_MODIFIER),
            max_modifier: self.max_modifier.unwrap_or(DEFAULT_MAX_MODIFIER),
        }
    }

    /// Effective scheduler interval in seconds.
    pub fn update_interval_secs(&self) -> u64 {
        self.update_interval.unwrap_or(DEFAULT_UPDATE_INTERVAL)
    }

    /// Log the effective configuration at startup.
    pub fn log_config(&self) {
        let params = self.curve_parameters();
        let solar = self.solar_config();

        Log::log_block_start("Loaded configuration");
        Log::log_indented(&format!("Curve amplitude: {}", params.amplitude));
        Log::log_indented(&format!("Curve base level: {}%", params.base_level));
        Log::log_indented(&format!("Curve cycle: {} hours", params.cycle_hours));
        Log::log_indented(&format!(
            "Curve phase offset: {} hours",
            params.phase_offset_hours
        ));
        Log::log_indented(&format!("Update interval: {} seconds", self.update_interval_secs()));
        Log::log_indented(&format!("Sunrise/sunset override: {}", solar.enabled));
        if solar.enabled {
            Log::log_indented(&format!("Location zipcode: {}", solar.zipcode));
            Log::log_indented(&format!(
                "Day/night brightness: {}% / {}%",
                solar.sunrise_brightness, solar.sunset_brightness
            ));
            Log::log_indented(&format!(
                "Modifier bounds: {}% - {}%",
                solar.min_modifier, solar.max_modifier
            ));
        }
    }
}

/// Validate configuration ranges and consistency.
///
/// Failures here are fatal at startup; nothing downstream re-checks these
/// invariants.
pub fn validate_config(config: &Config) -> Result<()> {
    let params = config.curve_parameters();

    if !params.amplitude.is_finite() || params.amplitude <= 0.0 {
        anyhow::bail!(
            "Amplitude must be a positive number, got {}",
            params.amplitude
        );
    }

    if !params.base_level.is_finite()
        || !(MINIMUM_BRIGHTNESS..=MAXIMUM_BRIGHTNESS).contains(&params.base_level)
    {
        anyhow::bail!(
            "Base level must be between {} and {}, got {}",
            MINIMUM_BRIGHTNESS,
            MAXIMUM_BRIGHTNESS,
            params.base_level
        );
    }

    if !params.cycle_hours.is_finite()
        || !(MINIMUM_CYCLE_HOURS..=MAXIMUM_CYCLE_HOURS).contains(&params.cycle_hours)
    {
        anyhow::bail!(
            "Cycle hours must be between {} and {}, got {}",
            MINIMUM_CYCLE_HOURS,
            MAXIMUM_CYCLE_HOURS,
            params.cycle_hours
        );
    }

    if !params.phase_offset_hours.is_finite() {
        anyhow::bail!("Phase offset must be a finite number");
    }

    let interval = config.update_interval_secs();
    if !(MINIMUM_UPDATE_INTERVAL..=MAXIMUM_UPDATE_INTERVAL).contains(&interval) {
        anyhow::bail!(
            "Update interval must be between {} and {} seconds, got {}",
            MINIMUM_UPDATE_INTERVAL,
            MAXIMUM_UPDATE_INTERVAL,
            interval
        );
    }

    let solar = config.solar_config();
    if solar.min_modifier > solar.max_modifier {
        anyhow::bail!(
            "min_modifier ({}) must not exceed max_modifier ({})",
            solar.min_modifier,
            solar.max_modifier
        );
    }

    for (name, value) in [
        ("sunrise_brightness", solar.sunrise_brightness),
        ("sunset_brightness", solar.sunset_brightness),
        ("min_modifier", solar.min_modifier),
        ("max_modifier", solar.max_modifier),
    ] {
        if !value.is_finite() || !(MINIMUM_BRIGHTNESS..=MAXIMUM_BRIGHTNESS).contains(&value) {
            anyhow::bail!(
                "{} must be between {} and {}, got {}",
                name,
                MINIMUM_BRIGHTNESS,
                MAXIMUM_BRIGHTNESS,
                value
            );
        }
    }

    if solar.enabled && solar.zipcode.is_empty() {
        anyhow::bail!("use_sunrise_sunset is enabled but no zipcode is configured");
    }

    Ok(())
}
