//! Brightness-setting backend abstraction.
//!
//! The scheduler talks to display hardware through the [`BrightnessBackend`]
//! trait so the OS-level primitive stays swappable and mockable. The shipped
//! implementation writes the Linux sysfs backlight interface for the first
//! discovered device (per-display differentiation is out of scope).

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::logger::Log;

/// Trait for backends that can set display brightness.
///
/// `set_brightness` failures are recoverable: the caller logs them and
/// retries on the next tick. Setting the same percentage twice must leave
/// the hardware in the same state (no cumulative effect).
#[cfg_attr(test, mockall::automock)]
pub trait BrightnessBackend {
    /// Apply an absolute brightness percentage (0-100).
    fn set_brightness(&mut self, percent: u8) -> Result<()>;

    /// Short name identifying the backend in logs.
    fn backend_name(&self) -> &'static str;
}

/// Linux sysfs backlight backend.
///
/// Scales the requested percentage against the device's `max_brightness`
/// and writes the absolute value to its `brightness` attribute.
pub struct SysfsBackend {
    device_path: PathBuf,
    max_brightness: u32,
}

impl SysfsBackend {
    /// Discover the first backlight device under `/sys/class/backlight`.
    pub fn new() -> Result<Self> {
        Self::with_class_dir(PathBuf::from("/sys/class/backlight"))
    }

    /// Construct against an explicit backlight class directory (test seam).
    pub fn with_class_dir(class_dir: PathBuf) -> Result<Self> {
        let mut entries: Vec<_> = fs::read_dir(&class_dir)
            .with_context(|| format!("cannot read backlight class dir {}", class_dir.display()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .collect();
        entries.sort();

        let device_path = entries
            .into_iter()
            .next()
            .context("no backlight devices found")?;

        let max_raw = fs::read_to_string(device_path.join("max_brightness"))
            .with_context(|| format!("cannot read max_brightness for {}", device_path.display()))?;
        let max_brightness: u32 = max_raw
            .trim()
            .parse()
            .context("max_brightness was not an integer")?;
        if max_brightness == 0 {
            anyhow::bail!(
                "backlight device {} reports max_brightness of 0",
                device_path.display()
            );
        }

        Log::log_decorated(&format!(
            "Using backlight device: {} (max {})",
            device_path.display(),
            max_brightness
        ));

        Ok(Self {
            device_path,
            max_brightness,
        })
    }

    fn raw_value_for(&self, percent: u8) -> u32 {
        let percent = percent.min(100) as f64;
        (percent / 100.0 * self.max_brightness as f64).round() as u32
    }
}

impl BrightnessBackend for SysfsBackend {
    fn set_brightness(&mut self, percent: u8) -> Result<()> {
        let raw = self.raw_value_for(percent);
        let target = self.device_path.join("brightness");
        fs::write(&target, raw.to_string())
            .with_context(|| format!("failed to write brightness to {}", target.display()))
    }

    fn backend_name(&self) -> &'static str {
        "sysfs"
    }
}
