//! Sunrise/sunset brightness modifier and solar event lookup.
//!
//! When enabled, the solar modifier replaces the time-of-day curve with fixed
//! daytime/nighttime brightness targets bracketed by the actual sunrise and
//! sunset for the configured location. Sunrise and sunset are computed locally
//! from coordinates resolved for a US zipcode; the HTTP geocoding step is
//! bounded by a timeout and its result is cached for the calendar day, so a
//! failed or slow lookup never stalls or crashes a scheduler tick.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveTime};
use serde::Deserialize;
use sunrise::{Coordinates, SolarDay, SolarEvent as SunEvent};

use crate::constants::{GEOCODE_URL_BASE, SOLAR_LOOKUP_RETRY_TICKS, SOLAR_LOOKUP_TIMEOUT_SECS};
use crate::logger::Log;

/// Solar modifier configuration, consumed pre-validated from the config layer.
#[derive(Debug, Clone)]
pub struct SolarConfig {
    /// US zipcode used to resolve coordinates.
    pub zipcode: String,
    /// Whether the solar modifier participates at all.
    pub enabled: bool,
    /// Brightness target between sunrise and sunset.
    pub sunrise_brightness: f64,
    /// Brightness target between sunset and the following sunrise.
    pub sunset_brightness: f64,
    /// Lower clamp bound for the modifier output (`<= max_modifier`).
    pub min_modifier: f64,
    /// Upper clamp bound for the modifier output.
    pub max_modifier: f64,
}

/// Sunrise and sunset times for a single calendar day, in local time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarEvent {
    pub sunrise: NaiveTime,
    pub sunset: NaiveTime,
}

/// Apply the solar modifier policy for a given time of day.
///
/// Returns `None` when the modifier is disabled. Daytime is the half-open
/// interval `[sunrise, sunset)`: at the exact sunrise or sunset instant the
/// post-transition value applies. The selected target is clamped to
/// `[min_modifier, max_modifier]` whatever the configured targets are.
pub fn adjust(now: NaiveTime, event: &SolarEvent, config: &SolarConfig) -> Option<f64> {
    if !config.enabled {
        return None;
    }

    let target = if event.sunrise <= now && now < event.sunset {
        config.sunrise_brightness
    } else {
        config.sunset_brightness
    };

    Some(target.clamp(config.min_modifier, config.max_modifier))
}

/// External collaborator resolving sunrise/sunset for a location and date.
///
/// Failures are expected (network errors, unknown zipcodes) and are handled
/// by falling back to the brightness curve for the tick.
pub trait SolarLookup {
    fn sunrise_sunset(&self, zipcode: &str, date: NaiveDate) -> Result<SolarEvent>;
}

#[derive(Debug, Deserialize)]
struct GeocodePlace {
    latitude: String,
    longitude: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    places: Vec<GeocodePlace>,
}

/// Extract coordinates from a zippopotam.us response body.
fn parse_geocode_response(body: &str) -> Result<(f64, f64)> {
    let response: GeocodeResponse =
        serde_json::from_str(body).context("unexpected geocoding response format")?;
    let place = response
        .places
        .first()
        .context("geocoding response contained no places")?;

    let latitude: f64 = place
        .latitude
        .parse()
        .context("geocoding response latitude was not numeric")?;
    let longitude: f64 = place
        .longitude
        .parse()
        .context("geocoding response longitude was not numeric")?;

    Ok((latitude, longitude))
}

/// Compute local sunrise/sunset for coordinates on a given date.
fn calculate_sunrise_sunset(latitude: f64, longitude: f64, date: NaiveDate) -> Result<SolarEvent> {
    if !(-90.0..=90.0).contains(&latitude) {
        anyhow::bail!(
            "Invalid latitude: {}. Must be between -90 and 90 degrees",
            latitude
        );
    }
    if !(-180.0..=180.0).contains(&longitude) {
        anyhow::bail!(
            "Invalid longitude: {}. Must be between -180 and 180 degrees",
            longitude
        );
    }

    let coord = Coordinates::new(latitude, longitude)
        .ok_or_else(|| anyhow::anyhow!("Failed to create coordinates"))?;
    let solar_day = SolarDay::new(coord, date);

    let sunrise = solar_day
        .event_time(SunEvent::Sunrise)
        .with_timezone(&Local)
        .time();
    let sunset = solar_day
        .event_time(SunEvent::Sunset)
        .with_timezone(&Local)
        .time();

    Ok(SolarEvent { sunrise, sunset })
}

/// Production lookup: zipcode geocoding over HTTP plus local solar math.
pub struct ZipcodeSolarLookup {
    client: reqwest::blocking::Client,
}

impl ZipcodeSolarLookup {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(SOLAR_LOOKUP_TIMEOUT_SECS))
            .build()
            .context("failed to build geocoding HTTP client")?;
        Ok(Self { client })
    }

    fn geocode(&self, zipcode: &str) -> Result<(f64, f64)> {
        let url = format!("{}/{}", GEOCODE_URL_BASE, zipcode);
        let body = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("geocoding request for zipcode {} failed", zipcode))?
            .text()
            .context("failed to read geocoding response body")?;
        parse_geocode_response(&body)
            .with_context(|| format!("could not resolve coordinates for zipcode {}", zipcode))
    }
}

impl SolarLookup for ZipcodeSolarLookup {
    fn sunrise_sunset(&self, zipcode: &str, date: NaiveDate) -> Result<SolarEvent> {
        let (latitude, longitude) = self.geocode(zipcode)?;
        calculate_sunrise_sunset(latitude, longitude, date)
    }
}

/// Failed-lookup marker so an outage does not trigger a fresh network
/// request on every tick.
#[derive(Debug)]
struct Outage {
    date: NaiveDate,
    ticks_since_attempt: u32,
}

/// Per-day cache of the resolved solar event.
///
/// The lookup runs at most once per calendar day; the cached entry is keyed
/// by date and becomes stale when the date rolls over, triggering a refetch
/// on the next request. A failed refetch leaves the modifier unavailable and
/// enters a backoff: the next retry happens only after
/// `SOLAR_LOOKUP_RETRY_TICKS` requests have been skipped, and the
/// unavailable warning is logged once per outage. A new calendar day clears
/// the backoff.
#[derive(Debug, Default)]
pub struct SolarCache {
    entry: Option<(NaiveDate, SolarEvent)>,
    outage: Option<Outage>,
}

impl SolarCache {
    pub fn new() -> Self {
        Self {
            entry: None,
            outage: None,
        }
    }

    /// Get the solar event for `today`, consulting the lookup only on a
    /// cache miss. Returns `None` when the lookup fails (or a recent failure
    /// is still backing off) and no same-day cached value exists.
    pub fn event_for(
        &mut self,
        today: NaiveDate,
        zipcode: &str,
        lookup: &dyn SolarLookup,
    ) -> Option<SolarEvent> {
        if let Some((date, event)) = self.entry {
            if date == today {
                return Some(event);
            }
        }

        if let Some(outage) = self.outage.as_mut() {
            if outage.date == today && outage.ticks_since_attempt < SOLAR_LOOKUP_RETRY_TICKS {
                outage.ticks_since_attempt += 1;
                return None;
            }
        }

        match lookup.sunrise_sunset(zipcode, today) {
            Ok(event) => {
                Log::log_indented(&format!(
                    "Solar times for {}: sunrise {}, sunset {}",
                    today,
                    event.sunrise.format("%H:%M:%S"),
                    event.sunset.format("%H:%M:%S")
                ));
                self.entry = Some((today, event));
                self.outage = None;
                Some(event)
            }
            Err(e) => {
                let fresh_outage = !matches!(&self.outage, Some(o) if o.date == today);
                if fresh_outage {
                    Log::log_warning(&format!(
                        "Sunrise/sunset lookup unavailable: {}. Falling back to brightness curve.",
                        e
                    ));
                }
                self.outage = Some(Outage {
                    date: today,
                    ticks_since_attempt: 0,
                });
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn test_config() -> SolarConfig {
        SolarConfig {
            zipcode: "10001".to_string(),
            enabled: true,
            sunrise_brightness: 40.0,
            sunset_brightness: 1.0,
            min_modifier: 0.0,
            max_modifier: 100.0,
        }
    }

    fn test_event() -> SolarEvent {
        SolarEvent {
            sunrise: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            sunset: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_daytime_selects_sunrise_brightness() {
        let value = adjust(
            NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            &test_event(),
            &test_config(),
        );
        assert_eq!(value, Some(40.0));
    }

    #[test]
    fn test_nighttime_selects_sunset_brightness() {
        let value = adjust(
            NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            &test_event(),
            &test_config(),
        );
        assert_eq!(value, Some(1.0));
    }

    #[test]
    fn test_boundary_instants_use_post_transition_value() {
        let event = test_event();
        let config = test_config();

        // At sunrise exactly, the day value applies
        assert_eq!(adjust(event.sunrise, &event, &config), Some(40.0));
        // At sunset exactly, the night value applies
        assert_eq!(adjust(event.sunset, &event, &config), Some(1.0));
    }

    #[test]
    fn test_disabled_yields_no_adjustment() {
        let mut config = test_config();
        config.enabled = false;
        let value = adjust(NaiveTime::from_hms_opt(12, 0, 0).unwrap(), &test_event(), &config);
        assert_eq!(value, None);
    }

    #[test]
    fn test_output_clamped_to_modifier_bounds() {
        let mut config = test_config();
        config.sunrise_brightness = 95.0;
        config.sunset_brightness = 2.0;
        config.min_modifier = 10.0;
        config.max_modifier = 80.0;

        let day = adjust(NaiveTime::from_hms_opt(12, 0, 0).unwrap(), &test_event(), &config);
        assert_eq!(day, Some(80.0));

        let night = adjust(NaiveTime::from_hms_opt(23, 0, 0).unwrap(), &test_event(), &config);
        assert_eq!(night, Some(10.0));
    }

    #[test]
    fn test_parse_geocode_response_valid() {
        let body = r#"{
            "post code": "10001",
            "country": "United States",
            "places": [{
                "place name": "New York City",
                "latitude": "40.7484",
                "longitude": "-73.9967"
            }]
        }"#;

        let (lat, lon) = parse_geocode_response(body).unwrap();
        assert!((lat - 40.7484).abs() < 1e-9);
        assert!((lon - (-73.9967)).abs() < 1e-9);
    }

    #[test]
    fn test_parse_geocode_response_no_places() {
        let body = r#"{"places": []}"#;
        assert!(parse_geocode_response(body).is_err());
    }

    #[test]
    fn test_parse_geocode_response_malformed() {
        assert!(parse_geocode_response("{}").is_err());
        assert!(parse_geocode_response("not json").is_err());
    }

    #[test]
    fn test_calculate_sunrise_sunset_rejects_bad_coordinates() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();
        assert!(calculate_sunrise_sunset(91.0, 0.0, date).is_err());
        assert!(calculate_sunrise_sunset(0.0, 181.0, date).is_err());
    }

    #[test]
    fn test_calculate_sunrise_sunset_orders_events() {
        // Mid-latitude location on an equinox: sunrise precedes sunset locally
        let date = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        let event = calculate_sunrise_sunset(40.7128, -74.0060, date).unwrap();
        assert_ne!(event.sunrise, event.sunset);
    }

    /// Lookup stub counting how many times it was consulted.
    struct CountingLookup {
        calls: Cell<u32>,
        fail: bool,
    }

    impl SolarLookup for CountingLookup {
        fn sunrise_sunset(&self, _zipcode: &str, _date: NaiveDate) -> Result<SolarEvent> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                anyhow::bail!("geocoding service unreachable")
            }
            Ok(SolarEvent {
                sunrise: NaiveTime::from_hms_opt(6, 30, 0).unwrap(),
                sunset: NaiveTime::from_hms_opt(19, 45, 0).unwrap(),
            })
        }
    }

    #[test]
    fn test_cache_fetches_once_per_day() {
        let lookup = CountingLookup {
            calls: Cell::new(0),
            fail: false,
        };
        let mut cache = SolarCache::new();
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let first = cache.event_for(today, "10001", &lookup);
        let second = cache.event_for(today, "10001", &lookup);

        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(lookup.calls.get(), 1);
    }

    #[test]
    fn test_cache_refetches_on_date_rollover() {
        let lookup = CountingLookup {
            calls: Cell::new(0),
            fail: false,
        };
        let mut cache = SolarCache::new();
        let day_one = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let day_two = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();

        cache.event_for(day_one, "10001", &lookup);
        cache.event_for(day_two, "10001", &lookup);

        assert_eq!(lookup.calls.get(), 2);
    }

    #[test]
    fn test_cache_reports_unavailable_on_failure() {
        let lookup = CountingLookup {
            calls: Cell::new(0),
            fail: true,
        };
        let mut cache = SolarCache::new();
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        assert_eq!(cache.event_for(today, "10001", &lookup), None);
    }

    #[test]
    fn test_cache_backs_off_while_lookup_keeps_failing() {
        let lookup = CountingLookup {
            calls: Cell::new(0),
            fail: true,
        };
        let mut cache = SolarCache::new();
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        // One attempt, then SOLAR_LOOKUP_RETRY_TICKS skipped requests, then
        // a single retry
        for _ in 0..(SOLAR_LOOKUP_RETRY_TICKS + 2) {
            assert_eq!(cache.event_for(today, "10001", &lookup), None);
        }
        assert_eq!(lookup.calls.get(), 2);
    }

    /// Lookup stub failing for its first attempt only.
    struct FlakyLookup {
        calls: Cell<u32>,
    }

    impl SolarLookup for FlakyLookup {
        fn sunrise_sunset(&self, _zipcode: &str, _date: NaiveDate) -> Result<SolarEvent> {
            self.calls.set(self.calls.get() + 1);
            if self.calls.get() == 1 {
                anyhow::bail!("geocoding service unreachable")
            }
            Ok(SolarEvent {
                sunrise: NaiveTime::from_hms_opt(6, 30, 0).unwrap(),
                sunset: NaiveTime::from_hms_opt(19, 45, 0).unwrap(),
            })
        }
    }

    #[test]
    fn test_cache_recovers_after_backoff_window() {
        let lookup = FlakyLookup {
            calls: Cell::new(0),
        };
        let mut cache = SolarCache::new();
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        // Initial failure enters the backoff
        assert_eq!(cache.event_for(today, "10001", &lookup), None);
        for _ in 0..SOLAR_LOOKUP_RETRY_TICKS {
            assert_eq!(cache.event_for(today, "10001", &lookup), None);
        }

        // Backoff expired: the retry succeeds and is cached
        let event = cache.event_for(today, "10001", &lookup);
        assert!(event.is_some());
        assert_eq!(lookup.calls.get(), 2);

        // Subsequent requests hit the cache, not the lookup
        assert_eq!(cache.event_for(today, "10001", &lookup), event);
        assert_eq!(lookup.calls.get(), 2);
    }

    #[test]
    fn test_cache_retries_immediately_on_new_day() {
        let lookup = CountingLookup {
            calls: Cell::new(0),
            fail: true,
        };
        let mut cache = SolarCache::new();
        let day_one = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let day_two = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();

        cache.event_for(day_one, "10001", &lookup);
        // Date rollover clears the backoff: the new day gets a fresh attempt
        cache.event_for(day_two, "10001", &lookup);
        assert_eq!(lookup.calls.get(), 2);
    }
}
