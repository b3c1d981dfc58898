//! Engine settings: timer cadence, cache TTLs and service endpoints.
//!
//! Settings can be built in code, deserialized from JSON, or read from
//! `FEED_*` environment variables (a `.env` file is honoured).

use std::env;
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::FeedError;

/// Standard polling cadence.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Delay between retries of a failed live request.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Wait after the retry budget is exhausted before polling resumes.
pub const DEFAULT_COOLDOWN_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Consecutive transport failures that make up one burst.
pub const DEFAULT_MAX_RETRIES: u8 = 5;

/// Gap kept between the short TTL and the refresh interval.
pub const DEFAULT_TTL_SAFETY_MARGIN: Duration = Duration::from_secs(5);

/// TTL for realtime and intraday historical data.
pub const DEFAULT_SHORT_TTL: Duration = Duration::from_secs(55);

/// TTL for daily-or-longer historical data.
pub const DEFAULT_LONG_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// How long stale entries are retained for fallback use.
pub const DEFAULT_CACHE_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Sentinel log records are emitted at most once per code in this window.
pub const DEFAULT_SENTINEL_LOG_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Upper bound for a single live request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_CACHE_NAME: &str = "financial-feed";

/// Base URLs of the financial data service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoints {
    pub realtime_url: String,
    pub historical_url: String,
}

impl Endpoints {
    pub fn production() -> Self {
        Self {
            realtime_url: "https://contentfinancial2.appspot.com/data".to_string(),
            historical_url: "https://contentfinancial2.appspot.com/data/historical".to_string(),
        }
    }

    pub fn staging() -> Self {
        Self {
            realtime_url: "https://contentfinancial2-test.appspot.com/data".to_string(),
            historical_url: "https://contentfinancial2-test.appspot.com/data/historical"
                .to_string(),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::production()
    }
}

/// Settings for one feed instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedSettings {
    #[serde(with = "duration_secs")]
    pub refresh_interval: Duration,
    #[serde(with = "duration_secs")]
    pub retry_interval: Duration,
    #[serde(with = "duration_secs")]
    pub cooldown_interval: Duration,
    pub max_retries: u8,
    #[serde(with = "duration_secs")]
    pub short_ttl: Duration,
    #[serde(with = "duration_secs")]
    pub long_ttl: Duration,
    #[serde(with = "duration_secs")]
    pub ttl_safety_margin: Duration,
    #[serde(with = "duration_secs")]
    pub cache_retention: Duration,
    #[serde(with = "duration_secs")]
    pub sentinel_log_window: Duration,
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
    pub cache_name: String,
    pub endpoints: Endpoints,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            cooldown_interval: DEFAULT_COOLDOWN_INTERVAL,
            max_retries: DEFAULT_MAX_RETRIES,
            short_ttl: DEFAULT_SHORT_TTL,
            long_ttl: DEFAULT_LONG_TTL,
            ttl_safety_margin: DEFAULT_TTL_SAFETY_MARGIN,
            cache_retention: DEFAULT_CACHE_RETENTION,
            sentinel_log_window: DEFAULT_SENTINEL_LOG_WINDOW,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            endpoints: Endpoints::default(),
        }
    }
}

impl FeedSettings {
    /// Read settings from the environment.
    ///
    /// `FEED_ENV=staging` (or `test`) selects the staging endpoints; the
    /// individual URLs can be overridden with `FEED_REALTIME_URL` and
    /// `FEED_HISTORICAL_URL`. Intervals are given in seconds. Missing or
    /// unparsable values keep their defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let mut endpoints = match env::var("FEED_ENV").as_deref() {
            Ok("staging") | Ok("test") => Endpoints::staging(),
            _ => Endpoints::production(),
        };
        if let Ok(url) = env::var("FEED_REALTIME_URL") {
            endpoints.realtime_url = url;
        }
        if let Ok(url) = env::var("FEED_HISTORICAL_URL") {
            endpoints.historical_url = url;
        }

        Self {
            refresh_interval: secs_var("FEED_REFRESH_INTERVAL_SECS", defaults.refresh_interval),
            retry_interval: secs_var("FEED_RETRY_INTERVAL_SECS", defaults.retry_interval),
            cooldown_interval: secs_var("FEED_COOLDOWN_SECS", defaults.cooldown_interval),
            max_retries: env::var("FEED_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_retries),
            short_ttl: secs_var("FEED_SHORT_TTL_SECS", defaults.short_ttl),
            long_ttl: secs_var("FEED_LONG_TTL_SECS", defaults.long_ttl),
            ttl_safety_margin: defaults.ttl_safety_margin,
            cache_retention: secs_var("FEED_CACHE_RETENTION_SECS", defaults.cache_retention),
            sentinel_log_window: defaults.sentinel_log_window,
            request_timeout: secs_var("FEED_REQUEST_TIMEOUT_SECS", defaults.request_timeout),
            cache_name: env::var("FEED_CACHE_NAME").unwrap_or(defaults.cache_name),
            endpoints,
        }
    }

    /// Check the timing invariants the orchestrator relies on.
    pub fn validate(&self) -> Result<(), FeedError> {
        if self.max_retries == 0 {
            return Err(FeedError::Settings(
                "max_retries must be at least 1".to_string(),
            ));
        }
        if self.short_ttl + self.ttl_safety_margin > self.refresh_interval {
            return Err(FeedError::Settings(format!(
                "short TTL {:?} must stay {:?} below the refresh interval {:?}",
                self.short_ttl, self.ttl_safety_margin, self.refresh_interval
            )));
        }
        if self.cooldown_interval <= self.retry_interval {
            return Err(FeedError::Settings(format!(
                "cooldown {:?} must be longer than the retry interval {:?}",
                self.cooldown_interval, self.retry_interval
            )));
        }
        Ok(())
    }
}

fn secs_var(name: &str, default: Duration) -> Duration {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                warn!("Ignoring unparsable {}={:?}", name, raw);
                default
            }
        },
        Err(_) => default,
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serializes tests that touch `FEED_*` variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_KEYS: [&str; 5] = [
        "FEED_ENV",
        "FEED_REALTIME_URL",
        "FEED_REFRESH_INTERVAL_SECS",
        "FEED_RETRY_INTERVAL_SECS",
        "FEED_MAX_RETRIES",
    ];

    fn cleanup_env() {
        for key in ENV_KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = FeedSettings::default();
        assert!(settings.validate().is_ok());
        assert!(settings.short_ttl < settings.refresh_interval);
        assert!(settings.cooldown_interval > settings.retry_interval);
    }

    #[test]
    fn test_short_ttl_must_leave_margin() {
        let settings = FeedSettings {
            short_ttl: Duration::from_secs(58),
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(FeedError::Settings(_))));
    }

    #[test]
    fn test_cooldown_must_exceed_retry_interval() {
        let settings = FeedSettings {
            cooldown_interval: Duration::from_secs(5),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_settings_from_json_with_partial_fields() {
        let settings: FeedSettings =
            serde_json::from_str(r#"{"refreshInterval": 120, "shortTtl": 100}"#).unwrap();
        assert_eq!(settings.refresh_interval, Duration::from_secs(120));
        assert_eq!(settings.short_ttl, Duration::from_secs(100));
        assert_eq!(settings.retry_interval, DEFAULT_RETRY_INTERVAL);
        assert_eq!(settings.endpoints, Endpoints::production());
    }

    #[test]
    fn test_from_env_reads_overrides_and_keeps_defaults_for_bad_values() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        cleanup_env();
        env::set_var("FEED_ENV", "staging");
        env::set_var("FEED_REALTIME_URL", "http://localhost:8080/data");
        env::set_var("FEED_REFRESH_INTERVAL_SECS", "90");
        env::set_var("FEED_RETRY_INTERVAL_SECS", "soon");
        env::set_var("FEED_MAX_RETRIES", "3");

        let settings = FeedSettings::from_env();
        cleanup_env();

        assert_eq!(settings.endpoints.realtime_url, "http://localhost:8080/data");
        assert_eq!(
            settings.endpoints.historical_url,
            Endpoints::staging().historical_url
        );
        assert_eq!(settings.refresh_interval, Duration::from_secs(90));
        assert_eq!(settings.retry_interval, DEFAULT_RETRY_INTERVAL);
        assert_eq!(settings.max_retries, 3);
        assert_eq!(settings.cooldown_interval, DEFAULT_COOLDOWN_INTERVAL);
    }

    #[test]
    fn test_from_env_selects_endpoints_by_environment() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        cleanup_env();

        env::set_var("FEED_ENV", "test");
        assert_eq!(FeedSettings::from_env().endpoints, Endpoints::staging());

        env::set_var("FEED_ENV", "production");
        assert_eq!(FeedSettings::from_env().endpoints, Endpoints::production());

        env::remove_var("FEED_ENV");
        let settings = FeedSettings::from_env();
        cleanup_env();
        assert_eq!(settings.endpoints, Endpoints::production());
        assert_eq!(settings.refresh_interval, DEFAULT_REFRESH_INTERVAL);
        assert_eq!(settings.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_staging_endpoints_differ() {
        assert_ne!(Endpoints::staging(), Endpoints::production());
        assert!(Endpoints::staging().historical_url.ends_with("/historical"));
    }
}
