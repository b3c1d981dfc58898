use std::time::Duration;

use serde::Serialize;

use crate::models::RequestConfig;
use crate::settings::FeedSettings;

/// TTL policy handed to the cache store whenever the request changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachePolicy {
    /// Cache namespace
    pub name: String,

    /// Age after which an entry is reported as expired
    pub ttl: Duration,

    /// Age after which an entry is dropped entirely
    pub expiry: Duration,
}

impl CachePolicy {
    /// Policy for a request: realtime and `Day` history get the short TTL,
    /// all other history the long one.
    pub fn for_request(config: &RequestConfig, settings: &FeedSettings) -> Self {
        let ttl = if config.is_short_lived() {
            settings.short_ttl
        } else {
            settings.long_ttl
        };

        Self {
            name: settings.cache_name.clone(),
            ttl,
            expiry: settings.cache_retention.max(ttl),
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::for_request(&RequestConfig::default(), &FeedSettings::default())
    }
}
