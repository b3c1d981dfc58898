use serde::Serialize;
use uuid::Uuid;

use crate::models::{FeedType, ValidatedConfig};
use crate::settings::Endpoints;

/// Separator between the dimensions of a request key.
const KEY_SEPARATOR: char = ':';

/// Separator between requested fields inside the fields dimension.
const FIELD_SEPARATOR: char = ',';

/// Escapes separator characters that occur inside a dimension.
const KEY_ESCAPE: char = '\\';

/// Prefix of generated callback names.
const CALLBACK_PREFIX: &str = "finfeed";

/// Deterministic identity of a request.
///
/// Built from type, display id, symbols, duration and fields (in that order).
/// Used both as the live-request idempotency key and as the cache key.
/// Separators occurring inside a dimension or field are backslash-escaped, so
/// distinct configurations never produce the same key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct RequestKey(String);

impl RequestKey {
    pub fn build(config: &ValidatedConfig) -> Self {
        let mut key = String::new();
        for part in [
            config.kind.as_str(),
            config.display_id.as_str(),
            config.joined_symbols().as_str(),
            config.duration.code(),
        ] {
            push_escaped(&mut key, part);
            key.push(KEY_SEPARATOR);
        }
        for (i, field) in config.fields.iter().enumerate() {
            if i > 0 {
                key.push(FIELD_SEPARATOR);
            }
            push_escaped(&mut key, field);
        }
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn push_escaped(key: &mut String, part: &str) {
    for c in part.chars() {
        if matches!(c, KEY_SEPARATOR | FIELD_SEPARATOR | KEY_ESCAPE) {
            key.push(KEY_ESCAPE);
        }
        key.push(c);
    }
}

impl std::fmt::Display for RequestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of the global callback a JSONP response invokes.
///
/// Combines the feed instance id with a random suffix so that instances
/// sharing one callback namespace never collide.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CallbackToken(String);

impl CallbackToken {
    pub fn generate(instance_id: &Uuid) -> Self {
        Self(format!(
            "{}_{}_{:08x}",
            CALLBACK_PREFIX,
            instance_id.simple(),
            rand::random::<u32>()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CallbackToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything a transport needs to issue one live request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiveRequest {
    pub key: RequestKey,
    pub url: String,
    pub token: CallbackToken,
}

/// Projection clause for the requested fields, empty when no fields are requested.
pub fn select_clause(fields: &[String]) -> Option<String> {
    if fields.is_empty() {
        None
    } else {
        Some(format!("select {}", fields.join(",")))
    }
}

/// Build the request URL for a validated configuration.
pub fn build_url(config: &ValidatedConfig, token: &CallbackToken, endpoints: &Endpoints) -> String {
    let base = match config.kind {
        FeedType::Realtime => &endpoints.realtime_url,
        FeedType::Historical => &endpoints.historical_url,
    };

    let mut url = format!(
        "{}?id={}&code={}",
        base,
        urlencoding::encode(&config.display_id),
        urlencoding::encode(&config.joined_symbols())
    );

    if config.kind == FeedType::Historical {
        url.push_str("&kind=");
        url.push_str(config.duration.code());
    }

    if let Some(clause) = select_clause(&config.fields) {
        url.push_str("&tq=");
        url.push_str(&urlencoding::encode(&clause));
    }

    url.push_str("&tqx=");
    url.push_str(&urlencoding::encode(&format!(
        "out:json;responseHandler:{}",
        token
    )));

    url
}
