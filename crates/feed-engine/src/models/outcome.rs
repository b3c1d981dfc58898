use serde::Serialize;

use super::table::DataTable;

/// Result of one completed fetch attempt, live or cache-derived.
///
/// This is the unit handed to the [`NotificationSink`](crate::sink::NotificationSink).
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FetchOutcome {
    /// A table was received.
    #[serde(rename_all = "camelCase")]
    DataUpdate {
        table: DataTable,
        cached: bool,
        user_config_changed: bool,
    },

    /// The service answered with a single structured error.
    #[serde(rename_all = "camelCase")]
    DataError {
        code: String,
        message: Option<String>,
        cached: bool,
    },

    /// The retry budget was exhausted without a response.
    #[serde(rename_all = "camelCase")]
    RequestFailure { message: String, offline: bool },

    /// No usable data (unconfigured or invalid request, or unreadable response).
    #[serde(rename_all = "camelCase")]
    EmptyData { user_config_changed: bool },
}

impl FetchOutcome {
    /// Whether the outcome came from the service and may be stored.
    pub fn is_cacheable(&self) -> bool {
        matches!(
            self,
            Self::DataUpdate { cached: false, .. } | Self::DataError { cached: false, .. }
        )
    }

    /// Same outcome re-tagged as originating from cache.
    pub fn into_cached(self) -> Self {
        match self {
            Self::DataUpdate {
                table,
                user_config_changed,
                ..
            } => Self::DataUpdate {
                table,
                cached: true,
                user_config_changed,
            },
            Self::DataError { code, message, .. } => Self::DataError {
                code,
                message,
                cached: true,
            },
            other => other,
        }
    }

    /// Replace the user-config-changed marker where the variant carries one.
    pub fn with_user_config_changed(self, changed: bool) -> Self {
        match self {
            Self::DataUpdate { table, cached, .. } => Self::DataUpdate {
                table,
                cached,
                user_config_changed: changed,
            },
            Self::EmptyData { .. } => Self::EmptyData {
                user_config_changed: changed,
            },
            other => other,
        }
    }

    /// Whether the variant carries the user-config-changed marker.
    pub fn carries_config_marker(&self) -> bool {
        matches!(self, Self::DataUpdate { .. } | Self::EmptyData { .. })
    }
}
