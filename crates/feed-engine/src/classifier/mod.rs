//! Response classification.
//!
//! Turns a raw parsed response into a data update, a single structured
//! data error, or a malformed result, and scans successful tables for
//! per-instrument sentinel values.

mod sentinel;

pub use sentinel::{scan_for_embedded_status_codes, EmbeddedStatus, Sentinel, SentinelLogLimiter};

use log::debug;
use serde_json::Value;

use crate::errors::FeedError;
use crate::models::{DataTable, FetchOutcome, ResponseEnvelope, ServiceError};

/// Code reported when the service error entry carries no reason.
const UNKNOWN_ERROR_CODE: &str = "unknown";

/// How a raw response was understood.
#[derive(Clone, Debug, PartialEq)]
pub enum Classification {
    /// A data table was found.
    Update(DataTable),
    /// Exactly one structured error entry was found.
    Error(ServiceError),
    /// The response cannot be used; the reason is kept for logging.
    Malformed(String),
}

impl Classification {
    /// Convert into the outcome delivered to the host.
    ///
    /// Malformed responses become [`FeedError::Parse`] so callers route them
    /// to the fallback path.
    pub fn into_outcome(
        self,
        cached: bool,
        user_config_changed: bool,
    ) -> Result<FetchOutcome, FeedError> {
        match self {
            Self::Update(table) => Ok(FetchOutcome::DataUpdate {
                table,
                cached,
                user_config_changed,
            }),
            Self::Error(error) => Ok(FetchOutcome::DataError {
                code: if error.reason.is_empty() {
                    UNKNOWN_ERROR_CODE.to_string()
                } else {
                    error.reason
                },
                message: error.message,
                cached,
            }),
            Self::Malformed(reason) => Err(FeedError::Parse(reason)),
        }
    }
}

/// Classify a raw response payload.
///
/// The transport hands over the array of parsed objects the callback was
/// invoked with; only the first one is inspected.
pub fn classify(payload: &[Value]) -> Classification {
    let Some(first) = payload.first() else {
        return Classification::Malformed("response contains no entries".to_string());
    };

    let envelope: ResponseEnvelope = match serde_json::from_value(first.clone()) {
        Ok(envelope) => envelope,
        Err(e) => {
            debug!("Response shape not understood: {}", e);
            return Classification::Malformed(format!("unexpected response shape: {}", e));
        }
    };

    if let Some(mut errors) = envelope.errors {
        if errors.len() == 1 {
            return Classification::Error(errors.remove(0));
        }
    }

    match envelope.table {
        Some(table) => Classification::Update(table),
        None => Classification::Malformed("response carries no table".to_string()),
    }
}
