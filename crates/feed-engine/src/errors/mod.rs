//! Error types and retry classification for the feed engine.
//!
//! This module provides:
//! - [`FeedError`]: The main error enum for all feed operations
//! - [`ValidationError`]: Why a request configuration was rejected
//! - [`TransportError`]: Failures reported by the transport layer
//! - [`CacheStoreError`]: Failures reported by the cache store
//! - [`RetryClass`]: Classification for determining what a failure leads to

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Reasons a [`RequestConfig`](crate::models::RequestConfig) fails validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No symbols configured at all. Emitted silently as empty data.
    #[error("No symbols configured")]
    NoSymbols,

    /// The symbol list contains an empty or whitespace-only element.
    #[error("Invalid symbols: {0}")]
    InvalidSymbols(String),

    /// The type is neither `realtime` nor `historical`.
    #[error("Invalid type: {0}")]
    InvalidType(String),

    /// Historical request with a duration outside the whitelist.
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),
}

impl ValidationError {
    /// Whether the failure should be logged as an error.
    ///
    /// A missing symbol list is the normal state of an unconfigured feed and
    /// only results in an empty-data emission.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::NoSymbols)
    }

    /// Stable code used in log records.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoSymbols => "no-symbols",
            Self::InvalidSymbols(_) => "invalid-symbols",
            Self::InvalidType(_) => "invalid-type",
            Self::InvalidDuration(_) => "invalid-duration",
        }
    }
}

/// Failures reported by a [`Transport`](crate::provider::Transport).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The script/request could not be loaded.
    #[error("Load failed: {0}")]
    LoadFailed(String),

    /// The request did not complete in time.
    #[error("Request timed out")]
    Timeout,
}

/// Failures reported by a [`CacheStore`](crate::cache::CacheStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheStoreError {
    /// The store could not be reached.
    #[error("Cache store unavailable: {0}")]
    Unavailable(String),

    /// The stored entry could not be decoded.
    #[error("Cache entry corrupt: {0}")]
    Corrupt(String),
}

/// Errors that can occur while producing a feed update.
///
/// Each variant is classified into a [`RetryClass`] via the
/// [`retry_class`](Self::retry_class) method, which determines how the
/// orchestrator handles it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// The request configuration is invalid.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The transport failed to deliver a response.
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    /// The service returned a single structured error.
    #[error("Data error: {code}")]
    PayloadData {
        /// Error code reported by the service
        code: String,
        /// Optional human readable message
        message: Option<String>,
    },

    /// A successful table carries a per-instrument sentinel value.
    #[error("Embedded status {code} for {symbols:?}")]
    EmbeddedSentinel {
        /// Sentinel value found in the table
        code: String,
        /// Symbols whose rows carried the sentinel
        symbols: Vec<String>,
    },

    /// The cache store could not produce an entry.
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(#[from] CacheStoreError),

    /// A payload (live or cached) did not have the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Settings are inconsistent.
    #[error("Invalid settings: {0}")]
    Settings(String),
}

impl FeedError {
    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use finfeed_engine::errors::{FeedError, RetryClass, TransportError};
    ///
    /// let error = FeedError::Transport(TransportError::Timeout);
    /// assert_eq!(error.retry_class(), RetryClass::RetryWithBackoff);
    ///
    /// let error = FeedError::Parse("missing table".to_string());
    /// assert_eq!(error.retry_class(), RetryClass::FallThrough);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Validation(_) | Self::Settings(_) => RetryClass::WaitForRefresh,
            Self::Transport(_) => RetryClass::RetryWithBackoff,
            Self::PayloadData { .. } => RetryClass::SurfaceImmediately,
            Self::CacheUnavailable(_) | Self::Parse(_) => RetryClass::FallThrough,
            Self::EmbeddedSentinel { .. } => RetryClass::LogOnly,
        }
    }
}
