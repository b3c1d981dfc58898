//! Notification sink trait, event payloads and log records.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use serde_json::Value;

use crate::models::{DataTable, FetchOutcome};

/// `data-update` payload. `table` is `None` for empty data.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataUpdateEvent {
    pub table: Option<DataTable>,
    pub cached: bool,
    pub user_config_changed: bool,
}

/// `data-error` payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DataErrorEvent {
    pub code: String,
    pub message: Option<String>,
    pub cached: bool,
}

/// `request-error` payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RequestErrorEvent {
    pub message: String,
}

/// `client-offline` payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClientOfflineEvent {
    pub message: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_log_level(&self) -> log::Level {
        match self {
            Self::Info => log::Level::Info,
            Self::Warning => log::Level::Warn,
            Self::Error => log::Level::Error,
        }
    }
}

/// Rate limit hint for downstream log shipping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RateLimit {
    #[serde(rename = "once-per-day")]
    OncePerDay,
}

/// Structured log record delivered to the host.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub level: LogLevel,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    pub details: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimit>,
}

impl LogRecord {
    pub fn new(level: LogLevel, event: impl Into<String>, details: Value) -> Self {
        Self {
            level,
            event: event.into(),
            error_code: None,
            details,
            rate_limit: None,
        }
    }

    pub fn info(event: impl Into<String>, details: Value) -> Self {
        Self::new(LogLevel::Info, event, details)
    }

    pub fn warning(event: impl Into<String>, details: Value) -> Self {
        Self::new(LogLevel::Warning, event, details)
    }

    pub fn error(event: impl Into<String>, details: Value) -> Self {
        Self::new(LogLevel::Error, event, details)
    }

    pub fn with_error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimit) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }
}

/// Receiver of everything the feed reports to its host.
///
/// # Design Rules
///
/// - Methods must be fast and non-blocking; they are called from the
///   orchestrator's event loop
/// - Failure to deliver must not affect the feed (best-effort)
pub trait NotificationSink: Send + Sync {
    fn data_update(&self, event: DataUpdateEvent);

    fn data_error(&self, event: DataErrorEvent);

    fn request_error(&self, event: RequestErrorEvent);

    fn client_offline(&self, event: ClientOfflineEvent);

    fn log(&self, record: LogRecord);

    /// Route a [`FetchOutcome`] to the matching event method.
    fn deliver(&self, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::DataUpdate {
                table,
                cached,
                user_config_changed,
            } => self.data_update(DataUpdateEvent {
                table: Some(table),
                cached,
                user_config_changed,
            }),
            FetchOutcome::EmptyData {
                user_config_changed,
            } => self.data_update(DataUpdateEvent {
                table: None,
                cached: false,
                user_config_changed,
            }),
            FetchOutcome::DataError {
                code,
                message,
                cached,
            } => self.data_error(DataErrorEvent {
                code,
                message,
                cached,
            }),
            FetchOutcome::RequestFailure {
                message,
                offline: true,
            } => self.client_offline(ClientOfflineEvent { message }),
            FetchOutcome::RequestFailure {
                message,
                offline: false,
            } => self.request_error(RequestErrorEvent { message }),
        }
    }
}

/// No-op implementation for hosts that don't need notifications.
#[derive(Clone, Default)]
pub struct NoOpNotificationSink;

impl NotificationSink for NoOpNotificationSink {
    fn data_update(&self, _event: DataUpdateEvent) {}

    fn data_error(&self, _event: DataErrorEvent) {}

    fn request_error(&self, _event: RequestErrorEvent) {}

    fn client_offline(&self, _event: ClientOfflineEvent) {}

    fn log(&self, _record: LogRecord) {}
}

/// One emitted consumer-facing event.
#[derive(Clone, Debug, PartialEq)]
pub enum Notification {
    DataUpdate(DataUpdateEvent),
    DataError(DataErrorEvent),
    RequestError(RequestErrorEvent),
    ClientOffline(ClientOfflineEvent),
}

/// Mock sink for testing - collects emitted events and log records.
#[derive(Clone, Default)]
pub struct MockNotificationSink {
    notifications: Arc<Mutex<Vec<Notification>>>,
    logs: Arc<Mutex<Vec<LogRecord>>>,
}

impl MockNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns all collected notifications.
    pub fn notifications(&self) -> Vec<Notification> {
        Self::lock(&self.notifications).clone()
    }

    /// Returns all collected log records.
    pub fn logs(&self) -> Vec<LogRecord> {
        Self::lock(&self.logs).clone()
    }

    /// Returns the collected data-update events.
    pub fn data_updates(&self) -> Vec<DataUpdateEvent> {
        self.notifications()
            .into_iter()
            .filter_map(|n| match n {
                Notification::DataUpdate(event) => Some(event),
                _ => None,
            })
            .collect()
    }

    /// Returns log records with the given level.
    pub fn logs_at(&self, level: LogLevel) -> Vec<LogRecord> {
        self.logs()
            .into_iter()
            .filter(|r| r.level == level)
            .collect()
    }

    /// Clears collected notifications and logs.
    pub fn clear(&self) {
        Self::lock(&self.notifications).clear();
        Self::lock(&self.logs).clear();
    }

    /// Returns the number of collected notifications.
    pub fn len(&self) -> usize {
        Self::lock(&self.notifications).len()
    }

    /// Returns true if no notifications have been collected.
    pub fn is_empty(&self) -> bool {
        Self::lock(&self.notifications).is_empty()
    }

    fn push(&self, notification: Notification) {
        Self::lock(&self.notifications).push(notification);
    }
}

impl NotificationSink for MockNotificationSink {
    fn data_update(&self, event: DataUpdateEvent) {
        self.push(Notification::DataUpdate(event));
    }

    fn data_error(&self, event: DataErrorEvent) {
        self.push(Notification::DataError(event));
    }

    fn request_error(&self, event: RequestErrorEvent) {
        self.push(Notification::RequestError(event));
    }

    fn client_offline(&self, event: ClientOfflineEvent) {
        self.push(Notification::ClientOffline(event));
    }

    fn log(&self, record: LogRecord) {
        Self::lock(&self.logs).push(record);
    }
}
