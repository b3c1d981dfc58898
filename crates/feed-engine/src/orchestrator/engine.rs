//! The fetch/cache/retry/refresh state machine.

use std::sync::Arc;

use log::{debug, info, warn};
use serde_json::{json, Value};
use tokio::time::Instant;
use uuid::Uuid;

use crate::cache::{CacheGateway, CachePolicy, CacheStore, Validity};
use crate::classifier::{classify, scan_for_embedded_status_codes, Sentinel, SentinelLogLimiter};
use crate::errors::{FeedError, RetryClass, TransportError, ValidationError};
use crate::models::{DataTable, FetchOutcome, RequestConfig};
use crate::provider::{ConfigProvider, ConnectivityProbe};
use crate::request::{build_url, validate, CallbackToken, LiveRequest, RequestKey};
use crate::settings::FeedSettings;
use crate::sink::{LogLevel, LogRecord, NotificationSink, RateLimit};

use super::state::{OrchestratorState, PendingRequest, Phase, Timer, TimerReason};

const OFFLINE_MESSAGE: &str = "Client is offline";

/// Everything the orchestrator talks to.
#[derive(Clone)]
pub struct FeedCollaborators {
    pub cache_store: Arc<dyn CacheStore>,
    pub sink: Arc<dyn NotificationSink>,
    pub probe: Arc<dyn ConnectivityProbe>,
    pub config_provider: Arc<dyn ConfigProvider>,
}

/// A finished live request, as reported back by the transport.
#[derive(Clone, Debug, PartialEq)]
pub struct Completion {
    pub token: CallbackToken,
    pub key: RequestKey,
    pub result: Result<Vec<Value>, TransportError>,
}

impl Completion {
    pub fn new(request: &LiveRequest, result: Result<Vec<Value>, TransportError>) -> Self {
        Self {
            token: request.token.clone(),
            key: request.key.clone(),
            result,
        }
    }
}

/// Drives one feed instance.
///
/// All inputs are sequential method calls: host lifecycle signals, timer
/// expiry and transport completions. Methods that may start a live request
/// return it; the caller hands it to the transport and reports the result
/// through [`on_response`](Self::on_response).
pub struct FetchOrchestrator {
    settings: FeedSettings,
    instance_id: Uuid,
    config: RequestConfig,
    display_id: Option<String>,
    cache: CacheGateway,
    sink: Arc<dyn NotificationSink>,
    probe: Arc<dyn ConnectivityProbe>,
    config_provider: Arc<dyn ConfigProvider>,
    sentinel_limiter: SentinelLogLimiter,
    state: OrchestratorState,
}

impl FetchOrchestrator {
    pub fn new(
        settings: FeedSettings,
        config: RequestConfig,
        collaborators: FeedCollaborators,
    ) -> Result<Self, FeedError> {
        settings.validate()?;

        let instance_id = Uuid::new_v4();
        debug!("Feed instance {} created", instance_id);

        Ok(Self {
            sentinel_limiter: SentinelLogLimiter::new(settings.sentinel_log_window),
            settings,
            instance_id,
            config,
            display_id: None,
            cache: CacheGateway::new(collaborators.cache_store),
            sink: collaborators.sink,
            probe: collaborators.probe,
            config_provider: collaborators.config_provider,
            state: OrchestratorState::default(),
        })
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn retry_count(&self) -> u8 {
        self.state.retry_count
    }

    pub fn armed_timer(&self) -> Option<&Timer> {
        self.state.armed_timer()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.state.next_deadline()
    }

    pub fn last_issued_key(&self) -> Option<&RequestKey> {
        self.state.last_issued_key.as_ref()
    }

    pub fn cache_policy(&self) -> &CachePolicy {
        self.cache.policy()
    }

    /// First explicit start. Later calls are ignored.
    pub async fn start(&mut self) -> Option<LiveRequest> {
        if self.state.initial_started {
            debug!("Feed {} already started", self.instance_id);
            return None;
        }
        self.state.initial_started = true;
        self.display_id = self.config_provider.display_id();
        info!(
            "Feed {} started (display {})",
            self.instance_id,
            self.effective_config().display_id
        );

        self.configure_cache().await;
        if !self.state.presentation_visible {
            debug!("Started while suspended, fetching on resume");
            return None;
        }
        self.issue_fetch().await
    }

    /// A new configuration from the host.
    ///
    /// Before the first start the configuration is only recorded.
    pub async fn config_changed(&mut self, config: RequestConfig) -> Option<LiveRequest> {
        self.config = config;
        if !self.state.initial_started {
            debug!("Configuration recorded before start, not fetching");
            return None;
        }

        self.state.user_config_changed = true;
        self.state.cancel_timers();
        self.state.retry_count = 0;
        self.state.in_flight_cached_fallback = None;
        self.state.pending = None;
        self.configure_cache().await;

        if !self.state.presentation_visible {
            debug!("Configuration changed while suspended, fetching on resume");
            return None;
        }
        self.issue_fetch().await
    }

    /// Presentation hidden: stop issuing requests and drop any pending retry.
    pub fn suspend(&mut self) {
        if !self.state.presentation_visible {
            return;
        }
        self.state.presentation_visible = false;
        self.state.cancel_retry();
        self.state.retry_count = 0;
        debug!("Feed {} suspended", self.instance_id);
    }

    /// Presentation visible again: fetch right away unless a request is in flight.
    pub async fn resume(&mut self) -> Option<LiveRequest> {
        if self.state.presentation_visible {
            return None;
        }
        self.state.presentation_visible = true;
        debug!("Feed {} resumed", self.instance_id);

        if !self.state.initial_started || self.state.pending.is_some() {
            return None;
        }
        self.state.cancel_timers();
        self.issue_fetch().await
    }

    /// Fire the armed timer if it is due at `now`.
    pub async fn on_timer(&mut self, now: Instant) -> Option<LiveRequest> {
        let timer = self.state.take_due(now)?;
        if !self.state.presentation_visible {
            debug!("{:?} timer fired while suspended, skipping", timer.reason);
            return None;
        }
        debug!("{:?} timer fired after {:?}", timer.reason, timer.delay);
        self.issue_fetch().await
    }

    /// Result of a live request.
    ///
    /// Responses for anything but the request currently awaited are dropped.
    pub async fn on_response(&mut self, completion: Completion) {
        if !self.state.is_pending(&completion.token) {
            debug!(
                "Discarding stale response for {} ({})",
                completion.key, completion.token
            );
            return;
        }
        let Some(pending) = self.state.pending.take() else {
            return;
        };

        match completion.result {
            Ok(payload) => self.handle_live_payload(pending, payload).await,
            Err(e) => self.handle_failure(FeedError::from(e)).await,
        }
    }

    /// Cancel all timers and drop the instance.
    pub fn teardown(mut self) {
        self.state.cancel_timers();
        if let Some(pending) = self.state.pending.take() {
            debug!("Abandoning in-flight request for {}", pending.key);
        }
        info!("Feed {} torn down", self.instance_id);
    }

    fn effective_config(&self) -> RequestConfig {
        let mut config = self.config.clone();
        if let Some(display_id) = &self.display_id {
            config.display_id = display_id.clone();
        }
        config
    }

    async fn configure_cache(&mut self) {
        let policy = CachePolicy::for_request(&self.config, &self.settings);
        self.cache.configure(policy).await;
    }

    /// One fetch cycle: validate, consult the cache, and build the live request if needed.
    async fn issue_fetch(&mut self) -> Option<LiveRequest> {
        let validated = match validate(&self.effective_config()) {
            Ok(validated) => validated,
            Err(e) => {
                self.handle_failure(FeedError::from(e)).await;
                return None;
            }
        };
        let key = RequestKey::build(&validated);
        self.state.last_issued_key = Some(key.clone());
        self.state.in_flight_cached_fallback = None;

        let mut fallback = None;
        match self.cache.try_get(&key).await {
            Some(entry) => match classify(&entry.payload).into_outcome(true, false) {
                Ok(outcome) => {
                    self.remember(&key, &outcome);
                    if entry.validity == Validity::Valid {
                        self.log(LogRecord::info(
                            "cache-hit",
                            json!({ "key": key.as_str(), "capturedAt": entry.captured_at }),
                        ));
                        self.state.retry_count = 0;
                        self.emit(outcome);
                        self.state
                            .arm_refresh(TimerReason::Refresh, self.settings.refresh_interval);
                        return None;
                    }
                    if self.state.retry_count == 0 {
                        debug!("Serving expired entry for {} while revalidating", key);
                        self.emit(outcome);
                    } else {
                        debug!("Expired entry for {} already served in this burst", key);
                    }
                }
                Err(e) => {
                    warn!("Cached entry for {} unusable: {}", key, e);
                    fallback = self.last_known_for(&key);
                }
            },
            None => fallback = self.last_known_for(&key),
        }
        self.state.in_flight_cached_fallback = fallback;

        let token = CallbackToken::generate(&self.instance_id);
        let url = build_url(&validated, &token, &self.settings.endpoints);
        self.state.cancel_timers();
        self.state.pending = Some(PendingRequest {
            token: token.clone(),
            key: key.clone(),
            symbols: validated.symbols,
        });
        debug!("Issuing live request for {}", key);

        Some(LiveRequest { key, url, token })
    }

    async fn handle_live_payload(&mut self, pending: PendingRequest, payload: Vec<Value>) {
        self.state.retry_count = 0;

        let outcome = match classify(&payload).into_outcome(false, false) {
            Ok(outcome) => outcome,
            Err(e) => return self.handle_failure(e).await,
        };

        match &outcome {
            FetchOutcome::DataError { code, message, .. } => {
                self.handle_failure(FeedError::PayloadData {
                    code: code.clone(),
                    message: message.clone(),
                })
                .await;
            }
            FetchOutcome::DataUpdate { table, .. } => {
                self.log(LogRecord::info(
                    "data-update",
                    json!({ "key": pending.key.as_str(), "rows": table.rows.len() }),
                ));
                self.report_sentinels(table, &pending.symbols).await;
            }
            FetchOutcome::RequestFailure { .. } | FetchOutcome::EmptyData { .. } => {}
        }

        self.cache.put(&pending.key, payload, &outcome).await;
        self.remember(&pending.key, &outcome);
        self.state.in_flight_cached_fallback = None;
        self.emit(outcome);
        self.state
            .arm_refresh(TimerReason::Refresh, self.settings.refresh_interval);
    }

    /// Dispatch on the failure class.
    ///
    /// Data errors and sentinels are only recorded here; the caller still
    /// caches and emits the outcome they came with.
    async fn handle_failure(&mut self, error: FeedError) {
        match error.retry_class() {
            RetryClass::WaitForRefresh => {
                if let FeedError::Validation(e) = &error {
                    self.report_invalid_request(e);
                }
                self.emit(FetchOutcome::EmptyData {
                    user_config_changed: false,
                });
                self.state
                    .arm_refresh(TimerReason::Refresh, self.settings.refresh_interval);
            }
            RetryClass::RetryWithBackoff => self.handle_transport_failure(error).await,
            RetryClass::FallThrough => {
                self.log(LogRecord::warning(
                    "malformed-response",
                    json!({ "error": error.to_string() }),
                ));
                let outcome = self
                    .state
                    .in_flight_cached_fallback
                    .take()
                    .unwrap_or(FetchOutcome::EmptyData {
                        user_config_changed: false,
                    });
                self.emit(outcome);
                self.state
                    .arm_refresh(TimerReason::Refresh, self.settings.refresh_interval);
            }
            RetryClass::SurfaceImmediately => self.report_data_error(&error),
            RetryClass::LogOnly => self.report_embedded_status(&error),
        }
    }

    async fn handle_transport_failure(&mut self, error: FeedError) {
        warn!(
            "Live request failed (attempt {}): {}",
            self.state.retry_count + 1,
            error
        );

        if self.state.retry_count == 0 {
            if let Some(fallback) = self.state.in_flight_cached_fallback.take() {
                debug!("Bridging failure with last known data");
                self.emit(fallback);
            }
        }

        if !self.state.presentation_visible {
            self.state.retry_count = 0;
            return;
        }

        self.state.retry_count += 1;
        if self.state.retry_count < self.settings.max_retries {
            self.state.arm_retry(self.settings.retry_interval);
            return;
        }

        self.state.retry_count = 0;
        let offline = self.probe.is_offline().await;
        let (event, message) = if offline {
            ("client-offline", OFFLINE_MESSAGE.to_string())
        } else {
            (
                "request-error",
                format!(
                    "Request failed after {} attempts: {}",
                    self.settings.max_retries, error
                ),
            )
        };
        self.log(LogRecord::error(
            event,
            json!({
                "key": self.state.last_issued_key.as_ref().map(RequestKey::as_str),
                "message": message,
            }),
        ));
        self.emit(FetchOutcome::RequestFailure { message, offline });
        self.state
            .arm_refresh(TimerReason::Cooldown, self.settings.cooldown_interval);
    }

    fn report_invalid_request(&self, error: &ValidationError) {
        if error.is_silent() {
            return;
        }
        self.log(
            LogRecord::error(
                "invalid-request",
                json!({
                    "message": error.to_string(),
                    "symbols": self.config.symbols,
                    "type": self.config.kind,
                    "duration": self.config.duration,
                }),
            )
            .with_error_code(error.code()),
        );
    }

    fn report_data_error(&self, error: &FeedError) {
        let FeedError::PayloadData { code, message } = error else {
            return;
        };
        self.log(
            LogRecord::error(
                "data-error",
                json!({
                    "key": self.state.last_issued_key.as_ref().map(RequestKey::as_str),
                    "message": error.to_string(),
                    "detail": message,
                }),
            )
            .with_error_code(code.as_str()),
        );
    }

    async fn report_sentinels(&mut self, table: &DataTable, symbols: &[String]) {
        let now = Instant::now();
        for status in scan_for_embedded_status_codes(table, symbols) {
            if !self.sentinel_limiter.should_log(status.sentinel, now) {
                continue;
            }
            self.handle_failure(FeedError::EmbeddedSentinel {
                code: status.code().to_string(),
                symbols: status.symbols,
            })
            .await;
        }
    }

    fn report_embedded_status(&self, error: &FeedError) {
        let FeedError::EmbeddedSentinel { code, symbols } = error else {
            return;
        };
        let sentinel = Sentinel::from_value(code);
        self.log(
            LogRecord::new(
                sentinel.map_or(LogLevel::Error, |s| s.severity()),
                "embedded-status",
                json!({
                    "message": sentinel.map(|s| s.message()),
                    "symbols": symbols,
                    "error": error.to_string(),
                }),
            )
            .with_error_code(code.as_str())
            .with_rate_limit(RateLimit::OncePerDay),
        );
    }

    fn last_known_for(&self, key: &RequestKey) -> Option<FetchOutcome> {
        self.state
            .last_known
            .as_ref()
            .filter(|(known, _)| known == key)
            .map(|(_, outcome)| outcome.clone())
    }

    fn remember(&mut self, key: &RequestKey, outcome: &FetchOutcome) {
        self.state.last_known = Some((key.clone(), outcome.clone().into_cached()));
    }

    /// Deliver an outcome, attaching and clearing the config-change marker.
    fn emit(&mut self, outcome: FetchOutcome) {
        let outcome = if outcome.carries_config_marker() {
            let changed = std::mem::take(&mut self.state.user_config_changed);
            outcome.with_user_config_changed(changed)
        } else {
            outcome
        };
        debug!("Emitting {:?}", outcome);
        self.sink.deliver(outcome);
    }

    fn log(&self, record: LogRecord) {
        log::log!(
            record.level.as_log_level(),
            "[{}] {}{}",
            record.event,
            record
                .error_code
                .as_deref()
                .map(|c| format!("{} ", c))
                .unwrap_or_default(),
            record.details
        );
        self.sink.log(record);
    }
}
