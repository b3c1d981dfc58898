//! Mutable per-instance state of the orchestrator.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::models::FetchOutcome;
use crate::request::{CallbackToken, RequestKey};

/// Lifecycle phase of one feed instance.
///
/// There is no separate idle phase: an instance is active as soon as it is
/// constructed, so it starts out in `AwaitingFirstStart`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// Created, configuration changes are recorded but nothing is fetched.
    AwaitingFirstStart,
    /// Started.
    Active(ActivePhase),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivePhase {
    /// A live request is in flight.
    Fetching,
    /// Waiting for the next periodic refresh.
    WaitingRefresh,
    /// Waiting to retry a failed live request.
    WaitingRetry,
    /// Waiting out the cooldown after the retry budget ran out.
    Cooldown,
    /// Presentation hidden; no new requests are issued.
    Suspended,
}

/// Why a timer was armed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerReason {
    Refresh,
    Retry,
    Cooldown,
}

/// An armed timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timer {
    pub reason: TimerReason,
    pub delay: Duration,
    pub deadline: Instant,
}

impl Timer {
    fn new(reason: TimerReason, delay: Duration) -> Self {
        Self {
            reason,
            delay,
            deadline: Instant::now() + delay,
        }
    }
}

/// The live request whose response is still awaited.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PendingRequest {
    pub token: CallbackToken,
    pub key: RequestKey,
    pub symbols: Vec<String>,
}

/// State owned by a single [`FetchOrchestrator`](super::FetchOrchestrator).
///
/// The refresh slot also carries the cooldown. Arming either slot clears the
/// other, so at most one timer is pending at any time.
#[derive(Debug)]
pub(crate) struct OrchestratorState {
    pub initial_started: bool,
    pub retry_count: u8,
    pub in_flight_cached_fallback: Option<FetchOutcome>,
    pub last_issued_key: Option<RequestKey>,
    pub pending: Option<PendingRequest>,
    pub user_config_changed: bool,
    pub presentation_visible: bool,
    pub last_known: Option<(RequestKey, FetchOutcome)>,
    refresh_timer: Option<Timer>,
    retry_timer: Option<Timer>,
}

impl Default for OrchestratorState {
    fn default() -> Self {
        Self {
            initial_started: false,
            retry_count: 0,
            in_flight_cached_fallback: None,
            last_issued_key: None,
            pending: None,
            user_config_changed: false,
            presentation_visible: true,
            last_known: None,
            refresh_timer: None,
            retry_timer: None,
        }
    }
}

impl OrchestratorState {
    /// Arm the refresh slot (refresh or cooldown), superseding any retry.
    pub fn arm_refresh(&mut self, reason: TimerReason, delay: Duration) {
        self.retry_timer = None;
        self.refresh_timer = Some(Timer::new(reason, delay));
    }

    /// Arm the retry slot, superseding any refresh.
    pub fn arm_retry(&mut self, delay: Duration) {
        self.refresh_timer = None;
        self.retry_timer = Some(Timer::new(TimerReason::Retry, delay));
    }

    pub fn cancel_retry(&mut self) {
        self.retry_timer = None;
    }

    pub fn cancel_timers(&mut self) {
        self.refresh_timer = None;
        self.retry_timer = None;
    }

    pub fn armed_timer(&self) -> Option<&Timer> {
        self.retry_timer.as_ref().or(self.refresh_timer.as_ref())
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.armed_timer().map(|t| t.deadline)
    }

    /// Remove and return the armed timer if it is due at `now`.
    pub fn take_due(&mut self, now: Instant) -> Option<Timer> {
        if self.retry_timer.is_some_and(|t| t.deadline <= now) {
            return self.retry_timer.take();
        }
        if self.refresh_timer.is_some_and(|t| t.deadline <= now) {
            return self.refresh_timer.take();
        }
        None
    }

    /// Whether `token` belongs to the request currently awaited.
    pub fn is_pending(&self, token: &CallbackToken) -> bool {
        self.pending.as_ref().is_some_and(|p| &p.token == token)
    }

    pub fn phase(&self) -> Phase {
        if !self.initial_started {
            return Phase::AwaitingFirstStart;
        }
        let active = if !self.presentation_visible {
            ActivePhase::Suspended
        } else if self.pending.is_some() {
            ActivePhase::Fetching
        } else {
            match self.armed_timer().map(|t| t.reason) {
                Some(TimerReason::Retry) => ActivePhase::WaitingRetry,
                Some(TimerReason::Cooldown) => ActivePhase::Cooldown,
                Some(TimerReason::Refresh) | None => ActivePhase::WaitingRefresh,
            }
        };
        Phase::Active(active)
    }
}
