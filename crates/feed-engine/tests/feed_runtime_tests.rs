//! Integration tests for the feed runtime.
//!
//! These run the orchestrator on its tokio task with a paused clock, so timer
//! driven behavior (refresh cadence, retry interval, cooldown, request
//! timeout) is exercised without waiting in real time.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use finfeed_engine::cache::{CachePolicy, CacheStore, CachedEntry, StoredResponse};
use finfeed_engine::errors::CacheStoreError;
use finfeed_engine::provider::{StaticConfigProvider, StaticConnectivity};
use finfeed_engine::sink::Notification;
use finfeed_engine::{
    FeedCollaborators, FeedHandle, FeedRuntime, FeedSettings, FetchOrchestrator, LiveRequest,
    MockNotificationSink, RequestConfig, Transport, TransportError,
};
use serde_json::{json, Value};

// =============================================================================
// Test doubles
// =============================================================================

enum Script {
    Respond(Result<Vec<Value>, TransportError>),
    Hang,
}

#[derive(Default)]
struct ScriptedTransport {
    script: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<LiveRequest>>,
}

impl ScriptedTransport {
    fn new(script: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.url.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn fetch(&self, request: &LiveRequest) -> Result<Vec<Value>, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Script::Respond(result)) => result,
            Some(Script::Hang) => std::future::pending().await,
            None => Err(TransportError::LoadFailed("nothing scripted".to_string())),
        }
    }
}

/// Store that never has an entry, so every cycle goes to the transport.
struct NullCacheStore;

#[async_trait]
impl CacheStore for NullCacheStore {
    async fn configure(&self, _policy: &CachePolicy) -> Result<(), CacheStoreError> {
        Ok(())
    }

    async fn get(&self, _key: &str) -> Result<Option<CachedEntry>, CacheStoreError> {
        Ok(None)
    }

    async fn put(&self, _key: &str, _response: StoredResponse) -> Result<(), CacheStoreError> {
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn table(price: f64) -> Script {
    Script::Respond(Ok(vec![json!({
        "status": "ok",
        "table": {
            "cols": [{ "id": "lastPrice", "label": "Last Price", "type": "number" }],
            "rows": [{ "c": [{ "v": price }] }]
        }
    })]))
}

fn failure() -> Script {
    Script::Respond(Err(TransportError::LoadFailed("script error".to_string())))
}

fn spawn_feed(
    config: RequestConfig,
    transport: Arc<ScriptedTransport>,
) -> (FeedHandle, MockNotificationSink) {
    let sink = MockNotificationSink::new();
    let orchestrator = FetchOrchestrator::new(
        FeedSettings::default(),
        config,
        FeedCollaborators {
            cache_store: Arc::new(NullCacheStore),
            sink: Arc::new(sink.clone()),
            probe: Arc::new(StaticConnectivity { offline: false }),
            config_provider: Arc::new(StaticConfigProvider::none()),
        },
    )
    .unwrap();
    (FeedRuntime::spawn(orchestrator, transport), sink)
}

/// Let every ready task run. The paused clock only auto-advances once the
/// runtime is idle, so this barely moves time.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_start_fetches_and_polls_on_refresh_interval() {
    let transport = ScriptedTransport::new(vec![table(1.0), table(2.0)]);
    let (handle, sink) = spawn_feed(RequestConfig::realtime("AA.N|MSFT"), transport.clone());

    handle.start().await.unwrap();
    settle().await;

    assert_eq!(transport.request_count(), 1);
    assert!(transport.urls()[0].contains("code=AA.N%7CMSFT"));
    let updates = sink.data_updates();
    assert_eq!(updates.len(), 1);
    assert!(!updates[0].cached);

    tokio::time::sleep(Duration::from_secs(59)).await;
    assert_eq!(transport.request_count(), 1);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(transport.request_count(), 2);
    assert_eq!(sink.data_updates().len(), 2);

    handle.teardown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_config_change_before_start_does_not_fetch() {
    let transport = ScriptedTransport::new(vec![table(1.0)]);
    let (handle, sink) = spawn_feed(RequestConfig::default(), transport.clone());

    handle
        .config_changed(RequestConfig::realtime("MSFT"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(120)).await;

    assert_eq!(transport.request_count(), 0);
    assert!(sink.is_empty());

    handle.start().await.unwrap();
    settle().await;
    assert_eq!(transport.request_count(), 1);

    handle.teardown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_failure_burst_retries_then_cools_down() {
    let transport = ScriptedTransport::new((0..6).map(|_| failure()).collect());
    let (handle, sink) = spawn_feed(RequestConfig::realtime("MSFT"), transport.clone());

    handle.start().await.unwrap();
    settle().await;
    assert_eq!(transport.request_count(), 1);

    // Retries every 5 seconds.
    tokio::time::sleep(Duration::from_secs(21)).await;
    assert_eq!(transport.request_count(), 5);

    let notifications = sink.notifications();
    assert_eq!(notifications.len(), 1);
    assert!(matches!(notifications[0], Notification::RequestError(_)));

    // Nothing during the cooldown.
    tokio::time::sleep(Duration::from_secs(590)).await;
    assert_eq!(transport.request_count(), 5);

    tokio::time::sleep(Duration::from_secs(15)).await;
    assert_eq!(transport.request_count(), 6);

    handle.teardown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_hanging_request_times_out_and_retries() {
    let transport = ScriptedTransport::new(vec![Script::Hang, table(1.0)]);
    let (handle, sink) = spawn_feed(RequestConfig::realtime("MSFT"), transport.clone());

    handle.start().await.unwrap();
    settle().await;
    assert_eq!(transport.request_count(), 1);

    // 30 second request timeout, then the 5 second retry interval.
    tokio::time::sleep(Duration::from_secs(36)).await;
    assert_eq!(transport.request_count(), 2);
    assert_eq!(sink.data_updates().len(), 1);

    handle.teardown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_suspended_feed_does_not_poll() {
    let transport = ScriptedTransport::new(vec![table(1.0), table(2.0)]);
    let (handle, sink) = spawn_feed(RequestConfig::realtime("MSFT"), transport.clone());

    handle.start().await.unwrap();
    settle().await;
    handle.suspend().await.unwrap();

    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(transport.request_count(), 1);

    handle.resume().await.unwrap();
    settle().await;
    assert_eq!(transport.request_count(), 2);
    assert_eq!(sink.data_updates().len(), 2);

    handle.teardown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_teardown_aborts_in_flight_request() {
    let transport = ScriptedTransport::new(vec![Script::Hang]);
    let (handle, sink) = spawn_feed(RequestConfig::realtime("MSFT"), transport.clone());

    handle.start().await.unwrap();
    settle().await;

    handle.teardown().await.unwrap();
    assert!(sink.is_empty());
    assert_eq!(transport.request_count(), 1);
}
