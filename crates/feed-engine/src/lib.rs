//! Financial Feed Engine
//!
//! Fetch, cache, retry and refresh orchestration for an embeddable
//! symbol-based financial data feed.
//!
//! # Overview
//!
//! A feed instance is configured with a set of symbols, a request type
//! (realtime or historical), an optional duration and field projection. It:
//! - Serves cached responses immediately and revalidates them when expired
//! - Polls the data service on a fixed refresh cadence
//! - Retries transport failures at a short fixed interval, then escalates
//!   to an offline or request-error notification and cools down
//! - Discards late responses for superseded configurations
//!
//! # Architecture
//!
//! ```text
//!  host lifecycle / config          timers
//!          |                          |
//!          v                          v
//!  +----------------------------------------+
//!  |           FetchOrchestrator            |  (state machine)
//!  +----------------------------------------+
//!      |             |               |
//!      v             v               v
//!  +---------+  +------------+  +-----------+
//!  | Request |  |   Cache    |  | Transport |  (host supplied)
//!  | Builder |  |  Gateway   |  +-----------+
//!  +---------+  +------------+        |
//!                                     v
//!                          +--------------------+
//!                          | ResponseClassifier |
//!                          +--------------------+
//!                                     |
//!                                     v
//!                          +--------------------+
//!                          |  NotificationSink  |  (host supplied)
//!                          +--------------------+
//! ```
//!
//! # Core Types
//!
//! - [`RequestConfig`] - Host supplied request description
//! - [`RequestKey`] - Deterministic identity of a request, also the cache key
//! - [`FetchOutcome`] - Closed set of results delivered to the host
//! - [`FetchOrchestrator`] - The state machine
//! - [`FeedRuntime`] - Runs an orchestrator on a tokio task
//! - [`FeedSettings`] - Timer cadence, TTLs and endpoints

pub mod cache;
pub mod classifier;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod provider;
pub mod request;
pub mod settings;
pub mod sink;

pub use cache::{CacheGateway, CachePolicy, CacheStore, MemoryCacheStore};
pub use classifier::{classify, Classification};
pub use errors::{FeedError, RetryClass, TransportError, ValidationError};
pub use models::{DataTable, FeedType, FetchOutcome, HistoricalDuration, RequestConfig};
pub use orchestrator::{
    Completion, FeedCollaborators, FeedCommand, FeedHandle, FeedRuntime, FetchOrchestrator, Phase,
};
pub use provider::{ConfigProvider, ConnectivityProbe, Transport};
pub use request::{LiveRequest, RequestKey};
pub use settings::{Endpoints, FeedSettings};
pub use sink::{LogRecord, MockNotificationSink, NoOpNotificationSink, NotificationSink};
