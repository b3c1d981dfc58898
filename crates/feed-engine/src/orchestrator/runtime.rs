//! Event loop running a [`FetchOrchestrator`] on a tokio task.
//!
//! Host lifecycle signals arrive over an mpsc channel, live requests run as
//! tasks in a `JoinSet`, and the orchestrator's single armed timer is awaited
//! alongside both. Every input is applied to the orchestrator in order on the
//! one task.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use log::{debug, error, info};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{sleep_until, timeout, Duration, Instant};

use crate::errors::TransportError;
use crate::models::RequestConfig;
use crate::provider::Transport;
use crate::request::LiveRequest;

use super::engine::{Completion, FetchOrchestrator};

const COMMAND_BUFFER: usize = 32;

/// Host lifecycle signal.
#[derive(Clone, Debug, PartialEq)]
pub enum FeedCommand {
    Start,
    Resume,
    Suspend,
    ConfigChanged(RequestConfig),
    Teardown,
}

/// The runtime task is gone.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Feed runtime has stopped")]
pub struct RuntimeClosed;

/// Handle to a running feed.
pub struct FeedHandle {
    tx: mpsc::Sender<FeedCommand>,
    task: JoinHandle<()>,
}

impl FeedHandle {
    pub async fn send(&self, command: FeedCommand) -> Result<(), RuntimeClosed> {
        self.tx.send(command).await.map_err(|_| RuntimeClosed)
    }

    pub async fn start(&self) -> Result<(), RuntimeClosed> {
        self.send(FeedCommand::Start).await
    }

    pub async fn resume(&self) -> Result<(), RuntimeClosed> {
        self.send(FeedCommand::Resume).await
    }

    pub async fn suspend(&self) -> Result<(), RuntimeClosed> {
        self.send(FeedCommand::Suspend).await
    }

    pub async fn config_changed(&self, config: RequestConfig) -> Result<(), RuntimeClosed> {
        self.send(FeedCommand::ConfigChanged(config)).await
    }

    /// Stop the feed, aborting in-flight requests, and wait for the task to end.
    pub async fn teardown(self) -> Result<(), RuntimeClosed> {
        let sent = self.send(FeedCommand::Teardown).await;
        self.task.await.map_err(|_| RuntimeClosed)?;
        sent
    }

    pub fn is_closed(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawns feeds onto the current tokio runtime.
pub struct FeedRuntime;

impl FeedRuntime {
    pub fn spawn(orchestrator: FetchOrchestrator, transport: Arc<dyn Transport>) -> FeedHandle {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let task = tokio::spawn(run(orchestrator, transport, rx));
        FeedHandle { tx, task }
    }
}

async fn run(
    mut orchestrator: FetchOrchestrator,
    transport: Arc<dyn Transport>,
    mut rx: mpsc::Receiver<FeedCommand>,
) {
    let request_timeout = orchestrator.settings().request_timeout;
    let mut in_flight: JoinSet<Completion> = JoinSet::new();
    info!("Feed runtime {} started", orchestrator.instance_id());

    loop {
        let deadline = orchestrator.next_deadline();

        tokio::select! {
            command = rx.recv() => {
                let request = match command {
                    Some(FeedCommand::Start) => orchestrator.start().await,
                    Some(FeedCommand::Resume) => orchestrator.resume().await,
                    Some(FeedCommand::Suspend) => {
                        orchestrator.suspend();
                        None
                    }
                    Some(FeedCommand::ConfigChanged(config)) => {
                        orchestrator.config_changed(config).await
                    }
                    Some(FeedCommand::Teardown) | None => break,
                };
                if let Some(request) = request {
                    dispatch(&mut in_flight, &transport, request, request_timeout);
                }
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                match joined {
                    Ok(completion) => orchestrator.on_response(completion).await,
                    Err(e) if e.is_cancelled() => debug!("Transport task cancelled"),
                    Err(e) => error!("Transport task failed: {}", e),
                }
            }
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if let Some(request) = orchestrator.on_timer(Instant::now()).await {
                    dispatch(&mut in_flight, &transport, request, request_timeout);
                }
            }
        }
    }

    in_flight.abort_all();
    orchestrator.teardown();
    debug!("Feed runtime stopped");
}

fn dispatch(
    in_flight: &mut JoinSet<Completion>,
    transport: &Arc<dyn Transport>,
    request: LiveRequest,
    request_timeout: Duration,
) {
    let transport = Arc::clone(transport);
    in_flight.spawn(async move {
        let fetch = AssertUnwindSafe(transport.fetch(&request)).catch_unwind();
        let result = match timeout(request_timeout, fetch).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(TransportError::LoadFailed(
                "transport panicked".to_string(),
            )),
            Err(_) => Err(TransportError::Timeout),
        };
        Completion::new(&request, result)
    });
}
