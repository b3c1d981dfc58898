//! Orchestration of fetch cycles.
//!
//! [`FetchOrchestrator`] is the state machine; [`FeedRuntime`] drives it on a
//! tokio task for hosts that do not run their own event loop.

mod engine;
mod runtime;
mod state;


pub use engine::{Completion, FeedCollaborators, FetchOrchestrator};
pub use runtime::{FeedCommand, FeedHandle, FeedRuntime, RuntimeClosed};
pub use state::{ActivePhase, Phase, Timer, TimerReason};
