//! Collaborator trait definitions.
//!
//! The engine does not perform I/O itself. Hosts implement these traits to
//! plug in the request transport, the connectivity check and the display
//! identity source.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::TransportError;
use crate::request::LiveRequest;

/// Issues live requests to the data service.
///
/// Given the request URL and callback token, the transport eventually yields
/// the array of parsed objects the service responded with, or a load failure.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use finfeed_engine::provider::Transport;
///
/// struct ScriptTransport {
///     client: MyHttpClient,
/// }
///
/// #[async_trait]
/// impl Transport for ScriptTransport {
///     async fn fetch(&self, request: &LiveRequest) -> Result<Vec<Value>, TransportError> {
///         let body = self.client.get(&request.url).await
///             .map_err(|e| TransportError::LoadFailed(e.to_string()))?;
///         unwrap_callback(&body, request.token.as_str())
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, request: &LiveRequest) -> Result<Vec<Value>, TransportError>;
}

/// Decides between "offline" and "request error" once retries are exhausted.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_offline(&self) -> bool;
}

/// Source of the display identity requests are made for.
pub trait ConfigProvider: Send + Sync {
    /// The display id, or `None` to keep the one in the request configuration.
    fn display_id(&self) -> Option<String>;
}

/// Fixed display identity.
#[derive(Clone, Debug, Default)]
pub struct StaticConfigProvider {
    display_id: Option<String>,
}

impl StaticConfigProvider {
    pub fn new(display_id: impl Into<String>) -> Self {
        Self {
            display_id: Some(display_id.into()),
        }
    }

    /// Provider that never overrides the configured display id.
    pub fn none() -> Self {
        Self::default()
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn display_id(&self) -> Option<String> {
        self.display_id.clone()
    }
}

/// Probe with a fixed answer.
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticConnectivity {
    pub offline: bool,
}

#[async_trait]
impl ConnectivityProbe for StaticConnectivity {
    async fn is_offline(&self) -> bool {
        self.offline
    }
}
