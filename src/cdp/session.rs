use anyhow::Result;
use async_trait::async_trait;
use futures_util::{Sink, Stream};
use serde_json::Value;
use std::time::Duration;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

/// Script-execution seam between the orchestrator and the wire protocol.
///
/// Returns the evaluated value as a string, or `None` when the script
/// produced no value (undefined result). Protocol failures surface as errors;
/// everything else is decoded by the caller exactly once.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageSession: Send {
    async fn evaluate(&mut self, script: &str, request_id: u64) -> Result<Option<String>>;
}

/// The real session: one CDP WebSocket plus the configured evaluate timeout.
pub struct CdpSession<S> {
    socket: S,
    timeout: Duration,
}

impl<S> CdpSession<S>
where
    S: Sink<Message, Error = WsError> + Stream<Item = Result<Message, WsError>> + Unpin + Send,
{
    pub fn new(socket: S, timeout: Duration) -> Self {
        Self { socket, timeout }
    }
}

#[async_trait]
impl<S> PageSession for CdpSession<S>
where
    S: Sink<Message, Error = WsError> + Stream<Item = Result<Message, WsError>> + Unpin + Send,
{
    async fn evaluate(&mut self, script: &str, request_id: u64) -> Result<Option<String>> {
        let resp = super::evaluate(&mut self.socket, script, request_id, self.timeout).await?;
        Ok(super::response_value(&resp).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
    }
}
