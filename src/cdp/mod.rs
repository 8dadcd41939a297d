use anyhow::{Context, Result};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use crate::ExtractError;

pub mod session;

pub use session::{CdpSession, PageSession};

/// One open page context inside the browser.
#[derive(Debug, Clone, Deserialize)]
pub struct PageTarget {
    pub id: String,
    #[serde(rename = "webSocketDebuggerUrl")]
    pub web_socket_debugger_url: String,
}

/// Client for the CDP HTTP control API (target creation/closing, health probe).
pub struct CdpClient {
    http: reqwest::Client,
    base_url: String,
}

impl CdpClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// Open a new tab at `url` and return its target info.
    ///
    /// Newer Chrome requires PUT for /json/new; older versions only accept
    /// GET and answer 405 to PUT, so fall back before giving up.
    pub async fn open_target(&self, url: &str) -> Result<PageTarget> {
        let endpoint = format!("{}/json/new?{}", self.base_url, urlencoding::encode(url));

        let mut resp = self
            .http
            .put(&endpoint)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .context("Failed to reach CDP endpoint")?;

        if resp.status() == reqwest::StatusCode::METHOD_NOT_ALLOWED {
            resp = self
                .http
                .get(&endpoint)
                .timeout(Duration::from_secs(10))
                .send()
                .await
                .context("Failed to reach CDP endpoint")?;
        }

        let target = resp
            .error_for_status()
            .context("CDP refused to open a new target")?
            .json::<PageTarget>()
            .await
            .context("Failed to decode target info")?;

        Ok(target)
    }

    /// Close a tab by target id. Best effort; tab cleanup is not safety-critical.
    pub async fn close_target(&self, target_id: &str) {
        let endpoint = format!("{}/json/close/{}", self.base_url, target_id);
        let result = self
            .http
            .get(&endpoint)
            .timeout(Duration::from_secs(5))
            .send()
            .await;
        if let Err(e) = result {
            tracing::debug!("Failed to close tab {}: {}", target_id, e);
        }
    }

    /// Probe /json/version; true once the browser's CDP endpoint answers.
    pub async fn version_ready(&self) -> bool {
        let endpoint = format!("{}/json/version", self.base_url);
        match self
            .http
            .get(&endpoint)
            .timeout(Duration::from_secs(2))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Connect the per-target WebSocket used for script evaluation.
    pub async fn connect(
        &self,
        target: &PageTarget,
    ) -> Result<
        tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
    > {
        let (socket, _) = tokio_tungstenite::connect_async(target.web_socket_debugger_url.as_str())
            .await
            .context("Failed to connect to target WebSocket")?;
        Ok(socket)
    }
}

/// Send a script for evaluation and wait for the response bearing `request_id`.
///
/// The socket carries unsolicited protocol events interleaved with responses,
/// so messages with a different (or missing) id are discarded until the
/// matching one arrives or the deadline passes.
pub async fn evaluate<S>(
    socket: &mut S,
    script: &str,
    request_id: u64,
    timeout: Duration,
) -> Result<Value>
where
    S: Sink<Message, Error = WsError> + Stream<Item = Result<Message, WsError>> + Unpin,
{
    let payload = json!({
        "id": request_id,
        "method": "Runtime.evaluate",
        "params": {
            "expression": script,
            "returnByValue": true,
            "awaitPromise": true,
        }
    });

    socket
        .send(Message::Text(payload.to_string()))
        .await
        .context("Failed to send evaluate request")?;

    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }

        let msg = match tokio::time::timeout(remaining, socket.next()).await {
            Err(_) => break,
            Ok(None) => return Err(ExtractError::SocketClosed.into()),
            Ok(Some(Err(e))) => return Err(e).context("CDP socket read failed"),
            Ok(Some(Ok(msg))) => msg,
        };

        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => return Err(ExtractError::SocketClosed.into()),
            _ => continue,
        };

        let data: Value = match serde_json::from_str(&text) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!("Discarding unparseable CDP message: {}", e);
                continue;
            }
        };

        if data.get("id").and_then(Value::as_u64) == Some(request_id) {
            return Ok(data);
        }
    }

    Err(ExtractError::EvaluateTimeout {
        request_id,
        timeout: timeout.as_secs(),
    }
    .into())
}

/// Pull the evaluated value out of a Runtime.evaluate response.
pub fn response_value(resp: &Value) -> Option<&Value> {
    resp.get("result")?.get("result")?.get("value")
}
