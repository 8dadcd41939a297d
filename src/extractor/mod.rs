use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::browser::BrowserManager;
use crate::cdp::{CdpClient, CdpSession, PageSession, PageTarget};
use crate::config::{Config, Timing};
use crate::lock::ProfileLock;
use crate::resolver::VideoId;
use crate::ExtractError;

pub mod scripts;

const NO_TRANSCRIPT_ERROR: &str = "No transcript found. Video may not have captions.";

/// Which strategy produced the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    Dom,
    Api,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::Dom => "dom",
            ExtractionMethod::Api => "api",
        }
    }
}

/// Outcome of one extraction call.
///
/// `success` is true exactly when `transcript` is non-empty and `error` is
/// empty; on every return exactly one of the two is populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub success: bool,
    pub video_id: String,
    pub title: String,
    pub channel: String,
    pub url: String,
    pub transcript: String,
    pub language: String,
    /// Absent until a strategy succeeds; carried as an empty string on the
    /// wire so JSON consumers always see a string-valued field.
    #[serde(with = "method_string")]
    pub method: Option<ExtractionMethod>,
    pub error: String,
}

mod method_string {
    use super::ExtractionMethod;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        method: &Option<ExtractionMethod>,
        ser: S,
    ) -> Result<S::Ok, S::Error> {
        ser.serialize_str(method.map(|m| m.as_str()).unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        de: D,
    ) -> Result<Option<ExtractionMethod>, D::Error> {
        match String::deserialize(de)?.as_str() {
            "" => Ok(None),
            "dom" => Ok(Some(ExtractionMethod::Dom)),
            "api" => Ok(Some(ExtractionMethod::Api)),
            other => Err(serde::de::Error::unknown_variant(other, &["dom", "api"])),
        }
    }
}

impl ExtractionResult {
    fn success(
        video_id: String,
        url: String,
        meta: Metadata,
        transcript: String,
        method: ExtractionMethod,
    ) -> Self {
        Self {
            success: true,
            video_id,
            title: meta.title,
            channel: meta.channel,
            url,
            transcript,
            language: meta.language,
            method: Some(method),
            error: String::new(),
        }
    }

    fn failure(video_id: String, url: String, meta: Metadata, error: String) -> Self {
        Self {
            success: false,
            video_id,
            title: meta.title,
            channel: meta.channel,
            url,
            transcript: String::new(),
            language: meta.language,
            method: None,
            error,
        }
    }
}

/// Video metadata read from the page's embedded player response.
/// Absence of any field, or the whole object, is never fatal.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub title: String,
    pub channel: String,
    pub language: String,
}

/// Tagged value returned by the DOM and API strategy scripts.
#[derive(Debug, Deserialize)]
struct StrategyResult {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// The state machine coordinating page readiness, metadata retrieval, and
/// the two extraction strategies with fallback.
pub struct TranscriptExtractor {
    config: Config,
}

impl TranscriptExtractor {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Open the video in a fresh Chrome instance, extract the transcript,
    /// and tear everything down regardless of outcome.
    ///
    /// All failures are captured into the returned `ExtractionResult`;
    /// nothing escapes to the caller.
    pub async fn extract(&self, input: &str) -> ExtractionResult {
        // Input errors fail fast, before any browser interaction
        let video_id = match VideoId::parse(input) {
            Ok(id) => id,
            Err(e) => {
                return ExtractionResult::failure(
                    String::new(),
                    String::new(),
                    Metadata::default(),
                    e.to_string(),
                )
            }
        };
        let canonical_url = video_id.canonical_url();

        // One extraction at a time across the whole machine
        let guard = match ProfileLock::acquire(&self.config.lock_path).await {
            Ok(guard) => guard,
            Err(e) => {
                return ExtractionResult::failure(
                    video_id.to_string(),
                    canonical_url,
                    Metadata::default(),
                    e.to_string(),
                )
            }
        };

        let cdp = CdpClient::new(self.config.base_url());
        let mut browser = BrowserManager::new(self.config.clone());
        let mut target: Option<PageTarget> = None;

        let outcome = self
            .drive(&cdp, &mut browser, &mut target, &canonical_url)
            .await;

        // Teardown runs on every exit path
        if let Some(target) = &target {
            cdp.close_target(&target.id).await;
        }
        browser.shutdown().await;
        drop(guard);

        match outcome {
            Ok((meta, Some((transcript, method)))) => {
                tracing::info!("Extraction succeeded via {} method", method.as_str());
                ExtractionResult::success(
                    video_id.to_string(),
                    canonical_url,
                    meta,
                    transcript,
                    method,
                )
            }
            Ok((meta, None)) => ExtractionResult::failure(
                video_id.to_string(),
                canonical_url,
                meta,
                NO_TRANSCRIPT_ERROR.to_string(),
            ),
            Err(e) => {
                tracing::error!("Extraction failed: {:#}", e);
                ExtractionResult::failure(
                    video_id.to_string(),
                    canonical_url,
                    Metadata::default(),
                    e.to_string(),
                )
            }
        }
    }

    async fn drive(
        &self,
        cdp: &CdpClient,
        browser: &mut BrowserManager,
        target: &mut Option<PageTarget>,
        canonical_url: &str,
    ) -> Result<PipelineOutcome> {
        let timing = &self.config.timing;

        browser.reset_profile().await;
        browser.launch()?;
        browser.await_ready(cdp).await?;

        let opened = cdp.open_target(canonical_url).await?;
        tracing::info!("Opened tab for {}", canonical_url);
        *target = Some(opened.clone());

        // Navigating resets the WebSocket connection, so give the page a
        // blind settle before attaching
        tokio::time::sleep(timing.page_load_wait()).await;

        let socket = cdp.connect(&opened).await?;
        let mut session = CdpSession::new(socket, timing.evaluate_timeout());

        run_pipeline(timing, &mut session).await
    }
}

type PipelineOutcome = (Metadata, Option<(String, ExtractionMethod)>);

/// AwaitingPlayerData → FetchingMetadata → TryingDOM → TryingAPI.
async fn run_pipeline<S: PageSession>(timing: &Timing, session: &mut S) -> Result<PipelineOutcome> {
    wait_for_player(timing, session).await?;

    let meta = fetch_metadata(session).await?;
    tracing::debug!("Metadata: {:?}", meta);

    tracing::info!("Attempting DOM extraction");
    let dom = session
        .evaluate(&scripts::dom_script(timing.segment_settle_ms), scripts::DOM_ID)
        .await?;
    if let Some(text) = decode_strategy(dom) {
        return Ok((meta, Some((text, ExtractionMethod::Dom))));
    }

    tracing::info!("DOM extraction produced nothing, falling back to API method");
    let api = session.evaluate(scripts::API, scripts::API_ID).await?;
    if let Some(text) = decode_strategy(api) {
        return Ok((meta, Some((text, ExtractionMethod::Api))));
    }

    Ok((meta, None))
}

/// Poll until the page's embedded player response object is present.
/// The dominant failure mode is a page that never finishes rendering.
async fn wait_for_player<S: PageSession>(timing: &Timing, session: &mut S) -> Result<()> {
    let deadline = tokio::time::Instant::now() + timing.player_wait();

    while tokio::time::Instant::now() < deadline {
        let value = session.evaluate(scripts::PROBE, scripts::PROBE_ID).await?;
        if value.as_deref() == Some("true") {
            tracing::debug!("ytInitialPlayerResponse ready");
            return Ok(());
        }
        tokio::time::sleep(timing.player_poll_interval()).await;
    }

    Err(ExtractError::PlayerDataTimeout(timing.player_wait_secs).into())
}

async fn fetch_metadata<S: PageSession>(session: &mut S) -> Result<Metadata> {
    let value = session
        .evaluate(scripts::METADATA, scripts::METADATA_ID)
        .await?;
    Ok(value
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default())
}

/// Map a strategy script's tagged value to its outcome: non-empty text, or
/// nothing. An `error` tag, empty text, an undefined result, or malformed
/// JSON all mean "this strategy produced nothing" and drive the fallback.
fn decode_strategy(value: Option<String>) -> Option<String> {
    let raw = value?;
    let parsed: StrategyResult = serde_json::from_str(&raw).ok()?;
    if let Some(error) = parsed.error {
        tracing::debug!("Strategy reported error: {}", error);
        return None;
    }
    parsed.text.filter(|text| !text.is_empty())
}
