//! yt-transcript - Extract YouTube video transcripts via the Chrome DevTools Protocol
//!
//! This library launches a real Chrome instance bound to a dedicated debug profile,
//! opens the video's watch page, and pulls the transcript either from the DOM
//! (clicking "Show transcript") or from the caption-track API as a fallback.

pub mod browser;
pub mod cdp;
pub mod cli;
pub mod config;
pub mod extractor;
pub mod lock;
pub mod output;
pub mod resolver;

pub use cli::Cli;
pub use config::Config;
pub use extractor::{ExtractionMethod, ExtractionResult, TranscriptExtractor};
pub use resolver::VideoId;

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to the extractor
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("Could not parse video ID from URL: {0}")]
    UnparseableUrl(String),

    #[error("Chrome not found. Install Google Chrome or add it to PATH.")]
    BrowserNotFound,

    #[error("Chrome did not start within {timeout}s on port {port}")]
    BrowserStartTimeout { port: u16, timeout: u64 },

    #[error("ytInitialPlayerResponse not available after {0}s")]
    PlayerDataTimeout(u64),

    #[error("evaluate timed out after {timeout}s waiting for request id {request_id}")]
    EvaluateTimeout { request_id: u64, timeout: u64 },

    #[error("WebSocket closed while waiting for JS response")]
    SocketClosed,
}
