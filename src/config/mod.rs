use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration.
///
/// Every path and timing the extractor depends on lives here so tests can
/// substitute isolated values instead of fighting process-wide constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chrome remote-debugging port
    pub port: u16,

    /// Dedicated Chrome profile directory (exclusively owned per extraction)
    pub profile_dir: PathBuf,

    /// Cross-process lock file serializing extractions
    pub lock_path: PathBuf,

    /// Ordered Chrome executable candidates; bare names are resolved via PATH
    pub browser_paths: Vec<String>,

    /// Timing knobs
    pub timing: Timing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Blind wait after opening the tab before attaching the WebSocket.
    /// Navigation invalidates a socket opened too early.
    pub page_load_wait_secs: u64,

    /// Settle after killing a stale Chrome before relaunching
    pub post_kill_wait_secs: u64,

    /// Interval between ytInitialPlayerResponse probes
    pub player_poll_interval_secs: u64,

    /// Bound on the ytInitialPlayerResponse poll
    pub player_wait_secs: u64,

    /// Bound on a single Runtime.evaluate round trip
    pub evaluate_timeout_secs: u64,

    /// Bound on waiting for the CDP endpoint after launch
    pub browser_start_timeout_secs: u64,

    /// Settle (in browser JS) for transcript segments to populate, milliseconds
    pub segment_settle_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            page_load_wait_secs: 5,
            post_kill_wait_secs: 1,
            player_poll_interval_secs: 1,
            player_wait_secs: 15,
            evaluate_timeout_secs: 30,
            browser_start_timeout_secs: 15,
            segment_settle_ms: 500,
        }
    }
}

impl Timing {
    pub fn page_load_wait(&self) -> Duration {
        Duration::from_secs(self.page_load_wait_secs)
    }

    pub fn post_kill_wait(&self) -> Duration {
        Duration::from_secs(self.post_kill_wait_secs)
    }

    pub fn player_poll_interval(&self) -> Duration {
        Duration::from_secs(self.player_poll_interval_secs)
    }

    pub fn player_wait(&self) -> Duration {
        Duration::from_secs(self.player_wait_secs)
    }

    pub fn evaluate_timeout(&self) -> Duration {
        Duration::from_secs(self.evaluate_timeout_secs)
    }

    pub fn browser_start_timeout(&self) -> Duration {
        Duration::from_secs(self.browser_start_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(std::env::temp_dir);
        Self {
            port: 9222,
            profile_dir: home.join(".chrome-debug-profile"),
            lock_path: std::env::temp_dir().join("yt-extract.lock"),
            browser_paths: vec![
                "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome".to_string(),
                "google-chrome".to_string(),
                "google-chrome-stable".to_string(),
                "chromium-browser".to_string(),
                "chromium".to_string(),
            ],
            timing: Timing::default(),
        }
    }
}

impl Config {
    /// Load configuration from the user config file, falling back to defaults
    /// when the file does not exist.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;
            let config: Config =
                serde_yaml::from_str(&content).context("Failed to parse config file")?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("yt-transcript")
            .join("config.yaml")
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }
}
