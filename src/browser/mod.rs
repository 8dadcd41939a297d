use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, Command};

use crate::cdp::CdpClient;
use crate::config::Config;
use crate::ExtractError;

/// Owns the full lifecycle of exactly one Chrome process per extraction.
pub struct BrowserManager {
    config: Config,
    child: Option<Child>,
}

impl BrowserManager {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            child: None,
        }
    }

    /// Find the Chrome executable: fixed absolute paths first, then PATH lookup.
    pub fn locate(&self) -> Option<PathBuf> {
        for candidate in &self.config.browser_paths {
            let path = Path::new(candidate);
            if path.is_file() {
                return Some(path.to_path_buf());
            }
            if let Some(found) = find_in_path(candidate) {
                return Some(found);
            }
        }
        None
    }

    /// Kill any Chrome instance already using our debug profile and clear the
    /// stale single-instance artifacts it may have left behind.
    ///
    /// Both steps are best effort; finding nothing to kill is not an error.
    pub async fn reset_profile(&self) {
        match terminate_profile_owner(&self.config.profile_dir).output().await {
            Ok(_) => tokio::time::sleep(self.config.timing.post_kill_wait()).await,
            Err(e) => tracing::debug!("Profile-owner kill failed: {}", e),
        }

        for name in ["SingletonLock", "SingletonSocket", "SingletonCookie"] {
            let path = self.config.profile_dir.join(name);
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::debug!("Failed to remove {}: {}", path.display(), e);
                }
            }
        }
    }

    /// Launch Chrome with remote debugging enabled on the configured port.
    pub fn launch(&mut self) -> Result<()> {
        let chrome = self.locate().ok_or(ExtractError::BrowserNotFound)?;
        fs_err::create_dir_all(&self.config.profile_dir)?;

        tracing::info!("Launching Chrome on port {}", self.config.port);
        let child = Command::new(&chrome)
            .arg(format!("--remote-debugging-port={}", self.config.port))
            .arg("--remote-allow-origins=*")
            .arg(format!(
                "--user-data-dir={}",
                self.config.profile_dir.display()
            ))
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        self.child = Some(child);
        Ok(())
    }

    /// Poll the CDP version probe until Chrome answers or the timeout elapses.
    pub async fn await_ready(&self, cdp: &CdpClient) -> Result<()> {
        let timeout = self.config.timing.browser_start_timeout();
        let deadline = tokio::time::Instant::now() + timeout;

        while tokio::time::Instant::now() < deadline {
            if cdp.version_ready().await {
                tracing::debug!("Chrome CDP endpoint ready");
                return Ok(());
            }
            tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        }

        Err(ExtractError::BrowserStartTimeout {
            port: self.config.port,
            timeout: timeout.as_secs(),
        }
        .into())
    }

    /// Terminate the Chrome process we launched: graceful first, then a hard
    /// kill after a bounded wait. Never fails; a no-op without a live child.
    pub async fn shutdown(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        tracing::info!("Shutting down Chrome (pid {:?})", child.id());
        request_graceful_exit(&child).await;

        let grace = std::time::Duration::from_secs(5);
        match tokio::time::timeout(grace, child.wait()).await {
            Ok(Ok(_)) => return,
            Ok(Err(e)) => tracing::debug!("Wait for Chrome exit failed: {}", e),
            Err(_) => tracing::debug!("Chrome ignored termination, killing"),
        }

        if let Err(e) = child.kill().await {
            tracing::debug!("Failed to kill Chrome: {}", e);
        }
    }
}

/// One platform-selected command that terminates whatever process currently
/// owns the given profile directory, matched by command line.
fn terminate_profile_owner(profile_dir: &Path) -> Command {
    #[cfg(unix)]
    {
        let mut cmd = Command::new("pkill");
        cmd.arg("-f")
            .arg(format!("user-data-dir={}", profile_dir.display()))
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }
    #[cfg(windows)]
    {
        let mut cmd = Command::new("wmic");
        cmd.args(["process", "where"])
            .arg(format!(
                "commandline like '%user-data-dir={}%'",
                profile_dir.display()
            ))
            .args(["call", "terminate"])
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }
}

/// Ask the child to exit gracefully. SIGTERM on unix; elsewhere the bounded
/// wait in `shutdown` falls straight through to the hard kill.
async fn request_graceful_exit(child: &Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        let result = Command::new("kill")
            .arg("-TERM")
            .arg(pid.to_string())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await;
        if let Err(e) = result {
            tracing::debug!("SIGTERM to {} failed: {}", pid, e);
        }
    }
    #[cfg(not(unix))]
    let _ = child;
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

/// A PATH hit must be a runnable file, not just an existing one.
fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        path.metadata()
            .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }
    #[cfg(not(unix))]
    {
        path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn config_with_paths(paths: Vec<String>) -> Config {
        Config {
            browser_paths: paths,
            ..Config::default()
        }
    }

    #[test]
    fn locate_returns_none_with_no_candidates() {
        let manager = BrowserManager::new(config_with_paths(vec![]));
        assert!(manager.locate().is_none());
    }

    #[test]
    fn locate_finds_absolute_path() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("fake-chrome");
        fs_err::write(&fake, "").unwrap();

        let manager =
            BrowserManager::new(config_with_paths(vec![fake.display().to_string()]));
        assert_eq!(manager.locate(), Some(fake));
    }

    #[cfg(unix)]
    #[test]
    fn path_candidates_require_executable_bit() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("fake-chrome");
        fs_err::write(&plain, "").unwrap();
        assert!(!is_executable(&plain));

        let mut perms = fs_err::metadata(&plain).unwrap().permissions();
        perms.set_mode(0o755);
        fs_err::set_permissions(&plain, perms).unwrap();
        assert!(is_executable(&plain));
    }

    #[test]
    fn launch_fails_when_browser_missing() {
        let mut manager = BrowserManager::new(config_with_paths(vec![]));
        let err = manager.launch().unwrap_err();
        assert!(err.to_string().contains("Chrome not found"));
    }

    #[tokio::test]
    async fn shutdown_is_a_noop_without_child() {
        let mut manager = BrowserManager::new(config_with_paths(vec![]));
        manager.shutdown().await;
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn reset_profile_removes_singleton_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_with_paths(vec![]);
        config.profile_dir = dir.path().to_path_buf();
        config.timing.post_kill_wait_secs = 0;

        for name in ["SingletonLock", "SingletonSocket", "SingletonCookie"] {
            fs_err::write(dir.path().join(name), "").unwrap();
        }

        BrowserManager::new(config).reset_profile().await;

        for name in ["SingletonLock", "SingletonSocket", "SingletonCookie"] {
            assert!(!dir.path().join(name).exists());
        }
    }
}
