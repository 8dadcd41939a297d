use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::File;
use std::path::PathBuf;

/// Cross-process guard serializing extractions against the shared Chrome profile.
///
/// Holds an exclusive advisory lock on a well-known file for the duration of
/// one extraction call. Acquisition blocks without bound: a second caller
/// waits for its turn rather than racing the profile directory. Dropping the
/// guard releases the lock and removes the artifact so the next invocation
/// starts clean.
#[derive(Debug)]
pub struct ProfileLock {
    file: File,
    path: PathBuf,
}

impl ProfileLock {
    /// Acquire the lock, blocking until it is available.
    pub async fn acquire(path: &std::path::Path) -> Result<Self> {
        let path = path.to_path_buf();
        // flock blocks the thread, so take it off the async runtime
        let acquired = tokio::task::spawn_blocking(move || -> Result<(File, PathBuf)> {
            let file = File::create(&path)
                .with_context(|| format!("Failed to create lock file {}", path.display()))?;
            file.lock_exclusive()
                .with_context(|| format!("Failed to lock {}", path.display()))?;
            Ok((file, path))
        })
        .await
        .context("Lock acquisition task failed")??;

        let (file, path) = acquired;
        tracing::debug!("Acquired extraction lock at {}", path.display());
        Ok(Self { file, path })
    }
}

impl Drop for ProfileLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::debug!("Failed to unlock {}: {}", self.path.display(), e);
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::debug!("Failed to remove lock file {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn acquire_and_reacquire() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.lock");

        let guard = ProfileLock::acquire(&path).await.unwrap();
        drop(guard);

        // Lock artifact is removed on release
        assert!(!path.exists());

        // A later caller can acquire again
        let guard = ProfileLock::acquire(&path).await.unwrap();
        drop(guard);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn second_caller_blocks_until_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.lock");
        let hold = Duration::from_millis(150);

        let first = ProfileLock::acquire(&path).await.unwrap();
        let holder = tokio::spawn(async move {
            tokio::time::sleep(hold).await;
            drop(first);
        });

        let started = Instant::now();
        let second = ProfileLock::acquire(&path).await.unwrap();
        assert!(started.elapsed() >= hold - Duration::from_millis(20));

        drop(second);
        holder.await.unwrap();
    }
}
