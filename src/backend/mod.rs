//! Inference backend adapter
//!
//! Uniform `generate(system, prompt, kind)` interface over two
//! interchangeable providers: the remote hosted model and the local
//! in-process model. Handles handle caching, single-flight local
//! acquisition, timeouts, and local-to-remote fallback.

pub mod local;
pub mod remote;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::OnceCell;

use crate::model::BackendConfig;

pub use local::LocalModel;
pub use remote::RemoteBackend;

/// Which provider a call should target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Remote,
    Local,
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BackendError {
    /// Local model directory/files missing or incomplete, or the remote
    /// client could not be created
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("generation timed out after {0}s")]
    Timeout(u64),
}

/// Adapter over both inference providers
///
/// The remote client is constructed once at startup (a missing credential
/// is a startup error, not a per-call one). The local model is acquired
/// lazily on first use, at most once per process, with single-flight
/// initialization; all later calls reuse the cached handle.
pub struct InferenceAdapter {
    remote: RemoteBackend,
    model_dir: PathBuf,
    local: OnceCell<Arc<Mutex<LocalModel>>>,
    generation_timeout: Duration,
    max_new_tokens: usize,
}

impl InferenceAdapter {
    pub fn new(remote: RemoteBackend, model_dir: PathBuf, config: &BackendConfig) -> Self {
        Self {
            remote,
            model_dir,
            local: OnceCell::new(),
            generation_timeout: Duration::from_secs(config.generation_timeout_secs),
            max_new_tokens: config.max_new_tokens,
        }
    }

    /// Generate text against the selected backend
    ///
    /// Any failure acquiring or invoking the local backend retries the same
    /// request against the remote backend exactly once, with a warning.
    /// Remote failures do not fall back to local.
    pub async fn generate(
        &self,
        system: &str,
        prompt: &str,
        kind: BackendKind,
    ) -> Result<String, BackendError> {
        match kind {
            BackendKind::Remote => self.generate_remote(system, prompt).await,
            BackendKind::Local => match self.generate_local(system, prompt).await {
                Ok(text) => Ok(text),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Local backend failed, falling back to remote"
                    );
                    self.generate_remote(system, prompt).await
                }
            },
        }
    }

    async fn generate_remote(&self, system: &str, prompt: &str) -> Result<String, BackendError> {
        let start_time = std::time::Instant::now();

        match tokio::time::timeout(self.generation_timeout, self.remote.generate(system, prompt))
            .await
        {
            Ok(Ok(text)) => {
                tracing::debug!(
                    model = %self.remote.model(),
                    elapsed_ms = start_time.elapsed().as_millis(),
                    "Remote generation completed"
                );
                Ok(text)
            }
            Ok(Err(e)) => {
                tracing::error!(
                    model = %self.remote.model(),
                    elapsed_ms = start_time.elapsed().as_millis(),
                    error = %e,
                    "Remote generation failed"
                );
                Err(e)
            }
            Err(_) => {
                tracing::warn!(
                    model = %self.remote.model(),
                    timeout_secs = self.generation_timeout.as_secs(),
                    "Remote generation timed out"
                );
                Err(BackendError::Timeout(self.generation_timeout.as_secs()))
            }
        }
    }

    async fn generate_local(&self, system: &str, prompt: &str) -> Result<String, BackendError> {
        let handle = self.local_handle().await?;
        let formatted = LocalModel::format_prompt(system, prompt);
        let max_new_tokens = self.max_new_tokens;

        // The in-process model is a shared, exclusively-mutated resource;
        // generation is serialized behind the mutex and kept off the
        // async workers.
        let task = tokio::task::spawn_blocking(move || {
            let mut model = handle.lock().unwrap_or_else(PoisonError::into_inner);
            model.generate(&formatted, max_new_tokens)
        });

        match tokio::time::timeout(self.generation_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(BackendError::Generation(format!(
                "generation task failed: {}",
                e
            ))),
            Err(_) => {
                // The blocking task keeps running to completion; only this
                // caller gives up on it.
                tracing::warn!(
                    timeout_secs = self.generation_timeout.as_secs(),
                    "Local generation timed out"
                );
                Err(BackendError::Timeout(self.generation_timeout.as_secs()))
            }
        }
    }

    /// Acquire the cached local handle, loading the model on first use
    ///
    /// `get_or_try_init` is single-flight: concurrent first callers share
    /// one load. A failed load leaves the cell empty, so a later call (for
    /// example after the model download finished) can retry.
    async fn local_handle(&self) -> Result<Arc<Mutex<LocalModel>>, BackendError> {
        let handle = self
            .local
            .get_or_try_init(|| async {
                let dir = self.model_dir.clone();
                let loaded = tokio::task::spawn_blocking(move || LocalModel::load(&dir))
                    .await
                    .map_err(|e| {
                        BackendError::Unavailable(format!("model load task failed: {}", e))
                    })??;
                Ok::<_, BackendError>(Arc::new(Mutex::new(loaded)))
            })
            .await?;

        Ok(Arc::clone(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter_with_missing_model() -> InferenceAdapter {
        let remote = RemoteBackend::new("sk-test-key").expect("client creation is offline");
        InferenceAdapter::new(
            remote,
            PathBuf::from("/nonexistent/model/dir"),
            &BackendConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_local_acquisition_failure_is_unavailable() {
        let adapter = adapter_with_missing_model();
        let err = adapter
            .generate_local("system", "prompt")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Unavailable(_)));
        assert!(err.to_string().contains("/nonexistent/model/dir"));
    }

    #[tokio::test]
    async fn test_failed_acquisition_is_not_cached() {
        let adapter = adapter_with_missing_model();
        assert!(adapter.local_handle().await.is_err());
        // Cell stays empty so a later call can retry once the download
        // has completed
        assert!(adapter.local.get().is_none());
    }

    #[tokio::test]
    #[ignore] // Requires network access and OPENAI_API_KEY
    async fn test_local_failure_falls_back_to_remote() {
        let api_key = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY");
        let remote = RemoteBackend::new(&api_key).expect("remote backend");
        let adapter = InferenceAdapter::new(
            remote,
            PathBuf::from("/nonexistent/model/dir"),
            &BackendConfig::default(),
        );
        let text = adapter
            .generate("You are terse.", "Reply with OK.", BackendKind::Local)
            .await;
        assert!(text.is_ok());
    }
}
