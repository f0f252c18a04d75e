//! Remote hosted inference backend
//!
//! Thin wrapper over the OpenAI API used for both decomposition and
//! classification prompts.

use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::openai;

use super::BackendError;

/// Environment variable overriding the remote model id
const ENV_REMOTE_MODEL: &str = "VERIFACT_REMOTE_MODEL";

/// Default remote model
const DEFAULT_MODEL: &str = openai::GPT_4O_MINI;

/// Credential-bound remote client
///
/// Safe to share and invoke concurrently; the underlying HTTP client
/// multiplexes requests.
#[derive(Clone)]
pub struct RemoteBackend {
    client: openai::Client,
    model: String,
}

impl RemoteBackend {
    /// Create a new remote backend with the provided API key
    pub fn new(api_key: &str) -> Result<Self, BackendError> {
        let client = openai::Client::new(api_key);

        let model =
            std::env::var(ENV_REMOTE_MODEL).unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        tracing::info!(model = %model, "Remote inference backend initialized");

        Ok(Self { client, model })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one generation request
    ///
    /// Temperature is pinned to 0.0 so answers are deterministic.
    pub async fn generate(&self, system: &str, prompt: &str) -> Result<String, BackendError> {
        let agent = self
            .client
            .agent(&self.model)
            .preamble(system)
            .temperature(0.0)
            .build();

        agent
            .prompt(prompt)
            .await
            .map_err(|e| BackendError::Generation(e.to_string()))
    }
}
