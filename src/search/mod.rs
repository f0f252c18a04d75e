//! Web-search evidence retrieval
//!
//! Best-effort snippets for grounding classification; never treated as
//! authoritative ground truth.

mod tavily;

use serde::Deserialize;

pub use tavily::TavilySearchClient;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SearchError {
    #[error("search credential missing: set TAVILY_API_KEY")]
    MissingCredential,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search API error: HTTP {0}")]
    Status(u16),

    #[error("failed to parse response: {0}")]
    Parse(String),
}

/// One retrieved result snippet
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: Option<f64>,
}

/// Evidence gathered for one question, scoped to one classification call
#[derive(Debug, Clone, Default)]
pub struct SearchEvidence {
    /// Provider-synthesized answer, when the provider offers one
    pub answer: Option<String>,
    pub snippets: Vec<SearchSnippet>,
}

impl SearchEvidence {
    pub fn is_empty(&self) -> bool {
        self.answer.is_none() && self.snippets.is_empty()
    }
}
