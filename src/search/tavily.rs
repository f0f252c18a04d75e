//! Tavily search API client

use std::env;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{SearchError, SearchEvidence, SearchSnippet};
use crate::model::SearchConfig;

const TAVILY_API_BASE_URL: &str = "https://api.tavily.com";
const TAVILY_BASE_URL_ENV: &str = "TAVILY_BASE_URL";
const ENV_TAVILY_API_KEY: &str = "TAVILY_API_KEY";

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    max_results: usize,
    topic: &'a str,
    search_depth: &'a str,
    include_answer: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<SearchSnippet>,
}

/// Client for the Tavily search API
///
/// A missing credential is recoverable: `search` reports it as an error and
/// the classifier proceeds with an empty evidence set.
pub struct TavilySearchClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    max_results: usize,
}

impl TavilySearchClient {
    /// Create a new search client
    ///
    /// The base URL is resolved in this order:
    /// 1. `TAVILY_BASE_URL` environment variable if set
    /// 2. Default Tavily API URL
    pub fn new(api_key: Option<String>, config: &SearchConfig) -> Self {
        let base_url = env::var(TAVILY_BASE_URL_ENV)
            .ok()
            .unwrap_or_else(|| TAVILY_API_BASE_URL.to_string());

        let client = Client::builder()
            .user_agent(concat!("verifact/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        if api_key.is_none() {
            tracing::warn!(
                "TAVILY_API_KEY is not set; questions will be classified without retrieved evidence"
            );
        }

        Self {
            client,
            base_url,
            api_key,
            max_results: config.max_results,
        }
    }

    /// Create a client with the credential taken from the environment
    pub fn from_env(config: &SearchConfig) -> Self {
        Self::new(env::var(ENV_TAVILY_API_KEY).ok(), config)
    }

    /// Retrieve top-ranked result snippets for a query
    pub async fn search(&self, query: &str) -> Result<SearchEvidence, SearchError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SearchError::MissingCredential)?;

        let request = SearchRequest {
            query,
            max_results: self.max_results,
            topic: "general",
            search_depth: "basic",
            include_answer: true,
        };

        tracing::debug!(query = %query, "Issuing search request");

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), query = %query, "Search API returned an error");
            return Err(SearchError::Status(status.as_u16()));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        // No guarantee on snippet count; keep our own bound regardless
        let mut snippets = body.results;
        snippets.truncate(self.max_results);

        tracing::debug!(
            query = %query,
            snippets = snippets.len(),
            has_answer = body.answer.is_some(),
            "Search completed"
        );

        Ok(SearchEvidence {
            answer: body.answer,
            snippets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_search_response() {
        let json = r#"{
            "answer": "Yes, the Earth revolves around the Sun.",
            "results": [
                {"title": "Heliocentrism", "url": "https://example.org/helio", "content": "The Earth orbits the Sun once a year.", "score": 0.98},
                {"title": "Solar System", "url": "https://example.org/solar", "content": "Planets revolve around the Sun."}
            ]
        }"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.results.len(), 2);
        assert!(response.answer.is_some());
        assert_eq!(response.results[0].title, "Heliocentrism");
        assert_eq!(response.results[1].score, None);
    }

    #[test]
    fn test_decode_empty_response() {
        let response: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(response.answer.is_none());
        assert!(response.results.is_empty());
    }

    #[tokio::test]
    async fn test_missing_credential_is_reported() {
        let client = TavilySearchClient::new(None, &SearchConfig::default());
        let result = client.search("is water wet").await;
        assert!(matches!(result, Err(SearchError::MissingCredential)));
    }

    #[tokio::test]
    #[ignore] // Requires network access and TAVILY_API_KEY
    async fn test_live_search() {
        let client = TavilySearchClient::from_env(&SearchConfig::default());
        let evidence = client.search("Does the Earth revolve around the Sun?").await;
        assert!(evidence.is_ok());
        assert!(!evidence.unwrap().is_empty());
    }
}
