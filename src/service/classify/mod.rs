//! Evidence-grounded yes/no classification
//!
//! For a single question: retrieve search snippets, build a grounded
//! prompt, invoke the inference backend, and normalize the reply. Failures
//! are contained here; the caller always gets an `Answer`.

pub mod normalize;
pub mod prompts;

use std::sync::Arc;

use crate::backend::{BackendKind, InferenceAdapter};
use crate::model::Answer;
use crate::search::{SearchEvidence, TavilySearchClient};
use crate::service::classify::normalize::normalize_answer;
use crate::service::classify::prompts::{build_classification_prompt, CLASSIFICATION_SYSTEM_PROMPT};

/// Service answering atomic questions against retrieved evidence
pub struct EvidenceClassifier {
    adapter: Arc<InferenceAdapter>,
    search: Arc<TavilySearchClient>,
}

impl EvidenceClassifier {
    pub fn new(adapter: Arc<InferenceAdapter>, search: Arc<TavilySearchClient>) -> Self {
        Self { adapter, search }
    }

    /// Classify one question as affirmative, negative, or unknown
    ///
    /// Retrieval failure degrades to a no-evidence prompt; backend failure
    /// (both providers exhausted) yields `Unknown`. Sibling questions are
    /// never affected.
    pub async fn classify(&self, question: &str, kind: BackendKind) -> Answer {
        let evidence = match self.search.search(question).await {
            Ok(evidence) => evidence,
            Err(e) => {
                tracing::warn!(
                    question = %question,
                    error = %e,
                    "Evidence retrieval failed, classifying without evidence"
                );
                SearchEvidence::default()
            }
        };

        let prompt = build_classification_prompt(question, &evidence);

        let reply = match self
            .adapter
            .generate(CLASSIFICATION_SYSTEM_PROMPT, &prompt, kind)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(
                    question = %question,
                    backend = ?kind,
                    error = %e,
                    "Classification generation failed"
                );
                return Answer::Unknown;
            }
        };

        let answer = normalize_answer(&reply);

        match answer {
            Answer::Unknown => {
                tracing::warn!(
                    question = %question,
                    reply = %reply.chars().take(120).collect::<String>(),
                    "Reply matched neither affirmative nor negative vocabulary"
                );
            }
            _ => {
                tracing::debug!(
                    question = %question,
                    answer = ?answer,
                    snippets = evidence.snippets.len(),
                    "Question classified"
                );
            }
        }

        answer
    }
}
