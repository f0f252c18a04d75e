//! Statement decomposition service
//!
//! Turns one statement into an ordered sequence of atomic, independently
//! verifiable yes/no questions using the inference backend adapter.

pub mod parse;
pub mod prompts;

use std::sync::Arc;

use crate::backend::{BackendError, BackendKind, InferenceAdapter};
use crate::service::decompose::parse::parse_questions;
use crate::service::decompose::prompts::{build_decomposition_prompt, DECOMPOSITION_SYSTEM_PROMPT};

/// Service decomposing statements into atomic questions
pub struct QuestionDecomposer {
    adapter: Arc<InferenceAdapter>,
}

impl QuestionDecomposer {
    pub fn new(adapter: Arc<InferenceAdapter>) -> Self {
        Self { adapter }
    }

    /// Decompose a statement into ordered yes/no questions
    ///
    /// An empty list is a legitimate outcome (the statement had nothing
    /// decomposable), not an error; callers short-circuit on it. Errors are
    /// backend failures only.
    pub async fn decompose(
        &self,
        statement: &str,
        kind: BackendKind,
    ) -> Result<Vec<String>, BackendError> {
        let prompt = build_decomposition_prompt(statement);

        let reply = self
            .adapter
            .generate(DECOMPOSITION_SYSTEM_PROMPT, &prompt, kind)
            .await?;

        let questions = parse_questions(&reply);

        if questions.is_empty() {
            tracing::warn!(
                statement = %statement,
                reply_length = reply.len(),
                "Decomposition produced no checkable questions"
            );
        } else {
            tracing::info!(
                statement = %statement,
                question_count = questions.len(),
                "Statement decomposed"
            );
        }

        Ok(questions)
    }
}
