//! Core fact-checking data model: answers, verdicts, and the answer trace

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Three-valued answer to a single atomic question
///
/// `Unknown` is the explicit "classification failed or evidence
/// insufficient" state and is never coerced to `Negative`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    Affirmative,
    Negative,
    Unknown,
}

/// Final verdict label for a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VerdictLabel {
    /// Every atomic question was answered affirmatively
    True,
    /// At least one atomic question was answered negatively
    False,
    /// Nothing decomposable, or at least one answer remained unknown
    Unverifiable,
}

/// One entry of the answer trace: an atomic question and its answer
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuestionAnswer {
    pub question: String,
    pub answer: Answer,
}

/// Verdict for a checked statement
///
/// Records the full answer sequence that produced the label, not just the
/// final bit. The trace may be a prefix of the decomposition when the check
/// short-circuited on a negative answer or hit its deadline.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Verdict {
    pub statement: String,
    pub label: VerdictLabel,
    pub answers: Vec<QuestionAnswer>,
    /// True when the check was cut off by its deadline before every
    /// question was classified
    pub incomplete: bool,
}

impl Verdict {
    /// Verdict for a statement that produced no checkable questions
    pub fn unverifiable(statement: &str) -> Self {
        Self {
            statement: statement.to_string(),
            label: VerdictLabel::Unverifiable,
            answers: Vec::new(),
            incomplete: false,
        }
    }
}
