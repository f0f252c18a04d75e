//! End-to-end statement checking and verdict aggregation
//!
//! Owns the pipeline: decompose, classify each question, aggregate. This is
//! the one boundary the CSV batch runner and upload handler depend on, and
//! it always returns a Verdict.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::time::Instant;

use crate::backend::BackendKind;
use crate::model::{Answer, CheckLimits, QuestionAnswer, Verdict, VerdictLabel};
use crate::service::classify::EvidenceClassifier;
use crate::service::decompose::QuestionDecomposer;

/// Top-level fact-checking service
pub struct FactCheckService {
    decomposer: Arc<QuestionDecomposer>,
    classifier: Arc<EvidenceClassifier>,
    limits: CheckLimits,
}

impl FactCheckService {
    pub fn new(
        decomposer: Arc<QuestionDecomposer>,
        classifier: Arc<EvidenceClassifier>,
        limits: CheckLimits,
    ) -> Self {
        Self {
            decomposer,
            classifier,
            limits,
        }
    }

    /// Check a statement and return its verdict
    ///
    /// Questions are classified concurrently up to the configured bound;
    /// the answer trace keeps decomposition order regardless of completion
    /// order. A negative answer short-circuits the remaining questions but
    /// the partial trace is kept. The whole check is bounded by a deadline;
    /// exceeding it marks the verdict incomplete.
    pub async fn check_statement(&self, statement: &str, use_local: bool) -> Verdict {
        let kind = if use_local {
            BackendKind::Local
        } else {
            BackendKind::Remote
        };

        let start_time = std::time::Instant::now();
        let deadline = Instant::now() + Duration::from_secs(self.limits.check_timeout_secs);

        let questions = match self.decomposer.decompose(statement, kind).await {
            Ok(questions) => questions,
            Err(e) => {
                tracing::error!(
                    statement = %statement,
                    backend = ?kind,
                    error = %e,
                    "Decomposition failed, statement is unverifiable"
                );
                return Verdict::unverifiable(statement);
            }
        };

        if questions.is_empty() {
            return Verdict::unverifiable(statement);
        }

        let question_timeout = Duration::from_secs(self.limits.question_timeout_secs);
        let classifier = &self.classifier;

        // `buffered` bounds concurrency and yields results in input order
        let mut stream = futures::stream::iter(questions.into_iter().map(|question| {
            let classifier = Arc::clone(classifier);
            async move {
                let answer = match tokio::time::timeout(
                    question_timeout,
                    classifier.classify(&question, kind),
                )
                .await
                {
                    Ok(answer) => answer,
                    Err(_) => {
                        tracing::warn!(
                            question = %question,
                            timeout_secs = question_timeout.as_secs(),
                            "Question timed out, resolving as unknown"
                        );
                        Answer::Unknown
                    }
                };
                QuestionAnswer { question, answer }
            }
        }))
        .buffered(self.limits.max_concurrent_questions.max(1));

        let mut answers: Vec<QuestionAnswer> = Vec::new();
        let mut incomplete = false;

        loop {
            match tokio::time::timeout_at(deadline, stream.next()).await {
                Ok(Some(entry)) => {
                    let negative = entry.answer == Answer::Negative;
                    answers.push(entry);
                    if negative {
                        tracing::info!(
                            statement = %statement,
                            answered = answers.len(),
                            "Negative answer, short-circuiting remaining questions"
                        );
                        break;
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    incomplete = true;
                    tracing::warn!(
                        statement = %statement,
                        answered = answers.len(),
                        "Check deadline exceeded, returning incomplete verdict"
                    );
                    break;
                }
            }
        }

        let mut label = aggregate(answers.iter().map(|qa| qa.answer));
        if incomplete && label == VerdictLabel::True {
            // Unclassified questions remain; an all-affirmative prefix is
            // not an all-affirmative trace
            label = VerdictLabel::Unverifiable;
        }

        tracing::info!(
            statement = %statement,
            label = ?label,
            answered = answers.len(),
            incomplete = incomplete,
            elapsed_ms = start_time.elapsed().as_millis(),
            "Statement checked"
        );

        Verdict {
            statement: statement.to_string(),
            label,
            answers,
            incomplete,
        }
    }
}

/// Strict-AND aggregation over the answer trace
///
/// True only when every answer is affirmative; any negative makes the
/// statement false; an unknown without a negative makes it unverifiable,
/// never true. The empty trace is unverifiable.
pub fn aggregate(answers: impl IntoIterator<Item = Answer>) -> VerdictLabel {
    let mut any = false;
    let mut unknown = false;

    for answer in answers {
        any = true;
        match answer {
            Answer::Negative => return VerdictLabel::False,
            Answer::Unknown => unknown = true,
            Answer::Affirmative => {}
        }
    }

    if !any || unknown {
        VerdictLabel::Unverifiable
    } else {
        VerdictLabel::True
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{InferenceAdapter, RemoteBackend};
    use crate::model::Config;
    use crate::search::TavilySearchClient;
    use crate::model::Answer::{Affirmative, Negative, Unknown};

    #[test]
    fn test_empty_trace_is_unverifiable() {
        assert_eq!(aggregate([]), VerdictLabel::Unverifiable);
    }

    #[test]
    fn test_all_affirmative_is_true() {
        assert_eq!(aggregate([Affirmative]), VerdictLabel::True);
        assert_eq!(
            aggregate([Affirmative, Affirmative, Affirmative]),
            VerdictLabel::True
        );
    }

    #[test]
    fn test_any_negative_is_false_regardless_of_unknowns() {
        assert_eq!(aggregate([Affirmative, Negative]), VerdictLabel::False);
        assert_eq!(
            aggregate([Unknown, Negative, Affirmative]),
            VerdictLabel::False
        );
        assert_eq!(aggregate([Negative]), VerdictLabel::False);
    }

    #[test]
    fn test_unknown_without_negative_is_unverifiable() {
        assert_eq!(aggregate([Unknown]), VerdictLabel::Unverifiable);
        assert_eq!(
            aggregate([Affirmative, Unknown, Affirmative]),
            VerdictLabel::Unverifiable
        );
    }

    #[tokio::test]
    #[ignore] // Requires network access, OPENAI_API_KEY, and TAVILY_API_KEY
    async fn test_live_check_true_statement() {
        let config = Config::default();
        let api_key = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY");
        let remote = RemoteBackend::new(&api_key).expect("remote backend");
        let adapter = Arc::new(InferenceAdapter::new(
            remote,
            config.model_dir.clone(),
            &config.backend,
        ));
        let search = Arc::new(TavilySearchClient::from_env(&config.search));
        let service = FactCheckService::new(
            Arc::new(QuestionDecomposer::new(Arc::clone(&adapter))),
            Arc::new(EvidenceClassifier::new(adapter, search)),
            config.limits,
        );

        let verdict = service
            .check_statement("The Earth revolves around the Sun", false)
            .await;
        assert_eq!(verdict.label, VerdictLabel::True);
        assert!(!verdict.answers.is_empty());
    }
}
