//! Prompts for evidence-grounded classification

use crate::search::SearchEvidence;

/// System prompt for yes/no classification
pub const CLASSIFICATION_SYSTEM_PROMPT: &str =
    r#"You are a precise analyst that only answers "Yes" or "No"."#;

/// Marker inserted when retrieval produced nothing
pub const NO_EVIDENCE_MARKER: &str = "No evidence found.";

/// Build the grounded classification prompt for one question
pub fn build_classification_prompt(question: &str, evidence: &SearchEvidence) -> String {
    format!(
        r#"Analyze the evidence below and answer the question strictly with "Yes" or "No".

Evidence:
{}

Question:
{}

Answer (Yes/No only):"#,
        format_evidence(evidence),
        question
    )
}

fn format_evidence(evidence: &SearchEvidence) -> String {
    if evidence.is_empty() {
        return NO_EVIDENCE_MARKER.to_string();
    }

    let mut block = String::new();

    if let Some(answer) = &evidence.answer {
        block.push_str("Summary: ");
        block.push_str(answer);
        block.push('\n');
    }

    for (i, snippet) in evidence.snippets.iter().enumerate() {
        block.push_str(&format!(
            "{}. {} ({})\n   {}\n",
            i + 1,
            snippet.title,
            snippet.url,
            snippet.content
        ));
    }

    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchSnippet;

    #[test]
    fn test_empty_evidence_uses_marker() {
        let prompt = build_classification_prompt("Is water wet?", &SearchEvidence::default());
        assert!(prompt.contains(NO_EVIDENCE_MARKER));
        assert!(prompt.contains("Is water wet?"));
    }

    #[test]
    fn test_snippets_are_included() {
        let evidence = SearchEvidence {
            answer: Some("Yes, it orbits the Sun.".to_string()),
            snippets: vec![SearchSnippet {
                title: "Heliocentrism".to_string(),
                url: "https://example.org/helio".to_string(),
                content: "The Earth orbits the Sun once a year.".to_string(),
                score: Some(0.9),
            }],
        };
        let prompt =
            build_classification_prompt("Does the Earth revolve around the Sun?", &evidence);
        assert!(prompt.contains("Summary: Yes, it orbits the Sun."));
        assert!(prompt.contains("The Earth orbits the Sun once a year."));
        assert!(!prompt.contains(NO_EVIDENCE_MARKER));
    }
}
