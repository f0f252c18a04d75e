//! Prompts for statement decomposition

/// System prompt for statement decomposition
pub const DECOMPOSITION_SYSTEM_PROMPT: &str = r#"You are a fact-checking assistant that verifies statements by breaking them into verifiable sub-questions.

Rules:
- Each question must be answerable with a plain yes or no.
- A "yes" answer must support the original statement; a "no" answer must contradict it.
- Only include objective, independently checkable facts from the statement. Skip opinions and subjective wording.
- Output one question per line and nothing else."#;

/// Build the decomposition prompt for a statement
pub fn build_decomposition_prompt(statement: &str) -> String {
    format!(
        r#"Given the following factual statement, break it into individual atomic questions that can be independently verified.

Statement: "{}"

Atomic questions:"#,
        statement
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_statement() {
        let prompt = build_decomposition_prompt("The Earth revolves around the Sun");
        assert!(prompt.contains("\"The Earth revolves around the Sun\""));
        assert!(prompt.contains("Atomic questions:"));
    }
}
