//! Backend reply to answer adapter
//!
//! The reply is untrusted free text. Only the leading token is matched
//! against the affirmative/negative vocabulary; anything else maps to
//! `Unknown`, never to a guess.

use crate::model::Answer;

const AFFIRMATIVE_VOCABULARY: &[&str] = &["yes", "affirmative", "true", "correct"];
const NEGATIVE_VOCABULARY: &[&str] = &["no", "negative", "false", "incorrect"];

/// Map a backend reply to the three-valued answer
pub fn normalize_answer(raw: &str) -> Answer {
    let token: String = raw
        .split_whitespace()
        .next()
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();

    if token.is_empty() {
        return Answer::Unknown;
    }

    if AFFIRMATIVE_VOCABULARY.contains(&token.as_str()) {
        return Answer::Affirmative;
    }

    if NEGATIVE_VOCABULARY.contains(&token.as_str()) {
        return Answer::Negative;
    }

    Answer::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affirmative_variants() {
        for reply in ["Yes", "yes.", "YES", "  Yes, it does.", "\"Yes\"", "True"] {
            assert_eq!(normalize_answer(reply), Answer::Affirmative, "{}", reply);
        }
    }

    #[test]
    fn test_negative_variants() {
        for reply in ["No", "no,", "NO.", "  No - it does not.", "False"] {
            assert_eq!(normalize_answer(reply), Answer::Negative, "{}", reply);
        }
    }

    #[test]
    fn test_unmatched_replies_are_unknown() {
        for reply in [
            "",
            "   ",
            "Not enough information to say.",
            "The answer is yes.",
            "Maybe",
            "I cannot answer that.",
        ] {
            assert_eq!(normalize_answer(reply), Answer::Unknown, "{}", reply);
        }
    }

    #[test]
    fn test_no_prefix_words_are_not_negative() {
        // "Nothing" starts with "no" but is not a negative answer
        assert_eq!(normalize_answer("Nothing supports this."), Answer::Unknown);
    }
}
