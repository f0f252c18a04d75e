//! Backend reply to question-list adapter
//!
//! The backend reply is untrusted free text. Numbering, bullets, preamble
//! lines, and stray quoting all occur in practice and are stripped here;
//! anything that does not survive as a question is dropped.

/// Parse a backend reply into discrete questions, preserving reply order
///
/// Yields an empty list when nothing in the reply looks like a question.
pub fn parse_questions(raw: &str) -> Vec<String> {
    raw.lines().filter_map(clean_line).collect()
}

/// Strip list markers and quoting from one line; keep it only if it still
/// reads as a question
fn clean_line(line: &str) -> Option<String> {
    let text = line.trim();
    let text = text.trim_start_matches(|c: char| c.is_ascii_digit());
    let text = text.trim_start_matches(['.', ')', ':']).trim_start();
    let text = text.trim_start_matches(['-', '*', '\u{2022}']).trim_start();
    let text = text.trim_matches('"').trim();

    if text.len() < 4 || !text.ends_with('?') {
        return None;
    }

    Some(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_list() {
        let raw = "1. Is Virat Kohli the Prime Minister of India?\n2. Is India a country?";
        assert_eq!(
            parse_questions(raw),
            vec![
                "Is Virat Kohli the Prime Minister of India?",
                "Is India a country?"
            ]
        );
    }

    #[test]
    fn test_bulleted_list_with_blank_lines() {
        let raw = "- Does the Earth revolve around the Sun?\n\n* Is the Sun a star?\n";
        assert_eq!(
            parse_questions(raw),
            vec![
                "Does the Earth revolve around the Sun?",
                "Is the Sun a star?"
            ]
        );
    }

    #[test]
    fn test_preamble_is_dropped() {
        let raw = "Here are the atomic questions:\n1) Is water composed of hydrogen and oxygen?";
        assert_eq!(
            parse_questions(raw),
            vec!["Is water composed of hydrogen and oxygen?"]
        );
    }

    #[test]
    fn test_quoted_questions() {
        let raw = "\"Is Paris the capital of France?\"";
        assert_eq!(parse_questions(raw), vec!["Is Paris the capital of France?"]);
    }

    #[test]
    fn test_non_question_output_yields_empty() {
        let raw = "I cannot break this statement into questions.\nIt is subjective.";
        assert!(parse_questions(raw).is_empty());
    }

    #[test]
    fn test_empty_reply_yields_empty() {
        assert!(parse_questions("").is_empty());
        assert!(parse_questions("   \n\n  ").is_empty());
    }

    #[test]
    fn test_order_is_preserved() {
        let raw = "3. Is C true?\n1. Is A true?\n2. Is B true?";
        assert_eq!(
            parse_questions(raw),
            vec!["Is C true?", "Is A true?", "Is B true?"]
        );
    }
}
