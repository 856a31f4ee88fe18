//! Parsing and validation of questions submitted by direct message.

use crate::errors::{Error, Result};

/// A question ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Cleaned-up question text
    pub text: String,
    /// Target pool
    pub is_shallow: bool,
}

/// Parses a DM body into a question.
///
/// An optional `shallow:` or `deep:` prefix (any case) picks the pool; without
/// one the question goes to the shallow pool. The text is trimmed, must be
/// non-empty and at most `max_len` characters, and gets a trailing `?` if it
/// does not already end with one.
pub fn parse_submission(content: &str, max_len: usize) -> Result<Submission> {
    let trimmed = content.trim();
    let (is_shallow, body) = split_pool_prefix(trimmed);
    let body = body.trim();

    if body.is_empty() {
        return Err(Error::InvalidSubmission {
            reason: "the question is empty".to_string(),
        });
    }

    let mut text = body.to_string();
    if !text.ends_with('?') {
        text.push('?');
    }

    let len = text.chars().count();
    if len > max_len {
        return Err(Error::InvalidSubmission {
            reason: format!("the question is {len} characters long, the limit is {max_len}"),
        });
    }

    Ok(Submission { text, is_shallow })
}

fn split_pool_prefix(content: &str) -> (bool, &str) {
    for (prefix, is_shallow) in [("shallow:", true), ("deep:", false)] {
        if content.len() >= prefix.len()
            && content.is_char_boundary(prefix.len())
            && content[..prefix.len()].eq_ignore_ascii_case(prefix)
        {
            return (is_shallow, &content[prefix.len()..]);
        }
    }
    (true, content)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_defaults_to_shallow_and_appends_question_mark() {
        let parsed = parse_submission("  What did you eat today  ", 200).unwrap();
        assert_eq!(
            parsed,
            Submission {
                text: "What did you eat today?".to_string(),
                is_shallow: true,
            }
        );
    }

    #[test]
    fn test_pool_prefix() {
        let deep = parse_submission("DEEP: What shaped you the most?", 200).unwrap();
        assert!(!deep.is_shallow);
        assert_eq!(deep.text, "What shaped you the most?");

        let shallow = parse_submission("shallow:tabs or spaces", 200).unwrap();
        assert!(shallow.is_shallow);
        assert_eq!(shallow.text, "tabs or spaces?");
    }

    #[test]
    fn test_rejects_empty_and_too_long() {
        assert!(matches!(
            parse_submission("deep:   ", 200),
            Err(Error::InvalidSubmission { .. })
        ));
        assert!(matches!(
            parse_submission(&"a".repeat(20), 10),
            Err(Error::InvalidSubmission { .. })
        ));
    }

    #[test]
    fn test_multibyte_input_does_not_split_chars() {
        let parsed = parse_submission("café ☕ or tea", 200).unwrap();
        assert_eq!(parsed.text, "café ☕ or tea?");
    }
}
