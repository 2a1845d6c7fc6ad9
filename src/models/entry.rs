//! Word entry data structures.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::date;

/// One word of the day as persisted in the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Entry {
    /// Calendar date the word belongs to
    #[serde(with = "date::canonical")]
    pub date: NaiveDate,

    /// The word itself
    pub word: String,

    /// Explanation of the word's meaning
    pub explanation: String,

    /// Example sentence using the word
    pub example: String,
}

impl Entry {
    /// Attach a date to a candidate, trimming its text fields.
    pub fn from_candidate(date: NaiveDate, candidate: &Candidate) -> Self {
        Self {
            date,
            word: candidate.word.trim().to_string(),
            explanation: candidate.explanation.trim().to_string(),
            example: candidate.example.trim().to_string(),
        }
    }

    /// Name of the first text field that is blank, if any.
    pub fn blank_field(&self) -> Option<&'static str> {
        blank_field(&self.word, &self.explanation, &self.example)
    }

    /// Case-insensitive word comparison.
    pub fn has_word(&self, word: &str) -> bool {
        normalize_word(&self.word) == normalize_word(word)
    }

    /// Date in canonical `YYYY-MM-DD` form.
    pub fn date_str(&self) -> String {
        date::format_date(self.date)
    }
}

/// A generator-produced payload that has not been verified or committed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Candidate {
    pub word: String,
    pub explanation: String,
    pub example: String,
}

impl Candidate {
    pub fn new(
        word: impl Into<String>,
        explanation: impl Into<String>,
        example: impl Into<String>,
    ) -> Self {
        Self {
            word: word.into(),
            explanation: explanation.into(),
            example: example.into(),
        }
    }

    /// Name of the first text field that is blank after trimming, if any.
    pub fn blank_field(&self) -> Option<&'static str> {
        blank_field(&self.word, &self.explanation, &self.example)
    }
}

/// Verifier judgement on a candidate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Verdict {
    pub valid: bool,
    #[serde(default)]
    pub reason: String,
}

impl Verdict {
    pub fn accept(reason: impl Into<String>) -> Self {
        Self {
            valid: true,
            reason: reason.into(),
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: reason.into(),
        }
    }
}

/// Key used for case-insensitive word identity.
pub fn normalize_word(word: &str) -> String {
    word.trim().to_lowercase()
}

fn blank_field(word: &str, explanation: &str, example: &str) -> Option<&'static str> {
    [("word", word), ("explanation", explanation), ("example", example)]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_candidate_trims_fields() {
        let candidate = Candidate::new("  gezellig ", "knus\n", " Het was gezellig. ");
        let date = date::parse_date("2024-05-01").unwrap();
        let entry = Entry::from_candidate(date, &candidate);

        assert_eq!(entry.word, "gezellig");
        assert_eq!(entry.explanation, "knus");
        assert_eq!(entry.example, "Het was gezellig.");
    }

    #[test]
    fn test_blank_field_detection() {
        assert_eq!(Candidate::new("a", "b", "c").blank_field(), None);
        assert_eq!(Candidate::new(" ", "b", "c").blank_field(), Some("word"));
        assert_eq!(Candidate::new("a", "b", "\t").blank_field(), Some("example"));
    }

    #[test]
    fn test_has_word_ignores_case() {
        let entry = Entry {
            date: date::parse_date("2024-01-01").unwrap(),
            word: "Elan".to_string(),
            explanation: "x".to_string(),
            example: "y".to_string(),
        };
        assert!(entry.has_word("elan"));
        assert!(entry.has_word(" ELAN "));
        assert!(!entry.has_word("elán"));
    }

    #[test]
    fn test_entry_json_field_order() {
        let entry = Entry {
            date: date::parse_date("2024-01-01").unwrap(),
            word: "elan".to_string(),
            explanation: "geestdrift".to_string(),
            example: "Met veel elan.".to_string(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(
            json,
            r#"{"date":"2024-01-01","word":"elan","explanation":"geestdrift","example":"Met veel elan."}"#
        );
    }

    #[test]
    fn test_candidate_requires_every_field() {
        assert!(serde_json::from_str::<Candidate>(r#"{"error": "rate limited"}"#).is_err());
        let partial = r#"{"word": "elan", "explanation": "vuur"}"#;
        assert!(serde_json::from_str::<Candidate>(partial).is_err());
    }

    #[test]
    fn test_verdict_reason_defaults_to_empty() {
        let verdict: Verdict = serde_json::from_str(r#"{"valid": true}"#).unwrap();
        assert!(verdict.valid);
        assert!(verdict.reason.is_empty());
    }
}
