//! Storage abstractions for the word store.
//!
//! The store is one JSON array of entries, sorted by date ascending and
//! rewritten as a whole on every commit.
//!
//! ```text
//! data/
//! ├── config.toml    # Configuration
//! └── words.json     # Word store: [{date, word, explanation, example}, ...]
//! ```

pub mod local;
pub mod memory;
pub mod remote;

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{AppError, Result};
use crate::models::{Entry, normalize_word};

// Re-export for convenience
pub use local::LocalStorage;
pub use memory::MemoryStorage;
pub use remote::{CommitSummary, RemoteCommitter};

/// Metadata about a storage write operation.
#[derive(Debug, Clone)]
pub struct WriteMetadata {
    /// Number of entries written
    pub entry_count: usize,
    /// Human-readable location of the store
    pub location: String,
    /// Timestamp of the write
    pub timestamp: DateTime<Utc>,
}

/// Trait for word store backends.
#[async_trait]
pub trait WordStorage: Send + Sync {
    /// Load the full store. A store that does not exist yet is empty.
    async fn load(&self) -> Result<RecordSet>;

    /// Replace the persisted store with `records`, atomically.
    async fn save(&self, records: &RecordSet) -> Result<WriteMetadata>;

    /// Where this backend keeps its data.
    fn location(&self) -> String;
}

/// In-memory word store: entries ordered by date, one entry per date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    entries: Vec<Entry>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record set from entries in any order.
    ///
    /// Fails on a blank text field or on two entries sharing a date. A
    /// word repeated across dates is tolerated with a warning.
    pub fn from_entries(mut entries: Vec<Entry>) -> std::result::Result<Self, String> {
        entries.sort_by_key(|e| e.date);

        for (i, entry) in entries.iter().enumerate() {
            if let Some(field) = entry.blank_field() {
                return Err(format!("entry for {} has an empty {}", entry.date_str(), field));
            }
            if i > 0 && entries[i - 1].date == entry.date {
                return Err(format!("more than one entry for {}", entry.date_str()));
            }
        }

        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(normalize_word(&entry.word)) {
                log::warn!(
                    "Word \"{}\" appears more than once (again on {})",
                    entry.word,
                    entry.date_str()
                );
            }
        }

        Ok(Self { entries })
    }

    /// Entries in ascending date order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for an exact date.
    pub fn get(&self, date: NaiveDate) -> Option<&Entry> {
        self.entries
            .binary_search_by_key(&date, |e| e.date)
            .ok()
            .map(|i| &self.entries[i])
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.get(date).is_some()
    }

    pub fn contains_word(&self, word: &str) -> bool {
        contains_word_case_insensitive(&self.entries, word)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.entries.first().map(|e| e.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.entries.last().map(|e| e.date)
    }

    /// Words as written, for use as a generator blocklist.
    pub fn words(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.word.clone()).collect()
    }

    /// Normalized word keys for case-insensitive dedup.
    pub fn word_set(&self) -> HashSet<String> {
        self.entries.iter().map(|e| normalize_word(&e.word)).collect()
    }

    /// Insert an entry at its date position.
    ///
    /// Refuses an occupied date, a blank field, or a word already present.
    pub fn insert(&mut self, entry: Entry) -> Result<()> {
        if let Some(field) = entry.blank_field() {
            return Err(AppError::validation(format!(
                "entry for {} has an empty {}",
                entry.date_str(),
                field
            )));
        }
        if self.contains_word(&entry.word) {
            return Err(AppError::validation(format!(
                "word \"{}\" is already in the store",
                entry.word
            )));
        }
        match self.entries.binary_search_by_key(&entry.date, |e| e.date) {
            Ok(_) => Err(AppError::DateTaken(entry.date_str())),
            Err(pos) => {
                self.entries.insert(pos, entry);
                Ok(())
            }
        }
    }
}

/// Case-insensitive membership test over a slice of entries.
pub fn contains_word_case_insensitive(entries: &[Entry], candidate_word: &str) -> bool {
    entries.iter().any(|e| e.has_word(candidate_word))
}

/// Serialize entries the way the store is persisted: pretty JSON, two-space
/// indentation, trailing newline.
pub fn to_store_json(records: &RecordSet) -> Result<String> {
    let mut json = serde_json::to_string_pretty(records.entries())?;
    json.push('\n');
    Ok(json)
}

/// Parse persisted store content. Any failure is a corrupt store.
pub fn parse_store_json(bytes: &[u8], location: &str) -> Result<RecordSet> {
    let entries: Vec<Entry> =
        serde_json::from_slice(bytes).map_err(|e| AppError::corrupt(location, e))?;
    RecordSet::from_entries(entries).map_err(|message| AppError::corrupt(location, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::date::parse_date;

    fn entry(date: &str, word: &str) -> Entry {
        Entry {
            date: parse_date(date).unwrap(),
            word: word.to_string(),
            explanation: format!("uitleg van {word}"),
            example: format!("Een zin met {word}."),
        }
    }

    #[test]
    fn test_from_entries_sorts_by_date() {
        let records = RecordSet::from_entries(vec![
            entry("2024-01-03", "c"),
            entry("2024-01-01", "a"),
            entry("2024-01-02", "b"),
        ])
        .unwrap();

        let words: Vec<_> = records.entries().iter().map(|e| e.word.as_str()).collect();
        assert_eq!(words, vec!["a", "b", "c"]);
        assert_eq!(records.first_date(), Some(parse_date("2024-01-01").unwrap()));
        assert_eq!(records.last_date(), Some(parse_date("2024-01-03").unwrap()));
    }

    #[test]
    fn test_from_entries_rejects_duplicate_date() {
        let result = RecordSet::from_entries(vec![
            entry("2024-01-01", "a"),
            entry("2024-01-01", "b"),
        ]);
        assert!(result.unwrap_err().contains("2024-01-01"));
    }

    #[test]
    fn test_insert_keeps_order_and_refuses_taken_date() {
        let mut records = RecordSet::new();
        records.insert(entry("2024-01-05", "e")).unwrap();
        records.insert(entry("2024-01-01", "a")).unwrap();

        assert_eq!(records.entries()[0].word, "a");
        assert!(matches!(
            records.insert(entry("2024-01-05", "other")),
            Err(AppError::DateTaken(_))
        ));
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_insert_refuses_word_in_any_case() {
        let mut records = RecordSet::new();
        records.insert(entry("2024-01-01", "Elan")).unwrap();
        assert!(records.insert(entry("2024-01-02", "elan")).is_err());
    }

    #[test]
    fn test_contains_word_case_insensitive() {
        let entries = vec![entry("2024-01-01", "Vigeur")];
        assert!(contains_word_case_insensitive(&entries, "vigeur"));
        assert!(contains_word_case_insensitive(&entries, "VIGEUR"));
        assert!(!contains_word_case_insensitive(&entries, "vigueur"));
    }

    #[test]
    fn test_store_json_round_trip_only_sorts() {
        let raw = r#"[
  {"date": "2024-01-02", "word": "b", "explanation": "x", "example": "y"},
  {"date": "2024-01-01", "word": "a", "explanation": "x", "example": "y"}
]"#;
        let records = parse_store_json(raw.as_bytes(), "test").unwrap();
        let json = to_store_json(&records).unwrap();

        assert!(json.ends_with("}\n]\n"));
        assert!(json.starts_with("[\n  {\n    \"date\": \"2024-01-01\""));

        let reparsed = parse_store_json(json.as_bytes(), "test").unwrap();
        assert_eq!(reparsed, records);
        assert_eq!(to_store_json(&reparsed).unwrap(), json);
    }

    #[test]
    fn test_parse_store_json_reports_corruption() {
        for bad in [
            "{not json",
            r#"[{"date": "2024-13-01", "word": "a", "explanation": "x", "example": "y"}]"#,
            r#"[{"date": "2024-01-01", "word": " ", "explanation": "x", "example": "y"}]"#,
            r#"[{"date": "2024-01-01", "word": "a"}]"#,
        ] {
            assert!(matches!(
                parse_store_json(bad.as_bytes(), "words.json"),
                Err(AppError::CorruptStore { .. })
            ));
        }
    }
}
