// src/pipeline/publish.rs

//! Push committed words to the remote store.

use chrono::NaiveDate;

use crate::error::Result;
use crate::models::Entry;
use crate::storage::{CommitSummary, RecordSet, RemoteCommitter};
use crate::utils::date::format_date;

/// Entries on or after `since`, or all of them.
pub fn entries_since(records: &RecordSet, since: Option<NaiveDate>) -> Vec<Entry> {
    let entries = records.entries();
    let start = since.map_or(0, |s| entries.partition_point(|e| e.date < s));
    entries[start..].to_vec()
}

/// Commit `entries` to the remote store. Nothing to send is not an error.
pub async fn publish(
    committer: &RemoteCommitter,
    secret: &str,
    entries: &[Entry],
) -> Result<CommitSummary> {
    let (Some(first), Some(last)) = (entries.first(), entries.last()) else {
        log::info!("Nothing to push");
        return Ok(CommitSummary {
            added: Vec::new(),
            already_present: 0,
            commit_message: None,
        });
    };

    log::info!(
        "Pushing {} word(s) from {} to {}",
        entries.len(),
        format_date(first.date),
        format_date(last.date)
    );
    let summary = committer.commit(secret, entries).await?;
    if summary.already_present > 0 {
        log::info!("{} word(s) were already on the remote", summary.already_present);
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RemoteConfig;
    use crate::utils::date::parse_date;

    fn records() -> RecordSet {
        let entry = |date: &str, word: &str| Entry {
            date: parse_date(date).unwrap(),
            word: word.to_string(),
            explanation: "uitleg".to_string(),
            example: "zin".to_string(),
        };
        RecordSet::from_entries(vec![
            entry("2024-01-01", "elan"),
            entry("2024-01-02", "vigeur"),
            entry("2024-01-05", "zwier"),
        ])
        .unwrap()
    }

    #[test]
    fn test_entries_since() {
        let set = records();
        assert_eq!(entries_since(&set, None).len(), 3);

        let tail = entries_since(&set, Some(parse_date("2024-01-02").unwrap()));
        let words: Vec<_> = tail.iter().map(|e| e.word.as_str()).collect();
        assert_eq!(words, vec!["vigeur", "zwier"]);

        assert!(entries_since(&set, Some(parse_date("2024-02-01").unwrap())).is_empty());
    }

    #[tokio::test]
    async fn test_publish_nothing_skips_remote() {
        let config = RemoteConfig {
            repo: Some("owner/words".to_string()),
            token: Some("token".to_string()),
            api_base: "http://127.0.0.1:9".to_string(),
            ..RemoteConfig::default()
        };
        let committer = RemoteCommitter::from_config(&config, 1).unwrap();

        let summary = publish(&committer, "secret", &[]).await.unwrap();
        assert!(summary.added.is_empty());
        assert!(summary.commit_message.is_none());
    }
}
