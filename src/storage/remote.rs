//! Remote system-of-record synchronization through the GitHub contents API.
//!
//! A commit reads the remote words file together with its blob `sha`,
//! merges the new entries, and writes the result back conditioned on that
//! `sha`. If someone else changed the file in between, GitHub refuses the
//! write and the whole batch fails.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Entry, RemoteConfig};
use crate::storage::{RecordSet, parse_store_json, to_store_json};
use crate::utils::http;

/// Result of a remote commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    /// Entries newly written to the remote store
    pub added: Vec<Entry>,
    /// Entries that were already present with the same word
    pub already_present: usize,
    /// Commit message used, if a write happened
    pub commit_message: Option<String>,
}

/// Remote words file as read, with the version it was read at.
#[derive(Debug, Clone)]
pub struct RemoteSnapshot {
    pub records: RecordSet,
    /// Blob sha; `None` when the file does not exist yet
    pub sha: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    content: String,
    sha: String,
}

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

/// Commits validated entries into the remote words file.
pub struct RemoteCommitter {
    client: Client,
    api_base: String,
    repo: String,
    path: String,
    branch: Option<String>,
    token: String,
    secret: Option<String>,
}

impl RemoteCommitter {
    /// Build a committer from configuration; missing credentials are a
    /// configuration error.
    pub fn from_config(config: &RemoteConfig, timeout_secs: u64) -> Result<Self> {
        let (repo, token) = config.require_credentials()?;
        let client = http::create_async_client(timeout_secs)?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            repo: repo.to_string(),
            path: config.path.trim_start_matches('/').to_string(),
            branch: config.branch.clone(),
            token: token.to_string(),
            secret: config.secret.clone(),
        })
    }

    fn contents_url(&self) -> String {
        format!("{}/repos/{}/contents/{}", self.api_base, self.repo, self.path)
    }

    fn location(&self) -> String {
        format!("github:{}/{}", self.repo, self.path)
    }

    /// Read the remote words file.
    pub async fn fetch(&self) -> Result<RemoteSnapshot> {
        let mut request = self
            .client
            .get(self.contents_url())
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github.v3+json");
        if let Some(branch) = &self.branch {
            request = request.query(&[("ref", branch)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            log::warn!("No remote words file at {}, starting empty", self.location());
            return Ok(RemoteSnapshot {
                records: RecordSet::new(),
                sha: None,
            });
        }
        if !status.is_success() {
            let body = http::error_body(response).await;
            return Err(AppError::remote(
                status.as_u16(),
                format!("cannot read {}: {}", self.location(), body),
            ));
        }

        let contents: ContentsResponse = response.json().await?;
        let bytes = decode_content(&contents.content)
            .map_err(|e| AppError::corrupt(self.location(), e))?;
        let records = parse_store_json(&bytes, &self.location())?;

        Ok(RemoteSnapshot {
            records,
            sha: Some(contents.sha),
        })
    }

    /// Merge `entries` into the remote store and write it back.
    ///
    /// The caller must present the configured shared secret. Entries already
    /// present with the same word are skipped; any other clash fails the
    /// whole batch before anything is written.
    pub async fn commit(&self, secret: &str, entries: &[Entry]) -> Result<CommitSummary> {
        if !secret_matches(self.secret.as_deref(), secret) {
            return Err(AppError::Unauthorized);
        }
        if entries.is_empty() {
            return Err(AppError::validation("no words to commit"));
        }

        let snapshot = self.fetch().await?;
        let (merged, added) = merge_entries(&snapshot.records, entries)?;
        let already_present = entries.len() - added.len();

        if added.is_empty() {
            log::info!("Remote already holds all {} entries", entries.len());
            return Ok(CommitSummary {
                added,
                already_present,
                commit_message: None,
            });
        }

        let message = commit_message(&added);
        let json = to_store_json(&merged)?;
        let body = UpdateRequest {
            message: &message,
            content: STANDARD.encode(json.as_bytes()),
            sha: snapshot.sha.as_deref(),
            branch: self.branch.as_deref(),
        };

        let response = self
            .client
            .put(self.contents_url())
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github.v3+json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::CONFLICT || status == StatusCode::PRECONDITION_FAILED {
            let body = http::error_body(response).await;
            return Err(AppError::Conflict(body));
        }
        if !status.is_success() {
            let body = http::error_body(response).await;
            return Err(AppError::remote(status.as_u16(), format!("commit failed: {body}")));
        }

        log::info!("Committed to {}: {}", self.location(), message);
        Ok(CommitSummary {
            added,
            already_present,
            commit_message: Some(message),
        })
    }
}

/// Merge new entries into a remote record set.
///
/// Returns the merged set and the entries that were actually new.
pub fn merge_entries(remote: &RecordSet, entries: &[Entry]) -> Result<(RecordSet, Vec<Entry>)> {
    let mut merged = remote.clone();
    let mut added = Vec::new();

    for entry in entries {
        if let Some(existing) = remote.get(entry.date) {
            if existing.has_word(&entry.word) {
                continue;
            }
            return Err(AppError::validation(format!(
                "{} already holds \"{}\" on the remote, refusing \"{}\"",
                entry.date_str(),
                existing.word,
                entry.word
            )));
        }
        merged.insert(entry.clone())?;
        added.push(entry.clone());
    }

    Ok((merged, added))
}

/// Commit message listing the added words.
pub fn commit_message(added: &[Entry]) -> String {
    let names: Vec<&str> = added.iter().map(|e| e.word.as_str()).collect();
    match names.as_slice() {
        [single] => format!("Add new word: {single}"),
        _ => format!("Add {} new words: {}", names.len(), names.join(", ")),
    }
}

/// GitHub wraps base64 content at 60 columns.
fn decode_content(content: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(compact)
}

/// Compare secrets without short-circuiting on the first differing byte.
fn secret_matches(expected: Option<&str>, given: &str) -> bool {
    let Some(expected) = expected else {
        return false;
    };
    if given.is_empty() || expected.len() != given.len() {
        return false;
    }
    expected
        .bytes()
        .zip(given.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
