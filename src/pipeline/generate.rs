// src/pipeline/generate.rs

//! Generation pipeline: generator, dedup check, verifier, optional review,
//! commit.
//!
//! Each target date is an explicit bounded loop over attempts. Every attempt
//! ends in an [`AttemptOutcome`] and every date in a [`DateOutcome`], both
//! recorded in the [`RunReport`]. A commit is persisted before the next date
//! is started, so a failure later in the run never loses earlier words.

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};

use crate::error::Result;
use crate::models::{Candidate, Entry, PipelineConfig, normalize_word};
use crate::services::{Approver, Decision, Generator, Verifier};
use crate::storage::{RecordSet, WordStorage};
use crate::utils::date::{add_days, format_date, next_unused_date};

/// How candidates are requested from the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationMode {
    /// One generator call per attempt, one candidate per call
    #[default]
    Single,
    /// One generator call for all requested dates
    Batch,
}

/// What to generate.
#[derive(Debug, Clone, Copy)]
pub struct RunRequest {
    /// Number of consecutive dates to fill, starting at the next unused date
    pub days: usize,
    pub mode: GenerationMode,
    /// Reference day used when the store is empty
    pub today: NaiveDate,
}

/// Result of one single-mode attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Committed(Entry),
    /// Word already in the store or committed earlier in this run
    DuplicateRejected { word: String },
    /// Blank field or negative verdict
    InvalidRejected { reason: String },
    /// Reviewer declined the candidate
    UserRejected,
    /// Reviewer asked for another candidate
    NewRequested,
    /// Generator or verifier call failed
    AdapterFailed { message: String },
    /// Generator produced nothing
    NoCandidate,
}

/// Final state of one target date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateOutcome {
    Committed(Entry),
    Skipped { date: NaiveDate, reason: String },
    Exhausted { date: NaiveDate, attempts: u32 },
}

impl DateOutcome {
    pub fn date(&self) -> NaiveDate {
        match self {
            DateOutcome::Committed(entry) => entry.date,
            DateOutcome::Skipped { date, .. } | DateOutcome::Exhausted { date, .. } => *date,
        }
    }
}

/// Everything that happened during a run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// One outcome per target date, in date order
    pub outcomes: Vec<DateOutcome>,
    /// Every single-mode attempt, in the order it happened
    pub attempts: Vec<(NaiveDate, AttemptOutcome)>,
    pub generator_calls: usize,
    pub verifier_calls: usize,
    pub duplicates: usize,
    pub invalid: usize,
    pub adapter_failures: usize,
    pub user_rejections: usize,
}

impl RunReport {
    pub fn committed(&self) -> Vec<&Entry> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                DateOutcome::Committed(entry) => Some(entry),
                _ => None,
            })
            .collect()
    }

    pub fn skipped_dates(&self) -> Vec<NaiveDate> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, DateOutcome::Skipped { .. }))
            .map(DateOutcome::date)
            .collect()
    }

    pub fn exhausted_dates(&self) -> Vec<NaiveDate> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, DateOutcome::Exhausted { .. }))
            .map(DateOutcome::date)
            .collect()
    }
}

/// Drives candidates from a generator into the store.
pub struct GenerationPipeline<'a> {
    policy: PipelineConfig,
    storage: &'a dyn WordStorage,
    generator: &'a dyn Generator,
    verifier: &'a dyn Verifier,
    approver: Option<&'a dyn Approver>,
}

impl<'a> GenerationPipeline<'a> {
    pub fn new(
        policy: PipelineConfig,
        storage: &'a dyn WordStorage,
        generator: &'a dyn Generator,
        verifier: &'a dyn Verifier,
    ) -> Self {
        Self {
            policy,
            storage,
            generator,
            verifier,
            approver: None,
        }
    }

    /// Put a reviewer between verification and commit.
    pub fn with_approver(mut self, approver: &'a dyn Approver) -> Self {
        self.approver = Some(approver);
        self
    }

    /// Fill `request.days` dates starting at the next unused date.
    ///
    /// Fails only on store, I/O and configuration errors (including a retry
    /// policy that allows no calls); everything else is reported per date.
    pub async fn run(&self, request: RunRequest) -> Result<RunReport> {
        self.policy.validate()?;
        let mut records = self.storage.load().await?;
        let start = next_unused_date(records.entries(), request.today);
        let dates: Vec<NaiveDate> = (0..request.days)
            .map(|i| add_days(start, i as i64))
            .collect();

        log::info!(
            "Generating {} word(s) from {} ({:?} mode, {} in store)",
            dates.len(),
            format_date(start),
            request.mode,
            records.len()
        );

        let mut report = RunReport::default();
        match request.mode {
            GenerationMode::Single => {
                for &date in &dates {
                    let outcome = self.fill_date(&mut records, date, &mut report).await?;
                    report.outcomes.push(outcome);
                }
            }
            GenerationMode::Batch => {
                let outcomes = self.fill_batch(&mut records, &dates, &mut report).await?;
                report.outcomes = outcomes;
            }
        }

        log::info!(
            "Run finished: {} committed, {} skipped, {} exhausted",
            report.committed().len(),
            report.skipped_dates().len(),
            report.exhausted_dates().len()
        );
        Ok(report)
    }

    async fn fill_date(
        &self,
        records: &mut RecordSet,
        date: NaiveDate,
        report: &mut RunReport,
    ) -> Result<DateOutcome> {
        let mut attempts = 0u32;
        let mut duplicates = 0u32;

        while attempts < self.policy.max_retries {
            let outcome = self.attempt(records, date, report).await?;
            report.attempts.push((date, outcome.clone()));

            match outcome {
                AttemptOutcome::Committed(entry) => return Ok(DateOutcome::Committed(entry)),
                AttemptOutcome::DuplicateRejected { word } => {
                    duplicates += 1;
                    log::warn!("\"{}\" is already used, trying again", word);
                    if duplicates >= self.policy.max_duplicates {
                        log::warn!(
                            "Giving up on {} after {} duplicate(s)",
                            format_date(date),
                            duplicates
                        );
                        return Ok(DateOutcome::Exhausted { date, attempts });
                    }
                }
                AttemptOutcome::UserRejected => {
                    return Ok(DateOutcome::Skipped {
                        date,
                        reason: "rejected by reviewer".to_string(),
                    });
                }
                AttemptOutcome::NoCandidate => {
                    return Ok(DateOutcome::Skipped {
                        date,
                        reason: "no candidate".to_string(),
                    });
                }
                AttemptOutcome::InvalidRejected { reason } => {
                    attempts += 1;
                    log::warn!("Candidate rejected: {}", reason);
                }
                AttemptOutcome::AdapterFailed { message } => {
                    attempts += 1;
                    log::warn!("Attempt {} failed: {}", attempts, message);
                }
                AttemptOutcome::NewRequested => attempts += 1,
            }
        }

        log::warn!(
            "No word for {} after {} attempt(s), skipping",
            format_date(date),
            attempts
        );
        Ok(DateOutcome::Exhausted { date, attempts })
    }

    async fn attempt(
        &self,
        records: &mut RecordSet,
        date: NaiveDate,
        report: &mut RunReport,
    ) -> Result<AttemptOutcome> {
        report.generator_calls += 1;
        let candidates = match self.generator.generate(&records.words(), 1).await {
            Ok(candidates) => candidates,
            Err(e) if !e.is_fatal() => {
                report.adapter_failures += 1;
                return Ok(AttemptOutcome::AdapterFailed {
                    message: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        };
        let Some(candidate) = candidates.into_iter().next() else {
            return Ok(AttemptOutcome::NoCandidate);
        };

        if let Some(rejection) = screen(records, &candidate, report) {
            return Ok(rejection);
        }

        report.verifier_calls += 1;
        match self.verifier.verify(&candidate).await {
            Ok(verdict) if verdict.valid => {}
            Ok(verdict) => {
                report.invalid += 1;
                return Ok(AttemptOutcome::InvalidRejected {
                    reason: verdict.reason,
                });
            }
            Err(e) if !e.is_fatal() => {
                report.adapter_failures += 1;
                return Ok(AttemptOutcome::AdapterFailed {
                    message: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }

        if let Some(approver) = self.approver {
            match approver.approve(&candidate, date, true).await? {
                Decision::Approve => {}
                Decision::Reject => {
                    report.user_rejections += 1;
                    return Ok(AttemptOutcome::UserRejected);
                }
                Decision::RequestNew => return Ok(AttemptOutcome::NewRequested),
            }
        }

        let entry = self.commit(records, date, &candidate).await?;
        Ok(AttemptOutcome::Committed(entry))
    }

    async fn fill_batch(
        &self,
        records: &mut RecordSet,
        dates: &[NaiveDate],
        report: &mut RunReport,
    ) -> Result<Vec<DateOutcome>> {
        let mut calls = 0u32;
        let mut candidates = Vec::new();
        while calls < self.policy.max_retries {
            calls += 1;
            report.generator_calls += 1;
            match self.generator.generate(&records.words(), dates.len()).await {
                Ok(batch) => {
                    candidates = batch;
                    break;
                }
                Err(e) if !e.is_fatal() => {
                    report.adapter_failures += 1;
                    log::warn!("Batch generation attempt {} failed: {}", calls, e);
                }
                Err(e) => return Err(e),
            }
        }

        let mut seen = records.word_set();
        let mut screened = Vec::new();
        for candidate in candidates {
            if candidate.blank_field().is_some() {
                report.invalid += 1;
                continue;
            }
            if !seen.insert(normalize_word(&candidate.word)) {
                report.duplicates += 1;
                log::debug!("Dropping duplicate \"{}\" from batch", candidate.word.trim());
                continue;
            }
            screened.push(candidate);
        }

        let verdicts: Vec<_> = stream::iter(screened.iter().map(|c| self.verifier.verify(c)))
            .buffered(self.policy.verify_concurrency.max(1))
            .collect()
            .await;
        report.verifier_calls += screened.len();

        let mut accepted = Vec::new();
        for (candidate, verdict) in screened.into_iter().zip(verdicts) {
            match verdict {
                Ok(v) if v.valid => accepted.push(candidate),
                Ok(v) => {
                    report.invalid += 1;
                    log::debug!("Dropping \"{}\": {}", candidate.word.trim(), v.reason);
                }
                Err(e) if !e.is_fatal() => {
                    report.adapter_failures += 1;
                    log::warn!("Verification of \"{}\" failed: {}", candidate.word.trim(), e);
                }
                Err(e) => return Err(e),
            }
        }

        let mut accepted = accepted.into_iter();
        let mut outcomes = Vec::with_capacity(dates.len());
        for &date in dates {
            let outcome = loop {
                let Some(candidate) = accepted.next() else {
                    break DateOutcome::Exhausted {
                        date,
                        attempts: calls,
                    };
                };
                if let Some(approver) = self.approver {
                    if approver.approve(&candidate, date, false).await? != Decision::Approve {
                        report.user_rejections += 1;
                        continue;
                    }
                }
                break DateOutcome::Committed(self.commit(records, date, &candidate).await?);
            };
            outcomes.push(outcome);
        }

        let unfilled = outcomes
            .iter()
            .filter(|o| matches!(o, DateOutcome::Exhausted { .. }))
            .count();
        if unfilled > 0 {
            log::warn!("Batch left {} date(s) unfilled", unfilled);
        }
        Ok(outcomes)
    }

    /// Insert into the working set and persist the whole store.
    async fn commit(
        &self,
        records: &mut RecordSet,
        date: NaiveDate,
        candidate: &Candidate,
    ) -> Result<Entry> {
        let entry = Entry::from_candidate(date, candidate);
        records.insert(entry.clone())?;
        let meta = self.storage.save(records).await?;
        log::info!(
            "Committed \"{}\" for {} ({} entries in {})",
            entry.word,
            entry.date_str(),
            meta.entry_count,
            meta.location
        );
        Ok(entry)
    }
}

/// Cheap checks that need no adapter call. A known word is a duplicate even
/// when the rest of the candidate is blank.
fn screen(
    records: &RecordSet,
    candidate: &Candidate,
    report: &mut RunReport,
) -> Option<AttemptOutcome> {
    let word = candidate.word.trim();
    if !word.is_empty() && records.contains_word(word) {
        report.duplicates += 1;
        return Some(AttemptOutcome::DuplicateRejected {
            word: word.to_string(),
        });
    }
    if let Some(field) = candidate.blank_field() {
        report.invalid += 1;
        return Some(AttemptOutcome::InvalidRejected {
            reason: format!("empty {field}"),
        });
    }
    None
}
