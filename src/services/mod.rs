//! Service layer for the word feed.
//!
//! This module contains the capabilities the pipeline depends on:
//! - Candidate generation (`Generator`: `OpenAiGenerator`, `ConsolePrompt`)
//! - Independent verification (`Verifier`: `OpenAiVerifier`, `TrustOperator`)
//! - Human approval (`Approver`: `ConsoleApprover`, `AutoApprove`)
//! - Read-only date queries (`WordLookup`)

mod approval;
mod generator;
mod lookup;
pub mod openai;
mod verifier;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{Candidate, Verdict};

pub use approval::{AutoApprove, ConsoleApprover, Decision};
pub use generator::{ConsolePrompt, OpenAiGenerator, parse_candidates};
pub use lookup::WordLookup;
pub use verifier::{OpenAiVerifier, TrustOperator};

/// Produces candidate entries.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce up to `count` candidates, avoiding `existing_words` where it
    /// can. Callers re-check duplicates regardless.
    async fn generate(&self, existing_words: &[String], count: usize) -> Result<Vec<Candidate>>;
}

/// Judges a candidate independently of how it was produced.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(&self, candidate: &Candidate) -> Result<Verdict>;
}

/// Optional human gate between verification and commit.
#[async_trait]
pub trait Approver: Send + Sync {
    /// `allow_new` is false in batch mode, where a new candidate cannot be
    /// requested for the same date.
    async fn approve(
        &self,
        candidate: &Candidate,
        date: NaiveDate,
        allow_new: bool,
    ) -> Result<Decision>;
}
