//! Pipeline entry points.
//!
//! - `GenerationPipeline`: fill upcoming dates with verified words
//! - `publish`: push committed words to the remote store

pub mod generate;
pub mod publish;

pub use generate::{
    AttemptOutcome, DateOutcome, GenerationMode, GenerationPipeline, RunReport, RunRequest,
};
pub use publish::{entries_since, publish};
