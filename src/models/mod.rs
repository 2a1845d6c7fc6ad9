// src/models/mod.rs

//! Domain models for the word feed.

mod config;
mod entry;

// Re-export all public types
pub use config::{
    Config, GeneratorConfig, LoggingConfig, PipelineConfig, RemoteConfig, StoreConfig,
};
pub use entry::{Candidate, Entry, Verdict, normalize_word};
