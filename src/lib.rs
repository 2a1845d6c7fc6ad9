// src/lib.rs

//! Wordfeed Library
//!
//! A daily vocabulary feed: one word per calendar date, generated and
//! independently verified before it is committed to a JSON store.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
