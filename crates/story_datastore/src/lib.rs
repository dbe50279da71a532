//! # DataStore Module
//!
//! This module provides functionality for persisting the per-story summaries
//! produced for a podcast episode.
//!
//! Summaries are stored as JSON lines (one `{"Title", "URL", "Summary"}` object
//! per line), which keeps every episode's source material greppable and lets a
//! re-run of the same episode reuse summaries it already paid for.

mod datastore;
mod domain;

pub use datastore::jsonl::JsonlStoryStore;
pub use datastore::{BulkInsertResult, FailedInsert, InsertFailReason, StoryStore};
pub use domain::{Story, StorySummary};
