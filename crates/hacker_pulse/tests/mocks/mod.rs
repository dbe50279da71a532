#![allow(dead_code)]

pub mod content_fetcher;
pub mod datastore;
pub mod story_source;
pub mod summarizer;
pub mod synthesizer;
