use std::sync::{Arc, Mutex};

use story_datastore::{BulkInsertResult, StoryStore, StorySummary};

#[derive(Clone, Default)]
pub struct MockStoryStore {
    pub existing: Vec<StorySummary>,
    pub inserted: Arc<Mutex<Vec<StorySummary>>>,
    pub fail_with: Option<String>,
}

impl MockStoryStore {
    pub fn with_existing(existing: Vec<StorySummary>) -> Self {
        Self {
            existing,
            ..Default::default()
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

impl StoryStore for MockStoryStore {
    async fn get_existing_summaries(&self, urls: &[&str]) -> anyhow::Result<Vec<StorySummary>> {
        Ok(self
            .existing
            .iter()
            .filter(|s| urls.contains(&s.url.as_str()))
            .cloned()
            .collect())
    }

    async fn bulk_insert_summaries(
        &self,
        summaries: &[StorySummary],
    ) -> anyhow::Result<BulkInsertResult> {
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        self.inserted.lock().unwrap().extend_from_slice(summaries);
        Ok(BulkInsertResult {
            successful_inserts: summaries.len(),
            failed_inserts: Vec::new(),
        })
    }
}
