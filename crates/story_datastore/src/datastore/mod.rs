use std::future::Future;

pub mod jsonl;

pub trait StoryStore {
    /// Returns the stored summaries whose URL is one of `urls`
    fn get_existing_summaries(
        &self,
        urls: &[&str],
    ) -> impl Future<Output = anyhow::Result<Vec<crate::StorySummary>>> + Send;

    fn bulk_insert_summaries(
        &self,
        summaries: &[crate::StorySummary],
    ) -> impl Future<Output = anyhow::Result<BulkInsertResult>> + Send;
}

impl<T: StoryStore + Send + Sync> StoryStore for &T {
    async fn get_existing_summaries(
        &self,
        urls: &[&str],
    ) -> anyhow::Result<Vec<crate::StorySummary>> {
        (**self).get_existing_summaries(urls).await
    }

    async fn bulk_insert_summaries(
        &self,
        summaries: &[crate::StorySummary],
    ) -> anyhow::Result<BulkInsertResult> {
        (**self).bulk_insert_summaries(summaries).await
    }
}

#[derive(Debug, Default)]
pub struct BulkInsertResult {
    pub successful_inserts: usize,
    pub failed_inserts: Vec<FailedInsert>,
}

#[derive(Debug)]
pub struct FailedInsert {
    pub url: String,
    pub reason: InsertFailReason,
}

#[derive(Debug, PartialEq, Eq)]
pub enum InsertFailReason {
    MissingUrl,
    EmptySummary,
    Duplicate,
}
