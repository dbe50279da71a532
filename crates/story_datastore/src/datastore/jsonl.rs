use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use anyhow::Context;
use itertools::Itertools;
use tokio::io::AsyncWriteExt;

use crate::{
    datastore::{BulkInsertResult, FailedInsert, InsertFailReason, StoryStore},
    StorySummary,
};

/// Append-only JSON lines store, one file per episode
#[derive(Debug, Clone)]
pub struct JsonlStoryStore {
    path: PathBuf,
}

impl JsonlStoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads every summary in the file, in insertion order.
    /// A missing file is an empty store.
    pub async fn load_all(&self) -> anyhow::Result<Vec<StorySummary>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                tracing::error!(error = ?e, path = ?self.path, "Failed to read story store");
                return Err(e).context(format!("Failed to read {}", self.path.display()));
            }
        };

        contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str::<StorySummary>(line).with_context(|| {
                    format!("Malformed summary on line {} of {}", idx + 1, self.path.display())
                })
            })
            .collect()
    }
}

impl StoryStore for JsonlStoryStore {
    async fn get_existing_summaries(&self, urls: &[&str]) -> anyhow::Result<Vec<StorySummary>> {
        let wanted = urls.iter().copied().collect::<HashSet<_>>();

        let existing = self
            .load_all()
            .await?
            .into_iter()
            .filter(|s| wanted.contains(s.url.as_str()))
            .unique_by(|s| s.url.clone())
            .collect();

        Ok(existing)
    }

    async fn bulk_insert_summaries(
        &self,
        summaries: &[StorySummary],
    ) -> anyhow::Result<BulkInsertResult> {
        let mut seen = self
            .load_all()
            .await?
            .into_iter()
            .map(|s| s.url)
            .collect::<HashSet<_>>();

        let mut result = BulkInsertResult::default();
        let mut buffer = String::new();

        for summary in summaries {
            let reason = if summary.url.trim().is_empty() {
                Some(InsertFailReason::MissingUrl)
            } else if summary.summary.trim().is_empty() {
                Some(InsertFailReason::EmptySummary)
            } else if !seen.insert(summary.url.clone()) {
                Some(InsertFailReason::Duplicate)
            } else {
                None
            };

            if let Some(reason) = reason {
                tracing::warn!(url = %summary.url, ?reason, "Skipping summary insert");
                result.failed_inserts.push(FailedInsert {
                    url: summary.url.clone(),
                    reason,
                });
                continue;
            }

            buffer.push_str(&serde_json::to_string(summary)?);
            buffer.push('\n');
            result.successful_inserts += 1;
        }

        if buffer.is_empty() {
            return Ok(result);
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, path = ?self.path, "Failed to open story store"))
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        file.write_all(buffer.as_bytes()).await?;
        file.flush().await?;

        Ok(result)
    }
}
