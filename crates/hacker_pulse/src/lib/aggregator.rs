pub mod builder;

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::NaiveDate;
use chrono_tz::Tz;
use itertools::Itertools;
use serde::Serialize;
use story_datastore::{Story, StoryStore, StorySummary};

use crate::{
    cost::{CostEntry, CostTracker},
    llm::summarizer::{EpisodeContext, Summarizer, Usage},
    sources::{ContentFetcher, StorySource},
};

/// What to do when a single story cannot be fetched or summarized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FailurePolicy {
    /// Fail the whole episode
    Abort,
    /// Leave the story out; at least one story must still succeed
    #[default]
    SkipFailed,
}

/// Files written for one episode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodePaths {
    pub transcript: PathBuf,
    pub metadata: PathBuf,
    pub summaries: PathBuf,
}

impl EpisodePaths {
    pub fn new(outdir: &Path, prefix: &str, date: NaiveDate) -> Self {
        let stamp = date.format("%m%d%Y");
        Self {
            transcript: outdir.join(format!("{prefix}_transcript_{stamp}.txt")),
            metadata: outdir.join(format!("{prefix}_episode_{stamp}.json")),
            summaries: outdir.join(format!("{prefix}_jsonl_{stamp}.txt")),
        }
    }
}

#[derive(Debug, Serialize)]
struct EpisodeMetadataFile<'a> {
    title: &'a str,
    description: &'a str,
    cost: f64,
}

#[derive(Debug)]
pub struct Episode {
    pub date: NaiveDate,
    pub paths: EpisodePaths,
    pub title: String,
    pub description: String,
    /// In story order, reused ones included
    pub summaries: Vec<StorySummary>,
    /// URLs of the stories left out under [`FailurePolicy::SkipFailed`]
    pub failed_stories: Vec<String>,
    pub costs: CostTracker,
}

impl Episode {
    pub fn cost(&self) -> f64 {
        self.costs.total()
    }
}

/// Fetches the top stories of a source, summarizes each one and writes the
/// episode transcript, metadata and summary log.
#[derive(Debug)]
pub struct EpisodeAggregator<D, S, P, F>
where
    D: StoryStore + Send + Sync,
    S: Summarizer + Send + Sync,
    P: StorySource + Send + Sync,
    F: ContentFetcher + Send + Sync,
{
    outdir: PathBuf,
    store: D,
    summarizer: S,
    source: P,
    fetcher: F,
    max_stories: usize,
    failure_policy: FailurePolicy,
    timezone: Tz,
    date: Option<NaiveDate>,
    podcast_name: String,
    narrator: String,
    file_prefix: String,
}

impl<D, S, P, F> EpisodeAggregator<D, S, P, F>
where
    D: StoryStore + Send + Sync,
    S: Summarizer + Send + Sync,
    P: StorySource + Send + Sync,
    F: ContentFetcher + Send + Sync,
{
    /// Air date of the episode in the configured time zone
    pub fn episode_date(&self) -> NaiveDate {
        self.date
            .unwrap_or_else(|| chrono::Utc::now().with_timezone(&self.timezone).date_naive())
    }

    pub fn paths(&self) -> EpisodePaths {
        EpisodePaths::new(&self.outdir, &self.file_prefix, self.episode_date())
    }

    fn record_usage(&self, costs: &mut CostTracker, label: String, usage: Usage) -> anyhow::Result<()> {
        costs.record_entry(CostEntry::new(
            label,
            usage.total_tokens,
            S::PRICE_PER_MILLION_TOKENS,
        ))?;
        Ok(())
    }

    /// Summaries already stored for these stories, keyed by URL
    #[tracing::instrument(skip_all)]
    async fn existing_summaries(&self, stories: &[Story]) -> anyhow::Result<HashMap<String, StorySummary>> {
        let urls = stories.iter().map(|s| s.url.as_str()).collect::<Vec<_>>();
        let existing = self
            .store
            .get_existing_summaries(&urls)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to get existing summaries"))
            .context("Failed to get existing summaries")?;

        Ok(existing
            .into_iter()
            .map(|summary| (summary.url.clone(), summary))
            .collect())
    }

    #[tracing::instrument(skip(self, context, costs), fields(url = %story.url))]
    async fn summarize_story(
        &self,
        story: &Story,
        context: &EpisodeContext,
        costs: &mut CostTracker,
    ) -> anyhow::Result<StorySummary> {
        let content = self
            .fetcher
            .fetch_content(&story.url)
            .await
            .with_context(|| format!("[fetch] {}", story.url))?;

        if content.trim().is_empty() {
            anyhow::bail!("[fetch] {}: no readable content", story.url);
        }

        let completion = self
            .summarizer
            .summarize_story(story, &content, context)
            .await
            .map_err(|e| anyhow::anyhow!("[summarize] {}: {e}", story.url))?;

        self.record_usage(costs, format!("llm:summary:{}", story.url), completion.usage)?;

        Ok(StorySummary::new(story, completion.text))
    }

    #[tracing::instrument(skip(self), fields(source = self.source.name(), max_stories = self.max_stories))]
    pub async fn run(&self) -> anyhow::Result<Episode> {
        let date = self.episode_date();
        let paths = EpisodePaths::new(&self.outdir, &self.file_prefix, date);
        let mut costs = CostTracker::new();

        let stories = self
            .source
            .fetch_stories(self.max_stories)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to fetch stories"))
            .with_context(|| format!("[fetch] failed to list {} stories", self.source.name()))?
            .into_iter()
            .unique_by(|s| s.url.clone())
            .collect::<Vec<_>>();

        if stories.is_empty() {
            anyhow::bail!("[fetch] {} returned no stories", self.source.name());
        }
        tracing::info!(count = stories.len(), "Summarizing stories");

        let context = EpisodeContext {
            podcast_name: self.podcast_name.clone(),
            narrator: self.narrator.clone(),
            source_label: self.source.name().to_string(),
            date: date.format("%B %-d, %Y").to_string(),
        };

        let mut existing = self.existing_summaries(&stories).await?;
        let mut summaries = Vec::with_capacity(stories.len());
        let mut new_summaries = Vec::new();
        let mut failed_stories = Vec::new();

        for story in &stories {
            if let Some(summary) = existing.remove(&story.url) {
                tracing::debug!(url = %story.url, "Reusing stored summary");
                summaries.push(summary);
                continue;
            }

            match self.summarize_story(story, &context, &mut costs).await {
                Ok(summary) => {
                    new_summaries.push(summary.clone());
                    summaries.push(summary);
                }
                Err(e) if self.failure_policy == FailurePolicy::SkipFailed => {
                    tracing::warn!(error = %e, url = %story.url, "Skipping story");
                    failed_stories.push(story.url.clone());
                }
                Err(e) => {
                    tracing::error!(error = %e, url = %story.url, "Aborting episode");
                    return Err(e);
                }
            }
        }

        if summaries.is_empty() {
            anyhow::bail!("[summarize] none of the {} stories could be summarized", stories.len());
        }

        if let Some(parent) = paths.summaries.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        if !new_summaries.is_empty() {
            let result = self
                .store
                .bulk_insert_summaries(&new_summaries)
                .await
                .context("Failed to store story summaries")?;
            for failed in &result.failed_inserts {
                tracing::warn!(url = %failed.url, reason = ?failed.reason, "Summary not stored");
            }
        }

        let body = summaries.iter().map(|s| s.summary.as_str()).join("\n\n");

        let introduction = self
            .summarizer
            .introduction(&body, &context)
            .await
            .map_err(|e| anyhow::anyhow!("[summarize] introduction: {e}"))?;
        self.record_usage(&mut costs, "llm:introduction".into(), introduction.usage)?;

        let conclusion = self
            .summarizer
            .conclusion(&body, &context)
            .await
            .map_err(|e| anyhow::anyhow!("[summarize] conclusion: {e}"))?;
        self.record_usage(&mut costs, "llm:conclusion".into(), conclusion.usage)?;

        let (metadata, usage) = self
            .summarizer
            .episode_metadata(&body, &context)
            .await
            .map_err(|e| anyhow::anyhow!("[summarize] episode metadata: {e}"))?;
        self.record_usage(&mut costs, "llm:metadata".into(), usage)?;

        let transcript = format!("{}\n\n{body}\n\n{}", introduction.text, conclusion.text);
        tokio::fs::write(&paths.transcript, transcript)
            .await
            .with_context(|| format!("Failed to write {}", paths.transcript.display()))?;

        let metadata_json = serde_json::to_string_pretty(&EpisodeMetadataFile {
            title: &metadata.title,
            description: &metadata.description,
            cost: costs.total(),
        })?;
        tokio::fs::write(&paths.metadata, metadata_json)
            .await
            .with_context(|| format!("Failed to write {}", paths.metadata.display()))?;

        tracing::info!(
            summaries = summaries.len(),
            failed = failed_stories.len(),
            cost = costs.total(),
            transcript = %paths.transcript.display(),
            "Episode transcript written"
        );

        Ok(Episode {
            date,
            paths,
            title: metadata.title,
            description: metadata.description,
            summaries,
            failed_stories,
            costs,
        })
    }
}
