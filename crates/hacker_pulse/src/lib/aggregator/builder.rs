use std::path::PathBuf;

use chrono::NaiveDate;
use chrono_tz::Tz;
use story_datastore::StoryStore;

use crate::{
    aggregator::{EpisodeAggregator, FailurePolicy},
    sources::{ContentFetcher, StorySource},
    Summarizer,
};

pub struct EpisodeAggregatorBuilder<D = (), S = (), P = (), F = ()> {
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

impl EpisodeAggregatorBuilder {
    pub fn new(outdir: impl Into<PathBuf>) -> Self {
        Self {
            outdir: outdir.into(),
            store: (),
            summarizer: (),
            source: (),
            fetcher: (),
            max_stories: 30,
            failure_policy: FailurePolicy::default(),
            timezone: chrono_tz::America::Los_Angeles,
            date: None,
            podcast_name: "HackerPulse".into(),
            narrator: "Data".into(),
            file_prefix: "hn".into(),
        }
    }
}

impl<D, S, P, F> EpisodeAggregatorBuilder<D, S, P, F> {
    pub fn store<D2: StoryStore + Send + Sync>(
        self,
        store: D2,
    ) -> EpisodeAggregatorBuilder<D2, S, P, F> {
        EpisodeAggregatorBuilder {
            outdir: self.outdir,
            store,
            summarizer: self.summarizer,
            source: self.source,
            fetcher: self.fetcher,
            max_stories: self.max_stories,
            failure_policy: self.failure_policy,
            timezone: self.timezone,
            date: self.date,
            podcast_name: self.podcast_name,
            narrator: self.narrator,
            file_prefix: self.file_prefix,
        }
    }

    pub fn summarizer<S2: Summarizer + Send + Sync>(
        self,
        summarizer: S2,
    ) -> EpisodeAggregatorBuilder<D, S2, P, F> {
        EpisodeAggregatorBuilder {
            outdir: self.outdir,
            store: self.store,
            summarizer,
            source: self.source,
            fetcher: self.fetcher,
            max_stories: self.max_stories,
            failure_policy: self.failure_policy,
            timezone: self.timezone,
            date: self.date,
            podcast_name: self.podcast_name,
            narrator: self.narrator,
            file_prefix: self.file_prefix,
        }
    }

    pub fn source<P2: StorySource + Send + Sync>(
        self,
        source: P2,
    ) -> EpisodeAggregatorBuilder<D, S, P2, F> {
        EpisodeAggregatorBuilder {
            outdir: self.outdir,
            store: self.store,
            summarizer: self.summarizer,
            source,
            fetcher: self.fetcher,
            max_stories: self.max_stories,
            failure_policy: self.failure_policy,
            timezone: self.timezone,
            date: self.date,
            podcast_name: self.podcast_name,
            narrator: self.narrator,
            file_prefix: self.file_prefix,
        }
    }

    pub fn fetcher<F2: ContentFetcher + Send + Sync>(
        self,
        fetcher: F2,
    ) -> EpisodeAggregatorBuilder<D, S, P, F2> {
        EpisodeAggregatorBuilder {
            outdir: self.outdir,
            store: self.store,
            summarizer: self.summarizer,
            source: self.source,
            fetcher,
            max_stories: self.max_stories,
            failure_policy: self.failure_policy,
            timezone: self.timezone,
            date: self.date,
            podcast_name: self.podcast_name,
            narrator: self.narrator,
            file_prefix: self.file_prefix,
        }
    }

    pub fn max_stories(mut self, max_stories: usize) -> Self {
        self.max_stories = max_stories;
        self
    }

    pub fn failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    pub fn timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Pins the air date instead of using today in the configured time zone
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn podcast_name(mut self, name: impl Into<String>) -> Self {
        self.podcast_name = name.into();
        self
    }

    pub fn narrator(mut self, narrator: impl Into<String>) -> Self {
        self.narrator = narrator.into();
        self
    }

    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }
}

impl<D, S, P, F> EpisodeAggregatorBuilder<D, S, P, F>
where
    D: StoryStore + Send + Sync,
    S: Summarizer + Send + Sync,
    P: StorySource + Send + Sync,
    F: ContentFetcher + Send + Sync,
{
    pub fn build(self) -> EpisodeAggregator<D, S, P, F> {
        EpisodeAggregator {
            outdir: self.outdir,
            store: self.store,
            summarizer: self.summarizer,
            source: self.source,
            fetcher: self.fetcher,
            max_stories: self.max_stories.max(1),
            failure_policy: self.failure_policy,
            timezone: self.timezone,
            date: self.date,
            podcast_name: self.podcast_name,
            narrator: self.narrator,
            file_prefix: self.file_prefix,
        }
    }
}
