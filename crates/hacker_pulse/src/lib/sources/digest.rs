use reqwest::Client;
use serde::Deserialize;
use story_datastore::Story;

use super::{get_json, FetchError, Interval, StorySource};
use crate::parser::parse_digest_issue;

/// Stories from the curated HackerNews digests published as GitHub issues
/// on `headllines/hackernews-daily` and `headllines/hackernews-weekly`.
#[derive(Debug, Clone)]
pub struct DigestSource {
    client: Client,
    base_url: String,
    owner: String,
    interval: Interval,
    github_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Issue {
    title: String,
    body: Option<String>,
}

impl DigestSource {
    pub fn new(client: Client, interval: Interval) -> Self {
        Self {
            client,
            base_url: "https://api.github.com".into(),
            owner: "headllines".into(),
            interval,
            github_token: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_github_token(mut self, token: Option<String>) -> Self {
        self.github_token = token.filter(|t| !t.is_empty());
        self
    }

    /// Digests only exist for daily and weekly rankings; monthly falls back to weekly.
    fn repo(&self) -> &'static str {
        match self.interval {
            Interval::Daily => "hackernews-daily",
            Interval::Weekly | Interval::Monthly => "hackernews-weekly",
        }
    }
}

impl StorySource for DigestSource {
    fn name(&self) -> &'static str {
        "HackerNews"
    }

    #[tracing::instrument(skip(self), fields(repo = self.repo()))]
    async fn fetch_stories(&self, limit: usize) -> Result<Vec<Story>, FetchError> {
        let url = format!(
            "{}/repos/{}/{}/issues?state=all&sort=created&direction=desc&per_page=1",
            self.base_url,
            self.owner,
            self.repo()
        );

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .header("User-Agent", "hacker-pulse");
        if let Some(token) = &self.github_token {
            request = request.bearer_auth(token);
        }

        let issues: Vec<Issue> = get_json(request, &url).await?;
        let issue = issues.into_iter().next().ok_or_else(|| FetchError::Decode {
            url: url.clone(),
            reason: "repository has no issues".into(),
        })?;

        tracing::info!(issue = %issue.title, "Parsing latest digest issue");

        let mut entries = parse_digest_issue(issue.body.as_deref().unwrap_or_default())
            .map_err(|e| FetchError::Decode {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        entries.sort_by_key(|e| e.rank);

        Ok(entries.into_iter().take(limit).map(Story::from).collect())
    }
}
