use serde::{Deserialize, Serialize};

/// A story discovered on one of the aggregated sources
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Story {
    pub title: String,
    pub url: String,
}

impl Story {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// A story together with its LLM generated summary.
///
/// Field names on the wire match the historical JSONL episode files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorySummary {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Summary")]
    pub summary: String,
}

impl StorySummary {
    pub fn new(story: &Story, summary: impl Into<String>) -> Self {
        Self {
            title: story.title.clone(),
            url: story.url.clone(),
            summary: summary.into(),
        }
    }

    pub fn story(&self) -> Story {
        Story::new(&self.title, &self.url)
    }
}
