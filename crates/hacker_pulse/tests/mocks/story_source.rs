use std::sync::{Arc, Mutex};

use hacker_pulse::sources::{FetchError, StorySource};
use story_datastore::Story;

#[derive(Clone)]
pub struct MockStorySource {
    pub name: &'static str,
    pub stories: Vec<Story>,
    pub calls: Arc<Mutex<Vec<usize>>>,
    pub fail_with: Option<u16>,
}

impl MockStorySource {
    pub fn new(stories: Vec<Story>) -> Self {
        Self {
            name: "HackerNews",
            stories,
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    /// `count` stories titled `Story 0`, `Story 1`, ...
    pub fn numbered(count: usize) -> Self {
        Self::new(
            (0..count)
                .map(|i| Story::new(format!("Story {i}"), format!("https://example.com/{i}")))
                .collect(),
        )
    }

    pub fn named(name: &'static str, count: usize) -> Self {
        Self {
            name,
            ..Self::numbered(count)
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            fail_with: Some(status),
            ..Self::new(Vec::new())
        }
    }
}

impl StorySource for MockStorySource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch_stories(&self, limit: usize) -> Result<Vec<Story>, FetchError> {
        self.calls.lock().unwrap().push(limit);
        if let Some(status) = self.fail_with {
            return Err(FetchError::Status {
                url: "mock://topstories".into(),
                status,
            });
        }
        Ok(self.stories.iter().take(limit).cloned().collect())
    }
}
