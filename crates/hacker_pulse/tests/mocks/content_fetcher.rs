use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use hacker_pulse::sources::{ContentFetcher, FetchError};

#[derive(Clone, Default)]
pub struct MockContentFetcher {
    pub failing_urls: HashSet<String>,
    pub empty_urls: HashSet<String>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockContentFetcher {
    pub fn failing_for(urls: &[&str]) -> Self {
        Self {
            failing_urls: urls.iter().map(|u| u.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn empty_for(urls: &[&str]) -> Self {
        Self {
            empty_urls: urls.iter().map(|u| u.to_string()).collect(),
            ..Default::default()
        }
    }
}

impl ContentFetcher for MockContentFetcher {
    async fn fetch_content(&self, url: &str) -> Result<String, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        if self.failing_urls.contains(url) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            });
        }
        if self.empty_urls.contains(url) {
            return Ok(String::new());
        }
        Ok(format!("Article text behind {url}."))
    }
}
