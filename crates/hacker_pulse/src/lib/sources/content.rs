use std::future::Future;

use reqwest::Client;

use super::FetchError;
use crate::parser::extract_paragraphs;

pub trait ContentFetcher {
    /// Readable paragraph text of the article at `url`
    fn fetch_content(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

impl<T: ContentFetcher + Sync> ContentFetcher for &T {
    fn fetch_content(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send {
        (**self).fetch_content(url)
    }
}

#[derive(Debug, Clone)]
pub struct HttpContentFetcher(pub Client);

impl HttpContentFetcher {
    const USER_AGENT: &'static str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
}

impl ContentFetcher for HttpContentFetcher {
    #[tracing::instrument(skip(self))]
    async fn fetch_content(&self, url: &str) -> Result<String, FetchError> {
        let http_error = |source| FetchError::Http {
            url: url.to_string(),
            source,
        };

        let resp = self
            .0
            .get(url)
            .header("User-Agent", Self::USER_AGENT)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.5")
            .header("Referer", "https://google.com")
            .send()
            .await
            .map_err(http_error)?;

        if !resp.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }

        let html = resp.text().await.map_err(http_error)?;

        Ok(extract_paragraphs(&html))
    }
}
