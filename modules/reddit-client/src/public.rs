use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::antibot;
use crate::error::{RedditError, Result};
use crate::query;
use crate::rate_limit::RateLimiter;
use crate::types::{self, Listing, SearchResult};
use crate::SearchFetcher;

const SEARCH_URL: &str = "https://www.reddit.com/r/soccer/search.json";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Kept low to stay clear of challenge-page territory.
const REQUESTS_PER_MINUTE: u32 = 5;

/// Fetcher for Reddit's public JSON endpoints. No credentials, strict
/// quota, and a real chance of challenge pages under load; requests carry
/// browser-like headers and a rotated identity to compensate.
pub struct PublicFetcher {
    http: reqwest::Client,
    base_url: String,
    limiter: RateLimiter,
}

impl PublicFetcher {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            base_url: SEARCH_URL.to_string(),
            limiter: RateLimiter::per_minute(REQUESTS_PER_MINUTE),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_rate_limit(mut self, min_interval: Duration) -> Self {
        self.limiter = RateLimiter::with_interval(min_interval);
        self
    }
}

impl Default for PublicFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchFetcher for PublicFetcher {
    async fn search(
        &self,
        text: &str,
        limit: u32,
        match_time: DateTime<Utc>,
    ) -> Result<Vec<SearchResult>> {
        self.limiter.wait().await;

        let url =
            query::search_url(&self.base_url, &query::flair_scoped_query(text, match_time), limit)?;
        let user_agent = self.limiter.next_user_agent().await;
        debug!(query = text, "Public search");

        let resp = self
            .http
            .get(url.clone())
            .header("User-Agent", user_agent)
            .header("Accept", "application/json, text/javascript, */*; q=0.01")
            .header("Accept-Language", "en-US,en;q=0.9,*;q=0.5")
            .header("DNT", "1")
            .header("Connection", "keep-alive")
            .header("Upgrade-Insecure-Requests", "1")
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "none")
            .header("Cache-Control", "max-age=0")
            .send()
            .await?;

        let status = resp.status();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = resp.text().await?;

        if !status.is_success() {
            self.limiter.record_challenge().await;
            warn!(status = status.as_u16(), "Public search rejected");
            return Err(RedditError::from_status(status.as_u16(), body));
        }

        if antibot::is_challenge_page(&body) {
            self.limiter.record_challenge().await;
            warn!(url = %url, "Public search returned a challenge page");
            return Err(RedditError::Blocked);
        }

        let listing: Listing = match serde_json::from_str(&body) {
            Ok(listing) => listing,
            Err(e) => {
                if antibot::is_html_document(&body, content_type.as_deref()) {
                    self.limiter.record_challenge().await;
                    warn!(url = %url, "Public search returned HTML instead of JSON");
                    return Err(RedditError::Blocked);
                }
                return Err(RedditError::Malformed(format!("parse search response: {e}")));
            }
        };

        Ok(types::media_results(listing))
    }

    fn name(&self) -> &str {
        "public"
    }
}
