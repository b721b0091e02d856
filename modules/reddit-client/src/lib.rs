pub mod antibot;
pub mod config;
pub mod error;
pub mod oauth;
pub mod public;
mod query;
pub mod rate_limit;
pub mod types;

pub use config::RedditCredentials;
pub use error::{RedditError, Result};
pub use oauth::OAuthFetcher;
pub use public::PublicFetcher;
pub use rate_limit::RateLimiter;
pub use types::{SearchResult, MEDIA_FLAIR};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Capability to search r/soccer for Media posts around a match time.
/// Implementations wait on their own rate limiter, scope the query to a
/// `[match_time - 24h, match_time + 48h]` window, and return only
/// media-flaired hits.
#[async_trait]
pub trait SearchFetcher: Send + Sync {
    async fn search(
        &self,
        query: &str,
        limit: u32,
        match_time: DateTime<Utc>,
    ) -> Result<Vec<SearchResult>>;

    fn name(&self) -> &str;
}
