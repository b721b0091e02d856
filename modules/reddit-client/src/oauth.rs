use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::RedditCredentials;
use crate::error::{RedditError, Result};
use crate::query;
use crate::rate_limit::RateLimiter;
use crate::types::{self, Listing, SearchResult};
use crate::SearchFetcher;

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const SEARCH_URL: &str = "https://oauth.reddit.com/r/soccer/search.json";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Well under Reddit's 600 requests/hour OAuth ceiling.
const REQUESTS_PER_MINUTE: u32 = 10;

/// Tokens are refreshed this long before they actually expire.
const REFRESH_MARGIN_MINUTES: i64 = 5;

#[derive(Debug, Clone)]
pub(crate) struct TokenState {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: DateTime<Utc>,
}

impl TokenState {
    fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at - chrono::Duration::minutes(REFRESH_MARGIN_MINUTES)
    }

    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
}

/// Token-bearing fetcher for the OAuth search endpoint: generous quota and
/// no challenge pages, available only when credentials are configured and
/// the initial password grant succeeded.
pub struct OAuthFetcher {
    http: reqwest::Client,
    creds: RedditCredentials,
    token: RwLock<Option<TokenState>>,
    limiter: RateLimiter,
    token_url: String,
    search_url: String,
}

impl OAuthFetcher {
    /// Exchanges credentials for a token immediately; a failure here means
    /// the caller runs public-only.
    pub async fn connect(creds: RedditCredentials) -> Result<Self> {
        let fetcher = Self::with_endpoints(creds, TOKEN_URL, SEARCH_URL);
        let state = fetcher.authenticate().await?;
        *fetcher.token.write().await = Some(state);
        debug!("OAuth authentication succeeded");
        Ok(fetcher)
    }

    pub(crate) fn with_endpoints(
        creds: RedditCredentials,
        token_url: &str,
        search_url: &str,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            creds,
            token: RwLock::new(None),
            limiter: RateLimiter::per_minute(REQUESTS_PER_MINUTE),
            token_url: token_url.to_string(),
            search_url: search_url.to_string(),
        }
    }

    /// True iff a token is present and not yet expired. Takes only the
    /// shared lock so availability probes never block each other.
    pub async fn is_available(&self) -> bool {
        self.token
            .read()
            .await
            .as_ref()
            .is_some_and(|state| state.is_live(Utc::now()))
    }

    fn user_agent(&self) -> String {
        format!("{0}:v1.0.0 (by /u/{0})", self.creds.username)
    }

    async fn token_exchange(&self, params: &[(&str, &str)]) -> Result<TokenState> {
        let resp = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.creds.client_id, Some(&self.creds.client_secret))
            .header("User-Agent", self.user_agent())
            .form(params)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(RedditError::Auth { status: status.as_u16(), message });
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| RedditError::Malformed(format!("parse token response: {e}")))?;

        Ok(TokenState {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: Utc::now() + chrono::Duration::seconds(token.expires_in),
        })
    }

    async fn authenticate(&self) -> Result<TokenState> {
        debug!("Requesting OAuth token (password grant)");
        self.token_exchange(&[
            ("grant_type", "password"),
            ("username", &self.creds.username),
            ("password", &self.creds.password),
        ])
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenState> {
        debug!("Refreshing OAuth token");
        let mut state = self
            .token_exchange(&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)])
            .await?;
        // Reddit may omit the refresh token on renewal; keep the old one.
        if state.refresh_token.is_none() {
            state.refresh_token = Some(refresh_token.to_string());
        }
        Ok(state)
    }

    /// Return a live access token, refreshing or re-authenticating when the
    /// current one is absent or within the refresh margin. Double-checked
    /// locking keeps concurrent callers from stacking redundant exchanges.
    async fn ensure_valid_token(&self) -> Result<String> {
        {
            let token = self.token.read().await;
            if let Some(state) = token.as_ref() {
                if !state.needs_refresh(Utc::now()) {
                    return Ok(state.access_token.clone());
                }
            }
        }

        let mut token = self.token.write().await;
        // Re-check: another caller may have refreshed while we waited.
        if let Some(state) = token.as_ref() {
            if !state.needs_refresh(Utc::now()) {
                return Ok(state.access_token.clone());
            }
        }

        let refresh_token = token.as_ref().and_then(|state| state.refresh_token.clone());
        let state = match refresh_token {
            Some(rt) => match self.refresh(&rt).await {
                Ok(state) => state,
                Err(e) => {
                    warn!(error = %e, "OAuth refresh failed, re-authenticating");
                    self.authenticate().await?
                }
            },
            None => self.authenticate().await?,
        };

        let access_token = state.access_token.clone();
        *token = Some(state);
        Ok(access_token)
    }
}

#[async_trait]
impl SearchFetcher for OAuthFetcher {
    async fn search(
        &self,
        text: &str,
        limit: u32,
        match_time: DateTime<Utc>,
    ) -> Result<Vec<SearchResult>> {
        self.limiter.wait().await;
        let access_token = self.ensure_valid_token().await?;

        let url =
            query::search_url(&self.search_url, &query::flair_scoped_query(text, match_time), limit)?;
        debug!(query = text, "OAuth search");

        let resp = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .header("User-Agent", self.user_agent())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(RedditError::from_status(status.as_u16(), message));
        }

        let listing: Listing = resp
            .json()
            .await
            .map_err(|e| RedditError::Malformed(format!("parse search response: {e}")))?;

        Ok(types::media_results(listing))
    }

    fn name(&self) -> &str {
        "oauth"
    }
}
