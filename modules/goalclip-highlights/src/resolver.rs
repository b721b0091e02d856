use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use tracing::{debug, info, warn};

use reddit_client::{
    OAuthFetcher, PublicFetcher, RedditCredentials, SearchFetcher, SearchResult,
};

use crate::cache::GoalLinkCache;
use crate::matcher::{MatchSelector, TitleHeuristic};
use crate::types::{GoalInfo, GoalKey, GoalLink};

const SEARCH_LIMIT: u32 = 15;
const BATCH_SIZE: usize = 5;
const BATCH_DELAY: Duration = Duration::from_secs(2);

/// Retry schedule for the public channel. The authenticated channel never
/// retries; its failures surface immediately so the caller can react.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay: Duration::from_secs(30) }
    }
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub credentials: Option<RedditCredentials>,
    pub cache_path: PathBuf,
}

impl ResolverConfig {
    pub fn from_env() -> Self {
        let cache_path = std::env::var("GOALCLIP_CACHE_PATH")
            .unwrap_or_else(|_| "cache/goal_links.json".to_string());
        Self { credentials: RedditCredentials::from_env(), cache_path: cache_path.into() }
    }
}

enum SearchOutcome {
    Found(GoalLink),
    /// A search completed cleanly but matched nothing. Cacheable.
    NoMatch,
    /// Retries exhausted without a clean answer. Never cached, so the next
    /// resolution attempt starts fresh.
    GaveUp,
}

/// Resolves goals to r/soccer clip links. Prefers the authenticated channel
/// when a live token exists and falls back to the anonymous one otherwise.
/// Cache hits of either polarity short-circuit before any network traffic.
pub struct HighlightResolver {
    oauth: Option<OAuthFetcher>,
    public: Box<dyn SearchFetcher>,
    cache: GoalLinkCache,
    selector: Box<dyn MatchSelector>,
    retry: RetryPolicy,
    batch_delay: Duration,
}

impl HighlightResolver {
    /// Build a resolver from config. Credentials that are present but
    /// rejected by Reddit are a hard error; silently degrading to the
    /// public channel would hide a misconfiguration.
    pub async fn connect(config: ResolverConfig) -> anyhow::Result<Self> {
        let cache = GoalLinkCache::open(&config.cache_path)?;

        let oauth = match config.credentials {
            Some(creds) => {
                let fetcher = OAuthFetcher::connect(creds)
                    .await
                    .context("Reddit OAuth login failed")?;
                info!("Reddit OAuth channel ready");
                Some(fetcher)
            }
            None => {
                info!("No Reddit credentials configured, using public channel only");
                None
            }
        };

        Ok(Self {
            oauth,
            public: Box::new(PublicFetcher::default()),
            cache,
            selector: Box::new(TitleHeuristic),
            retry: RetryPolicy::default(),
            batch_delay: BATCH_DELAY,
        })
    }

    /// Public-channel resolver over a caller-supplied fetcher.
    pub fn with_fetcher(fetcher: Box<dyn SearchFetcher>, cache: GoalLinkCache) -> Self {
        Self {
            oauth: None,
            public: fetcher,
            cache,
            selector: Box::new(TitleHeuristic),
            retry: RetryPolicy::default(),
            batch_delay: BATCH_DELAY,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    pub fn with_selector(mut self, selector: Box<dyn MatchSelector>) -> Self {
        self.selector = selector;
        self
    }

    pub fn cache(&self) -> &GoalLinkCache {
        &self.cache
    }

    /// Resolve one goal. `Ok(None)` covers both "searched, no clip" and
    /// "gave up after retries"; only the former is memoized.
    pub async fn resolve(&self, goal: &GoalInfo) -> reddit_client::Result<Option<GoalLink>> {
        let key = goal.key();
        if let Some(outcome) = self.cache.get(&key) {
            debug!(goal = %key, "Cache hit");
            return Ok(outcome.link().cloned());
        }

        match self.search_goal(goal).await? {
            SearchOutcome::Found(link) => {
                if let Err(e) = self.cache.set_found(link.clone()) {
                    warn!(goal = %key, error = %e, "Failed to cache goal link");
                }
                Ok(Some(link))
            }
            SearchOutcome::NoMatch => {
                if let Err(e) = self.cache.set_not_found(key) {
                    warn!(goal = %key, error = %e, "Failed to cache negative result");
                }
                Ok(None)
            }
            SearchOutcome::GaveUp => Ok(None),
        }
    }

    /// Resolve a batch, deduplicated by goal key. Goals are fetched in
    /// chunks with a pause in between to stay friendly to the rate
    /// limiter. One goal failing never aborts the rest.
    pub async fn resolve_batch(&self, goals: &[GoalInfo]) -> HashMap<GoalKey, GoalLink> {
        let mut seen = HashSet::new();
        let mut links = HashMap::new();
        let mut pending = Vec::new();

        for goal in goals {
            let key = goal.key();
            if !seen.insert(key) {
                continue;
            }
            match self.cache.get(&key) {
                Some(outcome) => {
                    if let Some(link) = outcome.link() {
                        links.insert(key, link.clone());
                    }
                }
                None => pending.push(goal),
            }
        }

        for (i, chunk) in pending.chunks(BATCH_SIZE).enumerate() {
            if i > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
            for goal in chunk {
                match self.resolve(goal).await {
                    Ok(Some(link)) => {
                        links.insert(goal.key(), link);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(goal = %goal.key(), error = %e, "Goal resolution failed");
                    }
                }
            }
        }

        links
    }

    async fn search_goal(&self, goal: &GoalInfo) -> reddit_client::Result<SearchOutcome> {
        if let Some(oauth) = &self.oauth {
            if oauth.is_available().await {
                return self.search_goal_once(goal, oauth).await;
            }
            warn!("OAuth token unavailable, falling back to public channel");
        }

        let mut attempt = 0;
        loop {
            match self.search_goal_once(goal, self.public.as_ref()).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) if e.is_retryable() => {
                    attempt += 1;
                    if attempt >= self.retry.max_attempts {
                        warn!(
                            goal = %goal.key(),
                            attempts = attempt,
                            error = %e,
                            "Giving up on goal search"
                        );
                        return Ok(SearchOutcome::GaveUp);
                    }
                    let delay = self.retry.backoff(attempt);
                    debug!(goal = %goal.key(), attempt, delay_ms = delay.as_millis() as u64, "Retrying search");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One pass over both query strategies. The broad two-team query runs
    /// first and short-circuits on a match; otherwise its results are
    /// merged with the scoring-team query (primary hits first, urls
    /// deduplicated) and scored together.
    async fn search_goal_once(
        &self,
        goal: &GoalInfo,
        fetcher: &dyn SearchFetcher,
    ) -> reddit_client::Result<SearchOutcome> {
        let primary = format!("{} {} {}'", goal.home_team, goal.away_team, goal.minute);
        let primary_results = fetcher.search(&primary, SEARCH_LIMIT, goal.match_time).await?;
        debug!(
            channel = fetcher.name(),
            query = %primary,
            results = primary_results.len(),
            "Primary search done"
        );
        if let Some(result) = self.selector.select_best(&primary_results, goal) {
            return Ok(SearchOutcome::Found(Self::to_link(goal, result)));
        }

        let secondary = format!("{} {}'", goal.scoring_team(), goal.minute);
        let secondary_results = fetcher.search(&secondary, SEARCH_LIMIT, goal.match_time).await?;
        debug!(
            channel = fetcher.name(),
            query = %secondary,
            results = secondary_results.len(),
            "Secondary search done"
        );

        let mut urls = HashSet::new();
        let merged: Vec<SearchResult> = primary_results
            .into_iter()
            .chain(secondary_results)
            .filter(|result| urls.insert(result.url.clone()))
            .collect();

        match self.selector.select_best(&merged, goal) {
            Some(result) => Ok(SearchOutcome::Found(Self::to_link(goal, result))),
            None => Ok(SearchOutcome::NoMatch),
        }
    }

    fn to_link(goal: &GoalInfo, result: &SearchResult) -> GoalLink {
        GoalLink {
            match_id: goal.match_id,
            minute: goal.minute,
            url: result.url.clone(),
            title: result.title.clone(),
            post_url: result.post_url.clone(),
            fetched_at: Utc::now(),
        }
    }
}
