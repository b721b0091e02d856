use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// How long after a challenge detection the limiter stays conservative.
const CHALLENGE_COOLDOWN: Duration = Duration::from_secs(10 * 60);

/// Identities rotated across requests to reduce fingerprinting. The app
/// identity comes first; the rest mimic common browsers.
const USER_AGENTS: &[&str] = &[
    "goalclip:v1.0.0 (by /u/goalclip_app)",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
];

#[derive(Debug, Default)]
struct LimiterState {
    last_request: Option<Instant>,
    challenge_count: u32,
    last_challenge: Option<Instant>,
    agent_index: usize,
}

/// Adaptive per-channel rate limiter. `wait()` holds the lock across its
/// sleep, so concurrent callers queue up behind it — that serialization is
/// the intended backpressure mechanism.
pub struct RateLimiter {
    min_interval: Duration,
    cooldown: Duration,
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    pub fn per_minute(requests_per_minute: u32) -> Self {
        Self::with_interval(Duration::from_secs(60) / requests_per_minute.max(1))
    }

    pub fn with_interval(min_interval: Duration) -> Self {
        Self {
            min_interval,
            cooldown: CHALLENGE_COOLDOWN,
            state: Mutex::new(LimiterState::default()),
        }
    }

    #[cfg(test)]
    fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Block until at least the minimum interval has elapsed since the last
    /// permitted call, then record the new call time. The interval doubles
    /// while a recent challenge is inside the cooldown window.
    pub async fn wait(&self) {
        let mut state = self.state.lock().await;

        let mut interval = self.min_interval;
        if state.challenge_count > 0
            && state.last_challenge.is_some_and(|at| at.elapsed() < self.cooldown)
        {
            interval *= 2;
        }

        if let Some(last) = state.last_request {
            let elapsed = last.elapsed();
            if elapsed < interval {
                tokio::time::sleep(interval - elapsed).await;
            }
        }
        state.last_request = Some(Instant::now());
    }

    /// Note that the upstream just served a challenge page (or otherwise
    /// signalled abuse); escalates subsequent waits for the cooldown window.
    pub async fn record_challenge(&self) {
        let mut state = self.state.lock().await;
        state.challenge_count += 1;
        state.last_challenge = Some(Instant::now());
    }

    /// Next request identity, pure round-robin.
    pub async fn next_user_agent(&self) -> &'static str {
        let mut state = self.state.lock().await;
        let agent = USER_AGENTS[state.agent_index];
        state.agent_index = (state.agent_index + 1) % USER_AGENTS.len();
        agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enforces_min_interval() {
        let limiter = RateLimiter::with_interval(Duration::from_millis(50));

        let start = Instant::now();
        limiter.wait().await; // first call is free
        limiter.wait().await;
        limiter.wait().await;

        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn doubles_interval_after_challenge() {
        let limiter = RateLimiter::with_interval(Duration::from_millis(50));
        limiter.record_challenge().await;

        let start = Instant::now();
        limiter.wait().await;
        limiter.wait().await;
        limiter.wait().await;

        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn challenge_escalation_expires_after_cooldown() {
        let limiter = RateLimiter::with_interval(Duration::from_millis(50))
            .with_cooldown(Duration::from_millis(10));
        limiter.record_challenge().await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let start = Instant::now();
        limiter.wait().await;
        limiter.wait().await;

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn user_agents_rotate_round_robin() {
        let limiter = RateLimiter::per_minute(5);

        let first = limiter.next_user_agent().await;
        for _ in 1..USER_AGENTS.len() {
            assert_ne!(limiter.next_user_agent().await, first);
        }
        // Full cycle wraps back to the start.
        assert_eq!(limiter.next_user_agent().await, first);
    }
}
