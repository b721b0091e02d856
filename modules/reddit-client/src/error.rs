use thiserror::Error;

pub type Result<T> = std::result::Result<T, RedditError>;

#[derive(Debug, Error)]
pub enum RedditError {
    /// Reddit substituted a challenge/bot-detection page for real data.
    #[error("reddit is blocking requests (challenge/bot detection)")]
    Blocked,

    /// Quota exhausted on the upstream side.
    #[error("rate limited by reddit (status {status})")]
    RateLimited { status: u16 },

    /// Network-level failure (connect, timeout, TLS).
    #[error("network error: {0}")]
    Transport(String),

    /// Payload failed structured decoding and does not look like a
    /// challenge page.
    #[error("unexpected payload: {0}")]
    Malformed(String),

    /// Non-success status that is neither a block nor a rate limit.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Token endpoint rejected the credential exchange.
    #[error("authentication failed (status {status}): {message}")]
    Auth { status: u16, message: String },

    /// OAuth credentials absent; the authenticated channel was never built.
    #[error("OAuth credentials not configured")]
    NotConfigured,

    /// The authenticated channel exists but has no live token.
    #[error("authenticated channel unavailable")]
    ChannelUnavailable,
}

impl RedditError {
    /// Error classes worth retrying on the public channel. Everything else
    /// propagates immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RedditError::Blocked | RedditError::RateLimited { .. } | RedditError::Malformed(_)
        )
    }

    pub(crate) fn from_status(status: u16, message: String) -> Self {
        match status {
            429 => RedditError::RateLimited { status },
            403 => RedditError::Blocked,
            _ => RedditError::Api { status, message },
        }
    }
}

impl From<reqwest::Error> for RedditError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RedditError::Malformed(err.to_string())
        } else {
            RedditError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classes() {
        assert!(RedditError::Blocked.is_retryable());
        assert!(RedditError::RateLimited { status: 429 }.is_retryable());
        assert!(RedditError::Malformed("bad json".into()).is_retryable());

        assert!(!RedditError::Transport("reset".into()).is_retryable());
        assert!(!RedditError::Api { status: 500, message: String::new() }.is_retryable());
        assert!(!RedditError::NotConfigured.is_retryable());
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            RedditError::from_status(429, String::new()),
            RedditError::RateLimited { status: 429 }
        ));
        assert!(matches!(RedditError::from_status(403, String::new()), RedditError::Blocked));
        assert!(matches!(
            RedditError::from_status(502, String::new()),
            RedditError::Api { status: 502, .. }
        ));
    }
}
