use std::env;
use std::fmt;

/// Credentials for the authenticated (OAuth) channel. All four values are
/// required together; partial configuration is treated as none.
#[derive(Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
}

impl RedditCredentials {
    /// Read `REDDIT_CLIENT_ID`, `REDDIT_CLIENT_SECRET`, `REDDIT_USERNAME`
    /// and `REDDIT_PASSWORD`. Returns `None` unless all four are present
    /// and non-empty.
    pub fn from_env() -> Option<Self> {
        Some(Self {
            client_id: non_empty("REDDIT_CLIENT_ID")?,
            client_secret: non_empty("REDDIT_CLIENT_SECRET")?,
            username: non_empty("REDDIT_USERNAME")?,
            password: non_empty("REDDIT_PASSWORD")?,
        })
    }
}

impl fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
