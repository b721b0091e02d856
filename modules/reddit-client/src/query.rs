use chrono::{DateTime, Duration, Utc};
use url::Url;

use crate::error::{RedditError, Result};

/// Goals are posted within hours of happening; the window tolerates clock
/// skew and late reposts.
const WINDOW_BEFORE_HOURS: i64 = 24;
const WINDOW_AFTER_HOURS: i64 = 48;

/// Search text restricted to Media-flaired posts created around the match.
/// Reddit CloudSearch understands `timestamp:START..END`.
pub(crate) fn flair_scoped_query(text: &str, match_time: DateTime<Utc>) -> String {
    let start = (match_time - Duration::hours(WINDOW_BEFORE_HOURS)).timestamp();
    let end = (match_time + Duration::hours(WINDOW_AFTER_HOURS)).timestamp();
    format!("{text} flair:Media timestamp:{start}..{end}")
}

/// Full search URL for either channel's endpoint.
pub(crate) fn search_url(base: &str, query: &str, limit: u32) -> Result<Url> {
    Url::parse_with_params(
        base,
        &[
            ("q", query),
            ("restrict_sr", "on"),
            ("sort", "relevance"),
            ("limit", &limit.to_string()),
        ],
    )
    .map_err(|e| RedditError::Malformed(format!("search url: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn query_carries_flair_and_time_window() {
        let kickoff = Utc.with_ymd_and_hms(2024, 3, 10, 15, 0, 0).unwrap();
        let q = flair_scoped_query("Arsenal Chelsea 23'", kickoff);

        let start = kickoff.timestamp() - 24 * 3600;
        let end = kickoff.timestamp() + 48 * 3600;
        assert_eq!(q, format!("Arsenal Chelsea 23' flair:Media timestamp:{start}..{end}"));
    }

    #[test]
    fn url_escapes_query_text() {
        let url = search_url(
            "https://www.reddit.com/r/soccer/search.json",
            "Brighton & Hove 45'",
            15,
        )
        .unwrap();

        assert_eq!(url.query_pairs().count(), 4);
        let q = url.query_pairs().find(|(k, _)| k == "q").unwrap().1.into_owned();
        assert_eq!(q, "Brighton & Hove 45'");
        assert!(url.as_str().contains("limit=15"));
    }
}
