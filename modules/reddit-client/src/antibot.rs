//! Heuristic classification of challenge/bot-detection pages. False
//! negatives are tolerated; the phrases are specific enough that false
//! positives should be rare.

/// Phrases Reddit's blocking pages are known to contain.
const CHALLENGE_PHRASES: &[&str] = &[
    "prove your humanity",
    "captcha",
    "robot",
    "automated",
    "blocked",
    "rate limit",
    "too many requests",
];

/// True if the body reads like a challenge or bot-detection page.
pub fn is_challenge_page(body: &str) -> bool {
    let lower = body.to_lowercase();
    CHALLENGE_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

/// True if a response that should have been JSON is actually an HTML
/// document. Used after a decode failure: such responses are treated as
/// challenge pages even without a phrase match.
pub fn is_html_document(body: &str, content_type: Option<&str>) -> bool {
    if content_type.is_some_and(|ct| ct.to_lowercase().contains("text/html")) {
        return true;
    }
    let lower = body.to_lowercase();
    lower.contains("<html") || lower.contains("<!doctype html")
}
