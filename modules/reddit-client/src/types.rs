use serde::Deserialize;

/// Flair tag marking clip/media posts on r/soccer. Only these are eligible
/// for goal matching.
pub const MEDIA_FLAIR: &str = "Media";

/// One candidate hit from a search, already shaped for matching.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Canonical link URL (usually the hosted clip).
    pub url: String,
    pub title: String,
    /// The discussion thread on reddit.com.
    pub post_url: String,
    pub flair: Option<String>,
}

impl SearchResult {
    pub fn is_media(&self) -> bool {
        self.flair.as_deref() == Some(MEDIA_FLAIR)
    }
}

// --- Listing wire types (both channels return the same shape) ---

#[derive(Debug, Deserialize)]
pub(crate) struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListingData {
    #[serde(default)]
    pub children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListingChild {
    pub data: PostData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PostData {
    #[serde(default)]
    pub title: String,
    /// Link posts carry the external clip URL here; self posts omit it.
    pub url: Option<String>,
    #[serde(default)]
    pub permalink: String,
    pub link_flair_text: Option<String>,
}

impl PostData {
    pub(crate) fn into_search_result(self) -> SearchResult {
        let post_url = format!("https://www.reddit.com{}", self.permalink);
        SearchResult {
            url: self.url.unwrap_or_else(|| post_url.clone()),
            title: self.title,
            post_url,
            flair: self.link_flair_text,
        }
    }
}

/// Decode a listing into media-flaired search results, dropping everything
/// else.
pub(crate) fn media_results(listing: Listing) -> Vec<SearchResult> {
    listing
        .data
        .children
        .into_iter()
        .map(|child| child.data.into_search_result())
        .filter(|result| result.is_media())
        .collect()
}
