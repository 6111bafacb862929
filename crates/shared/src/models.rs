use serde::{Deserialize, Serialize};

/// Maximum characters of tweet text kept at ingestion.
pub const MAX_TEXT_CHARS: usize = 500;

/// Maximum characters of an account bio.
pub const MAX_BIO_CHARS: usize = 280;

/// Truncate to at most `max` characters without splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

/// A raw tweet as retrieved, before scoring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateItem {
    pub id: String,
    pub text: String,
    pub author_name: String,
    pub author_handle: String,
    pub likes: u64,
    pub retweets: u64,
    pub replies: u64,
    pub views: u64,
}

impl CandidateItem {
    /// Build a candidate, enforcing the text length limit.
    pub fn new(
        id: impl Into<String>,
        text: &str,
        author_name: impl Into<String>,
        author_handle: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            text: truncate_chars(text, MAX_TEXT_CHARS),
            author_name: author_name.into(),
            author_handle: author_handle.into(),
            likes: 0,
            retweets: 0,
            replies: 0,
            views: 0,
        }
    }

    pub fn with_counts(mut self, likes: u64, retweets: u64, replies: u64, views: u64) -> Self {
        self.likes = likes;
        self.retweets = retweets;
        self.replies = replies;
        self.views = views;
        self
    }

    /// Canonical link to the tweet, or the author's profile when the id is unknown.
    pub fn url(&self) -> String {
        if self.id.is_empty() {
            profile_url(&self.author_handle)
        } else {
            format!("https://x.com/{}/status/{}", self.author_handle, self.id)
        }
    }
}

pub fn profile_url(handle: &str) -> String {
    format!("https://x.com/{}", handle)
}

/// A candidate with its ranking score and rationale
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredItem {
    pub item: CandidateItem,
    pub score: i64,
    pub reason: String,
}

/// A potential account to follow, as retrieved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountCandidate {
    pub handle: String,
    pub name: String,
    pub bio: String,
    pub followers: u64,
    pub following: u64,
}

impl AccountCandidate {
    pub fn new(handle: impl Into<String>, name: impl Into<String>, bio: &str) -> Self {
        Self {
            handle: handle.into(),
            name: name.into(),
            bio: truncate_chars(bio, MAX_BIO_CHARS),
            followers: 0,
            following: 0,
        }
    }
}

/// A post as published in the briefing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BriefingPost {
    pub id: String,
    pub text: String,
    pub author_name: String,
    pub author_handle: String,
    pub likes: u64,
    pub retweets: u64,
    pub replies: u64,
    #[serde(default)]
    pub views: u64,
    pub why_interesting: String,
    pub url: String,
}

impl From<ScoredItem> for BriefingPost {
    fn from(scored: ScoredItem) -> Self {
        let url = scored.item.url();
        let item = scored.item;
        Self {
            id: item.id,
            text: item.text,
            author_name: item.author_name,
            author_handle: item.author_handle,
            likes: item.likes,
            retweets: item.retweets,
            replies: item.replies,
            views: item.views,
            why_interesting: scored.reason,
            url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountToFollow {
    pub handle: String,
    pub name: String,
    pub bio: String,
    pub followers: u64,
    pub following: u64,
    pub why_follow: String,
    pub url: String,
}

/// How the briefing was gathered, in the words shown to the reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Methodology {
    pub searches: Vec<String>,
    pub plain_english: String,
}

/// The single persisted daily briefing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BriefingDocument {
    pub date: String,
    pub scraped_at: String,
    pub posts: Vec<BriefingPost>,
    pub accounts_to_follow: Vec<AccountToFollow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methodology: Option<Methodology>,
}
