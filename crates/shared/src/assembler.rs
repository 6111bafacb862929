use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use tracing::warn;

use crate::counts::parse_count;
use crate::models::{
    truncate_chars, AccountToFollow, BriefingDocument, BriefingPost, Methodology, ScoredItem,
    MAX_BIO_CHARS, MAX_TEXT_CHARS,
};

const DEFAULT_PLAIN_ENGLISH: &str =
    "Searched X and SuperGrok for new accounts and YC founder tweets.";

/// Output sizes for one retrieval pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineLimits {
    pub posts: usize,
    pub accounts: usize,
}

impl PipelineLimits {
    /// Timeline pages scraped with the user's own session
    pub const TIMELINE: PipelineLimits = PipelineLimits {
        posts: 6,
        accounts: 2,
    };

    /// Remote browser-agent task
    pub const REMOTE_TASK: PipelineLimits = PipelineLimits {
        posts: 10,
        accounts: 3,
    };
}

pub struct BriefingAssembler {
    limits: PipelineLimits,
}

impl BriefingAssembler {
    pub fn new(limits: PipelineLimits) -> Self {
        Self { limits }
    }

    /// Build the document from already ranked items. Short inputs are passed
    /// through as-is; long ones are cut to the pipeline limits.
    pub fn assemble(
        &self,
        ranked: Vec<ScoredItem>,
        accounts: Vec<AccountToFollow>,
        methodology: Option<Methodology>,
        now: DateTime<Utc>,
    ) -> BriefingDocument {
        let posts: Vec<BriefingPost> = ranked
            .into_iter()
            .take(self.limits.posts)
            .map(BriefingPost::from)
            .collect();

        let accounts_to_follow: Vec<AccountToFollow> =
            accounts.into_iter().take(self.limits.accounts).collect();

        BriefingDocument {
            date: now.format("%Y-%m-%d").to_string(),
            scraped_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            posts,
            accounts_to_follow,
            methodology,
        }
    }

    /// Build the document from an agent-supplied JSON payload, coercing every
    /// field to a sane default.
    pub fn from_payload(
        &self,
        payload: &Value,
        default_searches: &[String],
        now: DateTime<Utc>,
    ) -> BriefingDocument {
        let posts: Vec<BriefingPost> = array_field(payload, "posts")
            .iter()
            .take(self.limits.posts)
            .map(coerce_post)
            .collect();

        let accounts_to_follow: Vec<AccountToFollow> = array_field(payload, "accountsToFollow")
            .iter()
            .take(self.limits.accounts)
            .map(coerce_account)
            .collect();

        if posts.len() < self.limits.posts {
            warn!(
                expected = self.limits.posts,
                got = posts.len(),
                "payload returned fewer posts than requested"
            );
        }
        if accounts_to_follow.len() < self.limits.accounts {
            warn!(
                expected = self.limits.accounts,
                got = accounts_to_follow.len(),
                "payload returned fewer accounts than requested"
            );
        }

        let methodology = coerce_methodology(payload.get("methodology"), default_searches);

        BriefingDocument {
            date: now.format("%Y-%m-%d").to_string(),
            scraped_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            posts,
            accounts_to_follow,
            methodology: Some(methodology),
        }
    }
}

fn array_field<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Strings pass through, numbers are stringified, anything empty or missing
/// becomes `fallback`.
fn coerce_string(value: Option<&Value>, fallback: &str) -> String {
    match value {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => fallback.to_string(),
    }
}

fn coerce_count(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => match n.as_u64() {
            Some(v) => v,
            None => n
                .as_f64()
                .filter(|f| f.is_finite() && *f > 0.0)
                .map(|f| f.round() as u64)
                .unwrap_or(0),
        },
        Some(Value::String(s)) => parse_count(Some(s)),
        _ => 0,
    }
}

fn coerce_post(raw: &Value) -> BriefingPost {
    BriefingPost {
        id: coerce_string(raw.get("id"), ""),
        text: truncate_chars(&coerce_string(raw.get("text"), ""), MAX_TEXT_CHARS),
        author_name: coerce_string(raw.get("authorName"), "Unknown"),
        author_handle: coerce_string(raw.get("authorHandle"), "unknown"),
        likes: coerce_count(raw.get("likes")),
        retweets: coerce_count(raw.get("retweets")),
        replies: coerce_count(raw.get("replies")),
        views: coerce_count(raw.get("views")),
        why_interesting: coerce_string(raw.get("whyInteresting"), "General interest"),
        url: coerce_string(raw.get("url"), ""),
    }
}

fn coerce_account(raw: &Value) -> AccountToFollow {
    AccountToFollow {
        handle: coerce_string(raw.get("handle"), "unknown"),
        name: coerce_string(raw.get("name"), "Unknown"),
        bio: truncate_chars(&coerce_string(raw.get("bio"), ""), MAX_BIO_CHARS),
        followers: coerce_count(raw.get("followers")),
        following: coerce_count(raw.get("following")),
        why_follow: coerce_string(raw.get("whyFollow"), ""),
        url: coerce_string(raw.get("url"), ""),
    }
}

fn coerce_methodology(raw: Option<&Value>, default_searches: &[String]) -> Methodology {
    let searches = raw
        .and_then(|m| m.get("searches"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .filter(|searches| !searches.is_empty())
        .unwrap_or_else(|| default_searches.to_vec());

    Methodology {
        searches,
        plain_english: coerce_string(raw.and_then(|m| m.get("plainEnglish")), DEFAULT_PLAIN_ENGLISH),
    }
}
