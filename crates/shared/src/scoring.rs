use regex::Regex;
use std::sync::OnceLock;

use crate::models::{CandidateItem, ScoredItem};

/// Topics the briefing cares about. Matched case-insensitively at the start
/// of a word, so "startups" counts for "startup".
pub const TOPIC_VOCABULARY: &[&str] = &[
    // crypto
    "crypto",
    "bitcoin",
    "ethereum",
    "solana",
    "defi",
    "web3",
    "blockchain",
    "stablecoin",
    // AI
    "openai",
    "anthropic",
    "llm",
    "gpt",
    "machine learning",
    "artificial intelligence",
    "ai agent",
    "neural",
    // startups and venture
    "startup",
    "founder",
    "yc",
    "y combinator",
    "venture",
    "fundraising",
    "seed round",
    "series a",
    "product market fit",
    "saas",
    // engineering
    "open source",
    "typescript",
    "devtools",
    "infrastructure",
    "kubernetes",
    "database",
];

/// Phrases that tend to invite replies.
pub const REPLY_MARKERS: &[&str] = &[
    "hot take",
    "unpopular opinion",
    "thoughts?",
    "debate",
    "disagree",
    "controversial",
    "thread",
    "who else",
    "am i wrong",
    "change my mind",
    "what do you think",
    "agree or disagree",
];

const FALLBACK_REASON: &str = "General interest";

/// Acronyms this short ("yc", "defi") must stand as a whole word, optionally
/// plural, or they hit "bicycle" and "definitely".
const WHOLE_WORD_MAX_CHARS: usize = 4;

fn term_pattern(term: &str) -> Regex {
    let escaped = regex::escape(term);
    let pattern = if term.chars().count() <= WHOLE_WORD_MAX_CHARS {
        format!(r"(?i)\b{}s?\b", escaped)
    } else {
        format!(r"(?i)\b{}", escaped)
    };
    Regex::new(&pattern).expect("topic pattern is valid")
}

fn topic_patterns() -> &'static [(&'static str, Regex)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        TOPIC_VOCABULARY
            .iter()
            .map(|term| (*term, term_pattern(term)))
            .collect()
    })
}

/// Number of distinct vocabulary entries present in `text`.
pub fn topic_score(text: &str) -> usize {
    topic_patterns()
        .iter()
        .filter(|(_, pattern)| pattern.is_match(text))
        .count()
}

/// Vocabulary entries present in `text`, in vocabulary order.
pub fn matched_topics(text: &str) -> Vec<&'static str> {
    topic_patterns()
        .iter()
        .filter(|(_, pattern)| pattern.is_match(text))
        .map(|(term, _)| *term)
        .collect()
}

pub fn is_reply_opportunity(text: &str) -> bool {
    if text.contains('?') {
        return true;
    }
    let lower = text.to_lowercase();
    REPLY_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// likes + 2×retweets + 3×replies
pub fn engagement(item: &CandidateItem) -> u64 {
    item.likes
        .saturating_add(item.retweets.saturating_mul(2))
        .saturating_add(item.replies.saturating_mul(3))
}

/// Score one candidate. Every heuristic is additive and independent.
pub fn score_item(item: CandidateItem) -> ScoredItem {
    let mut score = 0i64;
    let mut labels: Vec<&str> = Vec::new();

    let engagement = engagement(&item);
    if engagement > 1000 {
        score += 3;
        labels.push("High engagement");
    } else if engagement > 200 {
        score += 2;
        labels.push("Strong engagement");
    } else if engagement > 50 {
        score += 1;
    }

    let topics = topic_score(&item.text);
    if topics >= 2 {
        score += 3;
        labels.push("Highly relevant topics");
    } else if topics >= 1 {
        score += 2;
        labels.push("Relevant topic");
    }

    if is_reply_opportunity(&item.text) {
        score += 2;
        labels.push("Good reply opportunity");
    }

    // Never fires when likes == 0, even for busy threads.
    if item.replies > 0 && item.likes > 0 && item.replies as f64 / item.likes as f64 > 0.3 {
        score += 1;
        labels.push("Active discussion");
    }

    let reason = if labels.is_empty() {
        FALLBACK_REASON.to_string()
    } else {
        labels.join(" · ")
    };

    ScoredItem {
        item,
        score,
        reason,
    }
}

/// Score every candidate and order by descending score.
/// Equal scores keep their encounter order.
pub fn rank(items: Vec<CandidateItem>) -> Vec<ScoredItem> {
    let mut scored: Vec<ScoredItem> = items.into_iter().map(score_item).collect();
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored
}
