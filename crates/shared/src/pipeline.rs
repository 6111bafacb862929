//! The two ways a briefing gets built.
//!
//! The timeline pipeline reads the user's own home feed and notifications,
//! ranks tweets locally and keeps the top 6. The remote-task pipeline asks a
//! Browser Use agent to search X and trusts its picks, keeping 10.

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::accounts::discover_accounts;
use crate::assembler::{BriefingAssembler, PipelineLimits};
use crate::browser_use::{BrowserUseClient, PollSettings};
use crate::config::Config;
use crate::dedup::dedupe_by_id;
use crate::models::{BriefingDocument, Methodology};
use crate::payload::decode_payload;
use crate::scoring::rank;
use crate::timeline::{extract_accounts, extract_tweets_from_pages, PageKind, PageSource};

pub const SEARCH_QUERIES: [&str; 2] = [
    "new accounts to follow that the accounts i follow follow",
    "new tweets by yc founders",
];

pub fn default_searches() -> Vec<String> {
    SEARCH_QUERIES.iter().map(|s| s.to_string()).collect()
}

pub fn build_task_prompt(searches: &[String], limits: PipelineLimits) -> String {
    let accounts_query = searches.first().map(String::as_str).unwrap_or(SEARCH_QUERIES[0]);
    let posts_query = searches.get(1).map(String::as_str).unwrap_or(SEARCH_QUERIES[1]);
    let searches_json = serde_json::to_string(searches).unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"You are a research assistant. Do the following on X (twitter.com) and SuperGrok:

1. Search X/SuperGrok for: "{accounts_query}"
   - From the results, find {accounts} interesting accounts to potentially follow.

2. Search X/SuperGrok for: "{posts_query}"
   - From the results, find {posts} interesting recent tweets worth replying to.

Return your results as STRICT JSON (no markdown fences, no extra text) with this exact shape:

{{
  "posts": [
    {{
      "id": "<tweet id or empty string>",
      "text": "<full tweet text>",
      "authorName": "<display name>",
      "authorHandle": "<handle without @>",
      "likes": <number>,
      "retweets": <number>,
      "replies": <number>,
      "views": <number or 0>,
      "whyInteresting": "<1-sentence reason>",
      "url": "<full tweet URL>"
    }}
  ],
  "accountsToFollow": [
    {{
      "handle": "<handle without @>",
      "name": "<display name>",
      "bio": "<short bio>",
      "followers": <number>,
      "following": <number>,
      "whyFollow": "<1-sentence reason>",
      "url": "<profile URL>"
    }}
  ],
  "methodology": {{
    "searches": {searches_json},
    "plainEnglish": "Searched X and SuperGrok for new accounts followed by mutual connections, and recent tweets by YC founders. Selected {posts} posts with high engagement or good reply opportunities, and {accounts} accounts with relevant overlap."
  }}
}}

posts must have exactly {posts} items. accountsToFollow must have exactly {accounts} items. All number fields must be integers (use 0 if unknown). Return ONLY the JSON object, nothing else."#,
        posts = limits.posts,
        accounts = limits.accounts,
    )
}

/// Run a Browser Use task and turn its output into a briefing.
///
/// Fails without producing a document if the task cannot be created, does
/// not finish in time, or returns output that holds no JSON object (the
/// error is a [`crate::payload::PayloadError`] carrying an excerpt).
pub async fn run_remote_task(
    config: &Config,
    client: &BrowserUseClient,
    poll: PollSettings,
    now: DateTime<Utc>,
) -> Result<BriefingDocument> {
    let limits = PipelineLimits::REMOTE_TASK;
    let searches = default_searches();

    let session_id = match &config.browser_use_profile_id {
        Some(profile_id) => {
            let id = client.create_session(profile_id).await?;
            info!(session_id = %id, "browser session created");
            Some(id)
        }
        None => None,
    };

    let prompt = build_task_prompt(&searches, limits);
    let task_id = client.create_task(&prompt, session_id.as_deref()).await?;
    info!(task_id = %task_id, "task created");

    let output = client.poll_until_done(&task_id, poll).await?;
    let payload = decode_payload(&output)?;

    Ok(BriefingAssembler::new(limits).from_payload(&payload, &searches, now))
}

/// Rank already retrieved timeline pages into a briefing.
pub fn assemble_timeline(
    home_pages: &[String],
    notification_pages: &[String],
    connect_pages: &[String],
    now: DateTime<Utc>,
) -> Result<BriefingDocument> {
    let limits = PipelineLimits::TIMELINE;

    let feed = extract_tweets_from_pages(home_pages)?;
    let notifications = extract_tweets_from_pages(notification_pages)?;
    let unique = dedupe_by_id(vec![feed, notifications]);
    info!(unique = unique.len(), "deduplicated tweets");

    let ranked = rank(unique);

    let mut candidates = Vec::new();
    for page in connect_pages {
        candidates.extend(extract_accounts(page)?);
    }
    let accounts = discover_accounts(candidates, limits.accounts);

    let methodology = Methodology {
        searches: vec![
            "Home timeline".to_string(),
            "Notifications".to_string(),
            "Who to follow".to_string(),
        ],
        plain_english: "Ranked tweets from your home timeline and notifications by engagement, topic relevance and reply opportunity, and picked suggested accounts whose bios match your topics.".to_string(),
    };

    Ok(BriefingAssembler::new(limits).assemble(ranked, accounts, Some(methodology), now))
}

/// Fetch the feed, notifications and suggestions pages and rank them.
pub async fn run_timeline(source: &PageSource, now: DateTime<Utc>) -> Result<BriefingDocument> {
    let (home, notifications, connect) = futures::try_join!(
        source.pages(PageKind::Home),
        source.pages(PageKind::Notifications),
        source.pages(PageKind::Connect),
    )?;

    assemble_timeline(&home, &notifications, &connect, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::PayloadError;
    use chrono::TimeZone;
    use serde_json::json;
    use std::path::PathBuf;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap()
    }

    fn config() -> Config {
        Config {
            browser_use_api_key: Some("key".to_string()),
            browser_use_profile_id: None,
            store_dir: PathBuf::from("/tmp/unused"),
            kv: None,
        }
    }

    fn fast_poll() -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(10),
            max_wait: Duration::from_millis(200),
        }
    }

    fn tweet(handle: &str, id: &str, text: &str, likes: u64) -> String {
        format!(
            r#"<article data-testid="tweet">
                 <div data-testid="User-Name"><span>{handle} name</span><span>@{handle}</span>
                   <a href="/{handle}/status/{id}">1h</a></div>
                 <div data-testid="tweetText">{text}</div>
                 <button data-testid="like"><span>{likes}</span></button>
               </article>"#
        )
    }

    async fn mock_task(server: &MockServer, output: &str) {
        Mock::given(method("POST"))
            .and(path("/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "t1" })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tasks/t1/status"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "status": "finished", "output": output })),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn test_prompt_mentions_counts_and_searches() {
        let prompt = build_task_prompt(&default_searches(), PipelineLimits::REMOTE_TASK);
        assert!(prompt.contains("posts must have exactly 10 items"));
        assert!(prompt.contains("accountsToFollow must have exactly 3 items"));
        assert!(prompt.contains("\"new tweets by yc founders\""));
        assert!(prompt.contains("\"whyInteresting\""));
    }

    #[test]
    fn test_assemble_timeline_dedupes_and_ranks() {
        let home = vec![format!(
            "{}{}{}",
            tweet("a", "1", "plain words", 1),
            tweet("b", "2", "bitcoin startup?", 10),
            tweet("c", "3", "database", 2000)
        )];
        let notifications = vec![format!(
            "{}{}",
            tweet("b", "2", "bitcoin startup? (seen again)", 10),
            tweet("d", "4", "who else is tired", 0)
        )];
        let connect = vec![r#"<div data-testid="UserCell"><span>Ada</span><span>@ada</span>
            <div dir="auto">Open source database hacker</div></div>"#
            .to_string()];

        let doc = assemble_timeline(&home, &notifications, &connect, now()).unwrap();

        let ids: Vec<&str> = doc.posts.iter().map(|p| p.id.as_str()).collect();
        // b: topics(+3) + reply(+2) = 5; c: high engagement(+3) + topic(+2) = 5; d: reply(+2); a: 0
        assert_eq!(ids, vec!["2", "3", "4", "1"]);
        assert_eq!(doc.posts[0].text, "bitcoin startup?");
        assert_eq!(doc.accounts_to_follow.len(), 1);
        assert_eq!(doc.accounts_to_follow[0].handle, "ada");
        assert_eq!(doc.date, "2026-02-01");
    }

    #[tokio::test]
    async fn test_run_timeline_from_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let page: String = (0..9)
            .map(|i| tweet("u", &i.to_string(), "plain", i))
            .collect();
        std::fs::write(dir.path().join("home-1.html"), page).unwrap();

        let source = PageSource::Snapshots(dir.path().to_path_buf());
        let doc = run_timeline(&source, now()).await.unwrap();
        assert_eq!(doc.posts.len(), 6);
        assert!(doc.accounts_to_follow.is_empty());
    }

    #[tokio::test]
    async fn test_run_remote_task_fenced_output() {
        let server = MockServer::start().await;
        let output = "```json\n{\"posts\": [{\"id\": \"9\", \"text\": \"hi\", \"likes\": \"2K\"}], \"accountsToFollow\": []}\n```";
        mock_task(&server, output).await;

        let client = BrowserUseClient::with_base_url("key".to_string(), server.uri()).unwrap();
        let doc = run_remote_task(&config(), &client, fast_poll(), now())
            .await
            .unwrap();

        assert_eq!(doc.posts.len(), 1);
        assert_eq!(doc.posts[0].likes, 2_000);
        assert_eq!(doc.posts[0].why_interesting, "General interest");
        assert_eq!(doc.methodology.unwrap().searches, default_searches());
    }

    #[tokio::test]
    async fn test_run_remote_task_malformed_output() {
        let server = MockServer::start().await;
        mock_task(&server, "I could not log in to X.").await;

        let client = BrowserUseClient::with_base_url("key".to_string(), server.uri()).unwrap();
        let err = run_remote_task(&config(), &client, fast_poll(), now())
            .await
            .unwrap_err();

        let payload_err = err.downcast_ref::<PayloadError>().unwrap();
        assert_eq!(payload_err.excerpt(), "I could not log in to X.");
    }
}
