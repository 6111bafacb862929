//! Timeline retrieval for the session-based pipeline.
//!
//! Pages come either from x.com directly (authenticated with the user's
//! browser cookies) or from a directory of saved page snapshots. Tweets and
//! suggested accounts are pulled out of the markup by their `data-testid`
//! attributes.

use anyhow::{anyhow, Context, Result};
use cookie_store::CookieStore;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use url::Url;

use crate::cookies::cookie_header;
use crate::counts::parse_count;
use crate::models::{AccountCandidate, CandidateItem};

pub const X_BASE_URL: &str = "https://x.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Home,
    Notifications,
    Connect,
}

impl PageKind {
    fn path(&self) -> &'static str {
        match self {
            PageKind::Home => "/home",
            PageKind::Notifications => "/notifications",
            PageKind::Connect => "/i/connect_people",
        }
    }

    /// File name prefix of saved snapshots, e.g. `home-1.html`.
    fn snapshot_prefix(&self) -> &'static str {
        match self {
            PageKind::Home => "home",
            PageKind::Notifications => "notifications",
            PageKind::Connect => "connect",
        }
    }
}

/// Authenticated page fetcher for x.com
pub struct LiveTimeline {
    client: Client,
    cookies: CookieStore,
    base_url: String,
}

impl LiveTimeline {
    pub fn new(cookies: CookieStore, base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (compatible; TwitterBriefing/1.0)")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            cookies,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn fetch(&self, kind: PageKind) -> Result<String> {
        let url = Url::parse(&format!("{}{}", self.base_url, kind.path()))
            .context("Invalid timeline URL")?;

        let mut request = self.client.get(url.clone());
        if let Some(header) = cookie_header(&self.cookies, &url) {
            request = request.header("Cookie", header);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Timeline request for {} returned {}", url, status);
        }

        response
            .text()
            .await
            .context("Failed to read timeline response body")
    }
}

/// Where timeline pages come from
pub enum PageSource {
    Live(LiveTimeline),
    Snapshots(PathBuf),
}

impl PageSource {
    /// All pages of one kind, in scroll order.
    pub async fn pages(&self, kind: PageKind) -> Result<Vec<String>> {
        match self {
            PageSource::Live(live) => Ok(vec![live.fetch(kind).await?]),
            PageSource::Snapshots(dir) => read_snapshots(dir, kind),
        }
    }
}

fn read_snapshots(dir: &Path, kind: PageKind) -> Result<Vec<String>> {
    let prefix = kind.snapshot_prefix();

    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read snapshot directory: {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            name.starts_with(prefix) && name.ends_with(".html")
        })
        .collect();
    files.sort();

    if files.is_empty() {
        warn!(dir = %dir.display(), prefix, "no snapshot pages found");
    }

    files
        .iter()
        .map(|path| {
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read snapshot: {}", path.display()))
        })
        .collect()
}

fn selector(css: &'static str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector {}: {}", css, e))
}

struct TweetSelectors {
    article: Selector,
    text: Selector,
    user_name: Selector,
    status_link: Selector,
    reply: Selector,
    retweet: Selector,
    like: Selector,
    views: Selector,
}

impl TweetSelectors {
    fn new() -> Result<Self> {
        Ok(Self {
            article: selector(r#"article[data-testid="tweet"]"#)?,
            text: selector(r#"[data-testid="tweetText"]"#)?,
            user_name: selector(r#"[data-testid="User-Name"]"#)?,
            status_link: selector(r#"a[href*="/status/"]"#)?,
            reply: selector(r#"[data-testid="reply"]"#)?,
            retweet: selector(r#"[data-testid="retweet"], [data-testid="unretweet"]"#)?,
            like: selector(r#"[data-testid="like"], [data-testid="unlike"]"#)?,
            views: selector(r#"a[href$="/analytics"]"#)?,
        })
    }
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Visible count on an action button, falling back to its aria-label
/// ("1,204 Likes. Like").
fn button_count(article: ElementRef, sel: &Selector) -> u64 {
    let Some(button) = article.select(sel).next() else {
        return 0;
    };
    let text = element_text(button);
    if !text.is_empty() {
        return parse_count(Some(&text));
    }
    parse_count(button.value().attr("aria-label"))
}

/// Display name and handle from a `User-Name` block.
fn author(block: ElementRef) -> (Option<String>, Option<String>) {
    let parts: Vec<&str> = block
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty() && *t != "·")
        .collect();

    let handle = parts
        .iter()
        .find(|t| t.starts_with('@') && t.len() > 1)
        .map(|t| t.trim_start_matches('@').to_string());
    let name = parts
        .iter()
        .find(|t| !t.starts_with('@'))
        .map(|t| t.to_string());

    (name, handle)
}

/// Numeric status id from an href like `/jane/status/1885/analytics`.
fn status_id(href: &str) -> Option<String> {
    let rest = href.split("/status/").nth(1)?;
    let id: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

fn extract_tweet(article: ElementRef, sel: &TweetSelectors) -> Result<CandidateItem> {
    let block = article
        .select(&sel.user_name)
        .next()
        .ok_or_else(|| anyhow!("tweet has no author block"))?;
    let (name, handle) = author(block);
    let handle = handle.ok_or_else(|| anyhow!("tweet author has no handle"))?;

    let text = article
        .select(&sel.text)
        .next()
        .map(element_text)
        .unwrap_or_default();

    // Prefer the author's own status link; quoted tweets carry other ones.
    let own_prefix = format!("/{}/status/", handle);
    let id = article
        .select(&sel.status_link)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| href.starts_with(&own_prefix))
        .and_then(status_id)
        .unwrap_or_default();

    let views = article
        .select(&sel.views)
        .next()
        .map(element_text)
        .map(|t| parse_count(Some(&t)))
        .unwrap_or(0);

    Ok(CandidateItem::new(id, &text, name.unwrap_or_else(|| handle.clone()), handle).with_counts(
        button_count(article, &sel.like),
        button_count(article, &sel.retweet),
        button_count(article, &sel.reply),
        views,
    ))
}

/// Whether the page carries any tweet markup at all. Logged-out pages and
/// unrendered app shells have none.
fn has_tweet_markup(document: &Html, sel: &TweetSelectors) -> bool {
    document.select(&sel.article).next().is_some()
}

/// Every tweet on a page. Tweets whose markup cannot be read are skipped.
pub fn extract_tweets(html: &str) -> Result<Vec<CandidateItem>> {
    let sel = TweetSelectors::new()?;
    let document = Html::parse_document(html);

    if !has_tweet_markup(&document, &sel) {
        warn!("page has no tweets; the X session may be logged out or the page was not rendered");
        return Ok(Vec::new());
    }

    let mut items = Vec::new();
    for (index, article) in document.select(&sel.article).enumerate() {
        match extract_tweet(article, &sel) {
            Ok(item) => items.push(item),
            Err(e) => warn!(index, error = %e, "skipping unreadable tweet"),
        }
    }

    Ok(items)
}

/// Suggested accounts from a "connect people" page.
pub fn extract_accounts(html: &str) -> Result<Vec<AccountCandidate>> {
    let cell_sel = selector(r#"[data-testid="UserCell"]"#)?;
    let bio_sel = selector(r#"div[dir="auto"]"#)?;
    let document = Html::parse_document(html);

    let mut accounts = Vec::new();
    for (index, cell) in document.select(&cell_sel).enumerate() {
        let (name, handle) = author(cell);
        let Some(handle) = handle else {
            warn!(index, "skipping account without handle");
            continue;
        };
        let name = name.unwrap_or_else(|| handle.clone());

        let bio = cell
            .select(&bio_sel)
            .map(element_text)
            .filter(|t| !t.is_empty() && !t.starts_with('@') && *t != name)
            .last()
            .unwrap_or_default();

        accounts.push(AccountCandidate::new(handle, name, &bio));
    }

    Ok(accounts)
}

/// Tweets across several scrolled pages, in page order.
pub fn extract_tweets_from_pages(pages: &[String]) -> Result<Vec<CandidateItem>> {
    let mut items = Vec::new();
    for page in pages {
        items.extend(extract_tweets(page)?);
    }
    info!(pages = pages.len(), tweets = items.len(), "extracted tweets");
    Ok(items)
}
