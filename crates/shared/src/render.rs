use chrono::{DateTime, NaiveDate, Utc};

use crate::counts::format_count;
use crate::models::{AccountToFollow, BriefingDocument, BriefingPost};

const FONTS: &str = "https://fonts.googleapis.com/css2?family=Newsreader:ital,opsz,wght@0,6..72,300;0,6..72,400;0,6..72,500;1,6..72,400&family=Outfit:wght@300;400;500;600&display=swap";

const PAGE_STYLE: &str = r#"
    *, *::before, *::after { box-sizing: border-box; margin: 0; padding: 0; }
    :root {
      --bg: #faf8f5; --bg-card: #f5f1eb; --bg-card-hover: #f0ebe3;
      --ink: #2a2522; --ink-secondary: #6b5f56; --ink-muted: #9c8e83;
      --accent: #c45d3e; --rule: #d4cbc2; --rule-light: #e5ddd5;
    }
    html { font-size: 17px; -webkit-font-smoothing: antialiased; }
    body { font-family: 'Outfit', sans-serif; color: var(--ink); background: var(--bg); line-height: 1.6; min-height: 100vh; }
    .container { max-width: 720px; margin: 0 auto; padding: 2rem 1.5rem 4rem; }
    .masthead { text-align: center; padding: 2.5rem 0 2rem; border-bottom: 3px double var(--rule); margin-bottom: 0.5rem; }
    .masthead-label { font-weight: 500; font-size: 0.65rem; letter-spacing: 0.25em; text-transform: uppercase; color: var(--ink-muted); margin-bottom: 0.5rem; }
    .masthead-title { font-family: 'Newsreader', serif; font-size: 2.8rem; font-weight: 400; line-height: 1.1; letter-spacing: -0.02em; }
    .masthead-date { font-family: 'Newsreader', serif; font-style: italic; color: var(--ink-secondary); margin-top: 0.6rem; }
    .masthead-meta { display: flex; justify-content: center; gap: 2rem; margin-top: 0.5rem; }
    .masthead-meta span { font-size: 0.7rem; letter-spacing: 0.1em; text-transform: uppercase; color: var(--ink-muted); }
    .section-header { display: flex; align-items: center; gap: 1rem; margin: 2.5rem 0 1.5rem; }
    .section-header::before, .section-header::after { content: ''; flex: 1; height: 1px; background: var(--rule); }
    .section-label { font-weight: 500; font-size: 0.65rem; letter-spacing: 0.25em; text-transform: uppercase; color: var(--accent); white-space: nowrap; }
    .post-list { display: flex; flex-direction: column; gap: 1px; }
    .post-card { background: var(--bg-card); padding: 1.5rem; border-radius: 2px; position: relative; transition: background 0.2s ease; }
    .post-card:hover, .account-card:hover { background: var(--bg-card-hover); }
    .post-card + .post-card { border-top: 1px solid var(--rule-light); }
    .post-number { position: absolute; top: 1.5rem; left: 1.5rem; font-family: 'Newsreader', serif; font-size: 2rem; font-weight: 300; color: var(--rule); line-height: 1; }
    .post-author, .post-text, .post-why, .post-stats { padding-left: 2.5rem; }
    .post-author { margin-bottom: 0.75rem; }
    .post-author-name, .account-name { font-family: 'Newsreader', serif; font-weight: 500; }
    .post-author-handle, .account-handle { font-size: 0.8rem; color: var(--ink-muted); margin-left: 0.4rem; }
    .post-text { font-family: 'Newsreader', serif; font-size: 1.05rem; line-height: 1.55; margin-bottom: 1rem; }
    .post-why, .account-why { font-size: 0.82rem; color: var(--accent); font-weight: 500; margin-bottom: 0.75rem; line-height: 1.45; }
    .post-why::before, .account-why::before { content: '\2192'; margin-right: 0.4rem; font-weight: 300; }
    .post-stats, .account-stats { display: flex; gap: 1.25rem; flex-wrap: wrap; align-items: center; }
    .stat { font-size: 0.72rem; letter-spacing: 0.05em; text-transform: uppercase; color: var(--ink-muted); }
    .stat-value { font-weight: 600; color: var(--ink-secondary); }
    .post-link { margin-left: auto; font-size: 0.72rem; letter-spacing: 0.05em; text-transform: uppercase; color: var(--accent); text-decoration: none; font-weight: 500; }
    .account-list { display: flex; flex-direction: column; gap: 1rem; }
    .account-card { background: var(--bg-card); padding: 1.5rem; border-radius: 2px; border-left: 3px solid var(--accent); }
    .account-header { display: flex; justify-content: space-between; align-items: flex-start; margin-bottom: 0.6rem; }
    .account-follow-link { font-size: 0.7rem; letter-spacing: 0.1em; text-transform: uppercase; color: var(--accent); text-decoration: none; font-weight: 500; border: 1px solid var(--accent); padding: 0.3rem 0.75rem; border-radius: 2px; white-space: nowrap; }
    .account-follow-link:hover { background: var(--accent); color: var(--bg); }
    .account-bio { font-family: 'Newsreader', serif; font-size: 0.95rem; line-height: 1.5; color: var(--ink-secondary); margin-bottom: 0.75rem; }
    .methodology { margin-top: 2.5rem; font-size: 0.85rem; color: var(--ink-secondary); }
    .methodology ul { margin: 0.5rem 0 0 1.25rem; }
    .footer { margin-top: 3rem; padding-top: 1.5rem; border-top: 1px solid var(--rule); text-align: center; }
    .footer-text { font-size: 0.7rem; letter-spacing: 0.15em; text-transform: uppercase; color: var(--ink-muted); }
    .footer-time { font-family: 'Newsreader', serif; font-style: italic; font-size: 0.85rem; color: var(--ink-muted); margin-top: 0.25rem; }
    @media (max-width: 600px) {
      html { font-size: 15px; }
      .container { padding: 1rem 1rem 3rem; }
      .masthead-title { font-size: 2rem; }
      .post-number { position: static; margin-bottom: 0.5rem; font-size: 1.5rem; }
      .post-author, .post-text, .post-why, .post-stats { padding-left: 0; }
      .masthead-meta { flex-direction: column; gap: 0.25rem; align-items: center; }
    }
"#;

pub struct BriefingPage;

impl BriefingPage {
    /// "2026-02-01" -> "Sunday, February 1, 2026"
    fn format_date(date_str: &str) -> String {
        match NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d") {
            Ok(date) => date.format("%A, %B %-d, %Y").to_string(),
            Err(_) => date_str.to_string(),
        }
    }

    /// RFC 3339 instant -> "9:25 PM" (UTC)
    fn format_time(timestamp: &str) -> String {
        match timestamp.parse::<DateTime<Utc>>() {
            Ok(dt) => dt.format("%-I:%M %p").to_string(),
            Err(_) => timestamp.to_string(),
        }
    }

    fn escape_html(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#39;")
    }

    fn head(html: &mut String, title: &str) {
        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        html.push_str("  <meta charset=\"UTF-8\" />\n");
        html.push_str(
            "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\" />\n",
        );
        html.push_str(&format!("  <title>{}</title>\n", title));
        html.push_str("  <link rel=\"preconnect\" href=\"https://fonts.googleapis.com\" />\n");
        html.push_str(&format!("  <link href=\"{}\" rel=\"stylesheet\" />\n", FONTS));
        html.push_str("  <style>");
        html.push_str(PAGE_STYLE);
        html.push_str("  </style>\n</head>\n");
    }

    fn render_post(html: &mut String, index: usize, post: &BriefingPost) {
        html.push_str("      <div class=\"post-card\">\n");
        html.push_str(&format!(
            "        <div class=\"post-number\">{:02}</div>\n",
            index + 1
        ));
        html.push_str(&format!(
            "        <div class=\"post-author\"><span class=\"post-author-name\">{}</span><span class=\"post-author-handle\">@{}</span></div>\n",
            Self::escape_html(&post.author_name),
            Self::escape_html(&post.author_handle)
        ));
        html.push_str(&format!(
            "        <div class=\"post-text\">{}</div>\n",
            Self::escape_html(&post.text)
        ));
        html.push_str(&format!(
            "        <div class=\"post-why\">{}</div>\n",
            Self::escape_html(&post.why_interesting)
        ));
        html.push_str("        <div class=\"post-stats\">\n");
        for (value, label) in [
            (post.likes, "likes"),
            (post.retweets, "retweets"),
            (post.replies, "replies"),
        ] {
            html.push_str(&format!(
                "          <span class=\"stat\"><span class=\"stat-value\">{}</span> {}</span>\n",
                format_count(value),
                label
            ));
        }
        if post.views > 0 {
            html.push_str(&format!(
                "          <span class=\"stat\"><span class=\"stat-value\">{}</span> views</span>\n",
                format_count(post.views)
            ));
        }
        html.push_str(&format!(
            "          <a href=\"{}\" target=\"_blank\" rel=\"noopener\" class=\"post-link\">View &rarr;</a>\n",
            Self::escape_html(&post.url)
        ));
        html.push_str("        </div>\n");
        html.push_str("      </div>\n");
    }

    fn render_account(html: &mut String, account: &AccountToFollow) {
        html.push_str("      <div class=\"account-card\">\n");
        html.push_str("        <div class=\"account-header\">\n");
        html.push_str(&format!(
            "          <div><span class=\"account-name\">{}</span><span class=\"account-handle\">@{}</span></div>\n",
            Self::escape_html(&account.name),
            Self::escape_html(&account.handle)
        ));
        html.push_str(&format!(
            "          <a href=\"{}\" target=\"_blank\" rel=\"noopener\" class=\"account-follow-link\">Follow</a>\n",
            Self::escape_html(&account.url)
        ));
        html.push_str("        </div>\n");
        html.push_str(&format!(
            "        <div class=\"account-bio\">{}</div>\n",
            Self::escape_html(&account.bio)
        ));
        html.push_str(&format!(
            "        <div class=\"account-why\">{}</div>\n",
            Self::escape_html(&account.why_follow)
        ));
        html.push_str(&format!(
            "        <div class=\"account-stats\"><span class=\"stat\"><span class=\"stat-value\">{}</span> followers</span><span class=\"stat\"><span class=\"stat-value\">{}</span> following</span></div>\n",
            format_count(account.followers),
            format_count(account.following)
        ));
        html.push_str("      </div>\n");
    }

    pub fn render(doc: &BriefingDocument) -> String {
        let date_display = Self::format_date(&doc.date);
        let time_display = Self::format_time(&doc.scraped_at);

        let mut html = String::new();
        Self::head(
            &mut html,
            &format!("Daily Briefing &mdash; {}", Self::escape_html(&date_display)),
        );

        html.push_str("<body>\n  <div class=\"container\">\n");
        html.push_str("    <header class=\"masthead\">\n");
        html.push_str("      <div class=\"masthead-label\">Your Daily</div>\n");
        html.push_str("      <h1 class=\"masthead-title\">Twitter Briefing</h1>\n");
        html.push_str(&format!(
            "      <div class=\"masthead-date\">{}</div>\n",
            Self::escape_html(&date_display)
        ));
        html.push_str(&format!(
            "      <div class=\"masthead-meta\"><span>{} Posts</span><span>{} Accounts</span></div>\n",
            doc.posts.len(),
            doc.accounts_to_follow.len()
        ));
        html.push_str("    </header>\n");

        html.push_str("    <div class=\"section-header\"><span class=\"section-label\">Posts to Reply To</span></div>\n");
        html.push_str("    <div class=\"post-list\">\n");
        for (index, post) in doc.posts.iter().enumerate() {
            Self::render_post(&mut html, index, post);
        }
        html.push_str("    </div>\n");

        html.push_str("    <div class=\"section-header\"><span class=\"section-label\">Accounts to Follow</span></div>\n");
        html.push_str("    <div class=\"account-list\">\n");
        for account in &doc.accounts_to_follow {
            Self::render_account(&mut html, account);
        }
        html.push_str("    </div>\n");

        if let Some(methodology) = &doc.methodology {
            html.push_str("    <section class=\"methodology\">\n");
            html.push_str(&format!(
                "      <p>{}</p>\n",
                Self::escape_html(&methodology.plain_english)
            ));
            if !methodology.searches.is_empty() {
                html.push_str("      <ul>\n");
                for search in &methodology.searches {
                    html.push_str(&format!("        <li>{}</li>\n", Self::escape_html(search)));
                }
                html.push_str("      </ul>\n");
            }
            html.push_str("    </section>\n");
        }

        html.push_str("    <footer class=\"footer\">\n");
        html.push_str("      <div class=\"footer-text\">Last Updated</div>\n");
        html.push_str(&format!(
            "      <div class=\"footer-time\">{}</div>\n",
            Self::escape_html(&time_display)
        ));
        html.push_str("    </footer>\n");
        html.push_str("  </div>\n</body>\n</html>");
        html
    }

    /// Shown before the first briefing has been stored.
    pub fn render_empty() -> String {
        let mut html = String::new();
        Self::head(&mut html, "Twitter Briefing");
        html.push_str("<body>\n  <div class=\"container\">\n");
        html.push_str("    <div class=\"masthead\">\n");
        html.push_str("      <h1 class=\"masthead-title\">No briefing yet</h1>\n");
        html.push_str("      <p class=\"masthead-date\">Run <code>collect-briefing</code> to generate your first briefing.</p>\n");
        html.push_str("    </div>\n");
        html.push_str("  </div>\n</body>\n</html>");
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Methodology;

    fn document() -> BriefingDocument {
        BriefingDocument {
            date: "2026-02-01".to_string(),
            scraped_at: "2026-02-01T21:25:00.000Z".to_string(),
            posts: vec![BriefingPost {
                id: "1".to_string(),
                text: "Is <b>Rust</b> worth it?".to_string(),
                author_name: "Jane & Co".to_string(),
                author_handle: "jane".to_string(),
                likes: 12_300,
                retweets: 40,
                replies: 7,
                views: 0,
                why_interesting: "Good reply opportunity".to_string(),
                url: "https://x.com/jane/status/1".to_string(),
            }],
            accounts_to_follow: vec![AccountToFollow {
                handle: "ada".to_string(),
                name: "Ada".to_string(),
                bio: "Builds databases".to_string(),
                followers: 2_500_000,
                following: 12,
                why_follow: "Posts about database".to_string(),
                url: "https://x.com/ada".to_string(),
            }],
            methodology: Some(Methodology {
                searches: vec!["new tweets by yc founders".to_string()],
                plain_english: "Searched X.".to_string(),
            }),
        }
    }

    #[test]
    fn test_format_date() {
        assert_eq!(BriefingPage::format_date("2026-02-01"), "Sunday, February 1, 2026");
        assert_eq!(BriefingPage::format_date("not a date"), "not a date");
    }

    #[test]
    fn test_format_time() {
        assert_eq!(BriefingPage::format_time("2026-02-01T21:25:00.000Z"), "9:25 PM");
        assert_eq!(BriefingPage::format_time("garbage"), "garbage");
    }

    #[test]
    fn test_escape_html_combined() {
        assert_eq!(
            BriefingPage::escape_html("<a href=\"x\">Tom's & Co</a>"),
            "&lt;a href=&quot;x&quot;&gt;Tom&#39;s &amp; Co&lt;/a&gt;"
        );
    }

    #[test]
    fn test_render_contains_content() {
        let html = BriefingPage::render(&document());
        assert!(html.contains("Twitter Briefing"));
        assert!(html.contains("Sunday, February 1, 2026"));
        assert!(html.contains("1 Posts"));
        assert!(html.contains("1 Accounts"));
        assert!(html.contains("<div class=\"post-number\">01</div>"));
        assert!(html.contains("12.3K"));
        assert!(html.contains("2.5M"));
        assert!(html.contains("Posts about database"));
        assert!(html.contains("new tweets by yc founders"));
        assert!(html.contains("9:25 PM"));
    }

    #[test]
    fn test_render_escapes_user_text() {
        let html = BriefingPage::render(&document());
        assert!(html.contains("Is &lt;b&gt;Rust&lt;/b&gt; worth it?"));
        assert!(html.contains("Jane &amp; Co"));
        assert!(!html.contains("<b>Rust</b>"));
    }

    #[test]
    fn test_render_hides_zero_views() {
        let html = BriefingPage::render(&document());
        assert!(!html.contains(" views</span>"));

        let mut doc = document();
        doc.posts[0].views = 4_000;
        assert!(BriefingPage::render(&doc).contains("4K</span> views"));
    }

    #[test]
    fn test_render_empty_state() {
        let html = BriefingPage::render_empty();
        assert!(html.contains("No briefing yet"));
        assert!(html.contains("collect-briefing"));
        assert!(!html.contains("push-briefing"));
    }
}
