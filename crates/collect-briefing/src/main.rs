use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use shared::cookies::load_x_cookies;
use shared::pipeline::{run_remote_task, run_timeline};
use shared::timeline::X_BASE_URL;
use shared::{
    BriefingDocument, BriefingStore, BrowserUseClient, Config, LiveTimeline, PageSource,
    PayloadError, PollSettings,
};
use std::fs;
use std::io::{self as stdio, Write};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy)]
enum Source {
    Timeline,
    RemoteTask,
}

impl Source {
    fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "timeline" => Some(Source::Timeline),
            "remote" => Some(Source::RemoteTask),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Source::Timeline => "Your timeline (top 6 posts, 2 accounts)",
            Source::RemoteTask => "Browser Use search agent (10 posts, 3 accounts)",
        }
    }
}

fn prompt_source_selection() -> Result<Source> {
    println!("Where should the briefing come from?");
    println!("  1) Your timeline and notifications");
    println!("  2) Browser Use search agent");
    print!("\nEnter your choice (1-2): ");
    stdio::stdout().flush()?;

    let mut input = String::new();
    stdio::stdin().read_line(&mut input)?;

    match input.trim() {
        "1" => Ok(Source::Timeline),
        "2" => Ok(Source::RemoteTask),
        _ => anyhow::bail!("Invalid selection. Please choose 1 or 2."),
    }
}

/// Credentials the chosen source needs; the store's are checked separately.
fn require_credentials(source: Source, config: &Config) -> Result<()> {
    if let Source::RemoteTask = source {
        config.require_browser_use_key()?;
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "collect-briefing")]
#[command(about = "Collect, rank and store today's Twitter briefing")]
struct Args {
    /// Retrieval source (timeline, remote)
    #[arg(short, long)]
    source: Option<String>,

    /// Read timeline pages from saved HTML snapshots instead of x.com
    #[arg(long)]
    snapshots: Option<PathBuf>,

    /// Base URL for live timeline pages
    #[arg(long, default_value = X_BASE_URL)]
    base_url: String,

    /// Store the briefing in Cloudflare KV instead of the local store
    #[arg(long)]
    kv: bool,

    /// Also write the briefing JSON to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    let source = if let Some(slug) = args.source.as_deref() {
        Source::from_slug(slug)
            .ok_or_else(|| anyhow::anyhow!("Invalid source: {}. Use 'timeline' or 'remote'", slug))?
    } else {
        prompt_source_selection()?
    };
    println!("\n✓ Selected: {}", source.label());

    // Resolve every credential before doing any work
    require_credentials(source, &config)?;
    let store = BriefingStore::from_config(&config, args.kv)?;

    let now = Utc::now();
    let briefing = match source {
        Source::RemoteTask => collect_remote(&config, now).await?,
        Source::Timeline => collect_timeline(&args, now).await?,
    };

    println!(
        "✓ Built briefing: {} posts, {} accounts",
        briefing.posts.len(),
        briefing.accounts_to_follow.len()
    );

    if let Some(path) = &args.output {
        let json = shared::store::to_json(&briefing)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("✓ Briefing JSON written to {}", path.display());
    }

    println!("\n💾 Saving briefing...");
    store
        .put_document(&briefing)
        .await
        .context("Failed to store briefing")?;

    println!("\n✅ Briefing saved to {}", store.describe());

    Ok(())
}

async fn collect_remote(config: &Config, now: chrono::DateTime<Utc>) -> Result<BriefingDocument> {
    let api_key = config.require_browser_use_key()?;
    let client = BrowserUseClient::new(api_key.to_string())?;

    println!("\n🤖 Running Browser Use task...");
    println!("  (This can take several minutes...)");

    match run_remote_task(config, &client, PollSettings::default(), now).await {
        Ok(briefing) => Ok(briefing),
        Err(e) => {
            if let Some(payload_err) = e.downcast_ref::<PayloadError>() {
                eprintln!("Failed to parse JSON from Browser Use output.");
                eprintln!("Raw output (first 2000 chars): {}", payload_err.excerpt());
            }
            Err(e)
        }
    }
}

async fn collect_timeline(args: &Args, now: chrono::DateTime<Utc>) -> Result<BriefingDocument> {
    let source = match &args.snapshots {
        Some(dir) => {
            println!("\n📂 Reading timeline snapshots from {}...", dir.display());
            PageSource::Snapshots(dir.clone())
        }
        None => {
            println!("\n🍪 Loading X session from your browser...");
            let cookies = load_x_cookies()?;
            println!("\n🌐 Fetching timeline pages...");
            PageSource::Live(LiveTimeline::new(cookies, args.base_url.clone())?)
        }
    };

    println!("\n📊 Ranking tweets...");
    run_timeline(&source, now).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: Option<&str>) -> Config {
        Config {
            browser_use_api_key: api_key.map(str::to_string),
            browser_use_profile_id: None,
            store_dir: PathBuf::from("/tmp/briefing"),
            kv: None,
        }
    }

    #[test]
    fn test_remote_source_requires_api_key_up_front() {
        assert!(require_credentials(Source::RemoteTask, &config(None)).is_err());
        assert!(require_credentials(Source::RemoteTask, &config(Some("key"))).is_ok());
    }

    #[test]
    fn test_timeline_source_needs_no_api_key() {
        assert!(require_credentials(Source::Timeline, &config(None)).is_ok());
    }

    #[test]
    fn test_source_from_slug() {
        assert!(matches!(Source::from_slug("remote"), Some(Source::RemoteTask)));
        assert!(matches!(Source::from_slug("timeline"), Some(Source::Timeline)));
        assert!(Source::from_slug("rss").is_none());
    }
}
