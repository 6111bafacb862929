use anyhow::{Context, Result};
use clap::Parser;
use shared::{BriefingDocument, BriefingStore, Config};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "push-briefing")]
#[command(about = "Publish a briefing JSON file as the live briefing")]
struct Args {
    /// Path to the briefing JSON file
    #[arg(short, long, default_value = "briefing.json")]
    file: PathBuf,

    /// Publish to Cloudflare KV instead of the local store
    #[arg(long)]
    kv: bool,
}

/// The file must hold a briefing document; it is published byte for byte.
fn validate(raw: &str) -> Result<BriefingDocument> {
    serde_json::from_str(raw).context("File is not a valid briefing document")
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
    let store = BriefingStore::from_config(&config, args.kv)?;

    println!("📖 Reading briefing: {}", args.file.display());
    let raw = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read briefing file: {}", args.file.display()))?;

    let briefing = validate(&raw)?;
    println!(
        "✓ Briefing for {}: {} posts, {} accounts",
        briefing.date,
        briefing.posts.len(),
        briefing.accounts_to_follow.len()
    );

    println!("\n📤 Pushing to {}...", store.describe());
    store
        .put_raw(&raw)
        .await
        .context("Failed to publish briefing")?;

    println!("\n✅ Briefing is live");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_document() {
        let raw = r#"{"date":"2026-02-01","scrapedAt":"2026-02-01T12:00:00.000Z","posts":[],"accountsToFollow":[]}"#;
        let doc = validate(raw).unwrap();
        assert_eq!(doc.date, "2026-02-01");
    }

    #[test]
    fn test_validate_rejects_other_json() {
        assert!(validate(r#"{"stories": []}"#).is_err());
        assert!(validate("not json").is_err());
    }
}
