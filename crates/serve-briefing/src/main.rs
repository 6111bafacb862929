mod routes;

use anyhow::{Context, Result};
use clap::Parser;
use shared::{BriefingStore, Config};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "serve-briefing")]
#[command(about = "Serve the live briefing as a web page and JSON API")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8787)]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Read the briefing from Cloudflare KV instead of the local store
    #[arg(long)]
    kv: bool,
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
    info!(store = %store.describe(), "briefing store ready");

    let app = routes::create_router(Arc::new(store));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("Invalid listen address: {}:{}", args.host, args.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    println!("🌐 Serving briefing at http://{}", addr);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
