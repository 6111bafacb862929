use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

const CONFIG_DIR_NAME: &str = "twitter-briefing";

/// Credentials for Cloudflare Workers KV
#[derive(Debug, Clone)]
pub struct KvCredentials {
    pub account_id: String,
    pub namespace_id: String,
    pub api_token: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub browser_use_api_key: Option<String>,
    pub browser_use_profile_id: Option<String>,
    pub store_dir: PathBuf,
    pub kv: Option<KvCredentials>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Try to load .env from multiple locations
        Self::try_load_dotenv();

        let store_dir = match env::var("BRIEFING_STORE_DIR") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::data_local_dir()
                .context("Could not determine local data directory")?
                .join(CONFIG_DIR_NAME),
        };

        let kv = match (
            non_empty_var("CLOUDFLARE_ACCOUNT_ID"),
            non_empty_var("CLOUDFLARE_KV_NAMESPACE_ID"),
            non_empty_var("CLOUDFLARE_API_TOKEN"),
        ) {
            (Some(account_id), Some(namespace_id), Some(api_token)) => Some(KvCredentials {
                account_id,
                namespace_id,
                api_token,
            }),
            _ => None,
        };

        Ok(Self {
            browser_use_api_key: non_empty_var("BROWSER_USE_API_KEY"),
            browser_use_profile_id: non_empty_var("BROWSER_USE_PROFILE_ID"),
            store_dir,
            kv,
        })
    }

    pub fn require_browser_use_key(&self) -> Result<&str> {
        self.browser_use_api_key.as_deref().context(
            "BROWSER_USE_API_KEY not found.\n\n\
            To fix this, create ~/.config/twitter-briefing/.env with:\n  \
            BROWSER_USE_API_KEY=your_key_here\n\n\
            Get a Browser Use API key from: https://cloud.browser-use.com",
        )
    }

    pub fn require_kv(&self) -> Result<&KvCredentials> {
        self.kv.as_ref().context(
            "Cloudflare KV credentials not found.\n\n\
            To fix this, add to ~/.config/twitter-briefing/.env:\n  \
            CLOUDFLARE_ACCOUNT_ID=your_account_id\n  \
            CLOUDFLARE_KV_NAMESPACE_ID=your_namespace_id\n  \
            CLOUDFLARE_API_TOKEN=token_with_kv_write_access",
        )
    }

    fn try_load_dotenv() {
        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/twitter-briefing/.env
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join(CONFIG_DIR_NAME).join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                dotenvy::from_path(&home_path).ok();
            }
        }

        // If none found, that's okay - environment variables might be set system-wide
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
