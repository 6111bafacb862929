//! Persistence for the single live briefing.
//!
//! One key, `latest`, holds the whole serialized document. A write replaces
//! the previous value; a read returns the value or `None`.

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::config::{Config, KvCredentials};
use crate::models::BriefingDocument;

pub const LATEST_KEY: &str = "latest";
pub const CLOUDFLARE_API: &str = "https://api.cloudflare.com/client/v4";

pub fn to_json(document: &BriefingDocument) -> Result<String> {
    serde_json::to_string_pretty(document).context("Failed to serialize briefing data")
}

/// Local directory store: `<dir>/latest.json`
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", LATEST_KEY))
    }

    /// Write to a temporary file beside the target, then rename over it, so
    /// readers never see a partial document. The temporary file is removed on
    /// every error path.
    pub fn put(&self, value: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create store directory: {}", self.dir.display()))?;

        let mut temp =
            NamedTempFile::new_in(&self.dir).context("Failed to create temporary briefing file")?;
        temp.write_all(value.as_bytes())
            .context("Failed to write briefing data")?;

        let path = self.path();
        temp.persist(&path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        Ok(path)
    }

    pub fn get(&self) -> Result<Option<String>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .with_context(|| format!("Failed to read {}", path.display()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Cloudflare Workers KV over the REST API
pub struct CloudflareKvStore {
    client: Client,
    credentials: KvCredentials,
    base_url: String,
}

impl CloudflareKvStore {
    pub fn new(credentials: KvCredentials) -> Result<Self> {
        Self::with_base_url(credentials, CLOUDFLARE_API)
    }

    pub fn with_base_url(credentials: KvCredentials, base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            credentials,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn value_url(&self) -> String {
        format!(
            "{}/accounts/{}/storage/kv/namespaces/{}/values/{}",
            self.base_url,
            self.credentials.account_id,
            self.credentials.namespace_id,
            urlencoding::encode(LATEST_KEY)
        )
    }

    pub async fn put(&self, value: &str) -> Result<()> {
        let response = self
            .client
            .put(self.value_url())
            .bearer_auth(&self.credentials.api_token)
            .header("content-type", "text/plain")
            .body(value.to_string())
            .send()
            .await
            .context("Failed to send KV write")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("Cloudflare KV returned error: {} - {}", status, error_text);
        }

        Ok(())
    }

    pub async fn get(&self) -> Result<Option<String>> {
        let response = self
            .client
            .get(self.value_url())
            .bearer_auth(&self.credentials.api_token)
            .send()
            .await
            .context("Failed to send KV read")?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            anyhow::bail!("Cloudflare KV returned error: {}", status);
        }

        response
            .text()
            .await
            .map(Some)
            .context("Failed to read KV value")
    }
}

/// Where the live briefing is kept
pub enum BriefingStore {
    File(FileStore),
    CloudflareKv(CloudflareKvStore),
}

impl BriefingStore {
    /// Cloudflare KV when `use_kv` is set (credentials required), otherwise
    /// the local directory store.
    pub fn from_config(config: &Config, use_kv: bool) -> Result<Self> {
        if use_kv {
            let credentials = config.require_kv()?.clone();
            Ok(BriefingStore::CloudflareKv(CloudflareKvStore::new(credentials)?))
        } else {
            Ok(BriefingStore::File(FileStore::new(config.store_dir.clone())))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            BriefingStore::File(store) => format!("{}", store.path().display()),
            BriefingStore::CloudflareKv(_) => format!("Cloudflare KV key '{}'", LATEST_KEY),
        }
    }

    pub async fn put_raw(&self, value: &str) -> Result<()> {
        match self {
            BriefingStore::File(store) => store.put(value).map(|_| ()),
            BriefingStore::CloudflareKv(store) => store.put(value).await,
        }
    }

    pub async fn put_document(&self, document: &BriefingDocument) -> Result<()> {
        self.put_raw(&to_json(document)?).await
    }

    pub async fn get_raw(&self) -> Result<Option<String>> {
        match self {
            BriefingStore::File(store) => store.get(),
            BriefingStore::CloudflareKv(store) => store.get().await,
        }
    }

    pub async fn get_document(&self) -> Result<Option<BriefingDocument>> {
        match self.get_raw().await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .context("Stored briefing is not a valid briefing document"),
            None => Ok(None),
        }
    }
}
