use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;

use crate::config::{Config, SourceKind};
use crate::snapshot::normalize::parse_document;
use crate::snapshot::Snapshot;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 12;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 6;

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent("rollcall/0.1")
        .timeout(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
        .build()
        .expect("failed to build HTTP client")
});

/// Where the current snapshot comes from. The capture mechanism itself
/// (scraping, exports) lives outside this crate; sources only consume the
/// raw snapshot document it produces.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self) -> Result<Snapshot>;
    fn describe(&self) -> String;
}

/// Raw snapshot document on disk, for captures piped in by an external job.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SnapshotSource for FileSource {
    async fn fetch(&self) -> Result<Snapshot> {
        let data = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed reading snapshot: {}", self.path.display()))?;
        parse_document(&data)
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// Raw snapshot document served over HTTP.
pub struct HttpSource {
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl SnapshotSource for HttpSource {
    async fn fetch(&self) -> Result<Snapshot> {
        let response = HTTP_CLIENT
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("failed GET request: {}", self.url))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("failed reading response body: {}", self.url))?;
        if !status.is_success() {
            let preview: String = body.chars().take(180).collect();
            return Err(anyhow!("GET {} returned {status}: {preview}", self.url));
        }
        parse_document(&body)
    }

    fn describe(&self) -> String {
        format!("http:{}", self.url)
    }
}

pub fn build_source(config: &Config) -> Result<Box<dyn SnapshotSource>> {
    match config.source.kind {
        SourceKind::File => {
            if config.source.path.trim().is_empty() {
                return Err(anyhow!("source.kind is \"file\" but source.path is empty"));
            }
            Ok(Box::new(FileSource::new(config.resolved_source_path())))
        }
        SourceKind::Http => {
            if config.source.url.trim().is_empty() {
                return Err(anyhow!("source.kind is \"http\" but source.url is empty"));
            }
            Ok(Box::new(HttpSource::new(config.source.url.clone())))
        }
    }
}
