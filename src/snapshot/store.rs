use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::warn;

use crate::config::Config;
use crate::snapshot::normalize::parse_document;
use crate::snapshot::Snapshot;

/// Durable home for the previous snapshot. `load` returning `None` means no
/// baseline exists yet, which is distinct from a load error.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn load(&self) -> Result<Option<Snapshot>>;
    async fn save(&self, snapshot: &Snapshot) -> Result<()>;
    fn describe(&self) -> String;
}

pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SnapshotStore for FileStore {
    async fn load(&self) -> Result<Option<Snapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed reading snapshot: {}", self.path.display()))?;
        Ok(Some(parse_document(&data)?))
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed creating snapshot directory: {}", parent.display())
            })?;
        }
        let json = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("failed writing snapshot: {}", self.path.display()))
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// Remote snapshot document behind a plain GET/PUT endpoint.
pub struct HttpStore {
    client: Client,
    url: String,
}

impl HttpStore {
    pub fn new(url: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent("rollcall/0.1")
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed to build snapshot store HTTP client");
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl SnapshotStore for HttpStore {
    async fn load(&self) -> Result<Option<Snapshot>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("failed GET request: {}", self.url))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("failed reading response body: {}", self.url))?;
        if !status.is_success() {
            let preview: String = body.chars().take(180).collect();
            return Err(anyhow!("GET {} returned {status}: {preview}", self.url));
        }
        Ok(Some(parse_document(&body)?))
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let response = self
            .client
            .put(&self.url)
            .json(snapshot)
            .send()
            .await
            .with_context(|| format!("failed PUT request: {}", self.url))?;
        response
            .error_for_status()
            .with_context(|| format!("snapshot PUT rejected: {}", self.url))?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("http:{}", self.url)
    }
}

#[derive(Debug, Default)]
pub struct SaveReport {
    pub saved_to: Option<String>,
    pub failures: Vec<String>,
}

/// Primary store plus fallbacks, consulted in order. A failing primary must
/// never lose the snapshot as long as any fallback accepts it.
pub struct StoreChain {
    stores: Vec<Box<dyn SnapshotStore>>,
}

impl StoreChain {
    pub fn new(stores: Vec<Box<dyn SnapshotStore>>) -> Self {
        Self { stores }
    }

    /// First store that yields a snapshot wins. Load errors are logged and
    /// treated as absent, so a corrupt or unreachable store degrades to a
    /// baseline run instead of aborting.
    pub async fn load(&self) -> Option<Snapshot> {
        for store in &self.stores {
            match store.load().await {
                Ok(Some(snapshot)) => return Some(snapshot),
                Ok(None) => {}
                Err(err) => {
                    warn!(store = %store.describe(), "snapshot load failed: {err:#}");
                }
            }
        }
        None
    }

    /// Tries each store until one accepts the snapshot. Never returns an
    /// error; the report records where the snapshot landed and what failed
    /// along the way.
    pub async fn save(&self, snapshot: &Snapshot) -> SaveReport {
        let mut failures = Vec::new();
        for store in &self.stores {
            match store.save(snapshot).await {
                Ok(()) => {
                    return SaveReport {
                        saved_to: Some(store.describe()),
                        failures,
                    }
                }
                Err(err) => {
                    warn!(store = %store.describe(), "snapshot save failed: {err:#}");
                    failures.push(format!("{}: {err:#}", store.describe()));
                }
            }
        }
        SaveReport {
            saved_to: None,
            failures,
        }
    }
}

/// Builds the configured chain: the optional remote store first, then the
/// primary file, then the local fallback file.
pub fn build_store_chain(config: &Config) -> StoreChain {
    let mut stores: Vec<Box<dyn SnapshotStore>> = Vec::new();
    if !config.storage.remote_url.trim().is_empty() {
        stores.push(Box::new(HttpStore::new(config.storage.remote_url.clone())));
    }
    stores.push(Box::new(FileStore::new(config.resolved_store_path())));
    let fallback = config.resolved_fallback_path();
    if fallback != config.resolved_store_path() {
        stores.push(Box::new(FileStore::new(fallback)));
    }
    StoreChain::new(stores)
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::{FileStore, SaveReport, SnapshotStore, StoreChain};
    use crate::snapshot::{Percent, Snapshot, SubjectRecord};

    struct BrokenStore;

    #[async_trait]
    impl SnapshotStore for BrokenStore {
        async fn load(&self) -> anyhow::Result<Option<Snapshot>> {
            Err(anyhow!("store offline"))
        }

        async fn save(&self, _snapshot: &Snapshot) -> anyhow::Result<()> {
            Err(anyhow!("store offline"))
        }

        fn describe(&self) -> String {
            "broken:".to_string()
        }
    }

    fn sample_snapshot() -> Snapshot {
        Snapshot::new(
            vec![SubjectRecord {
                subject: "Maths".to_string(),
                classes_held: 12,
                classes_attended: 10,
                percentage: Percent::Text("83.3%".to_string()),
            }],
            Percent::Text("83.3%".to_string()),
        )
    }

    #[tokio::test]
    async fn file_store_round_trips_a_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("nested/stored.json"));
        assert!(store.load().await.unwrap().is_none());

        let snapshot = sample_snapshot();
        store.save(&snapshot).await.unwrap();
        let restored = store.load().await.unwrap().unwrap();
        assert_eq!(restored.subjects, snapshot.subjects);
    }

    #[tokio::test]
    async fn failing_primary_falls_back_without_an_error() {
        let dir = TempDir::new().unwrap();
        let fallback_path = dir.path().join("fallback.json");
        let chain = StoreChain::new(vec![
            Box::new(BrokenStore),
            Box::new(FileStore::new(fallback_path.clone())),
        ]);

        let snapshot = sample_snapshot();
        let SaveReport { saved_to, failures } = chain.save(&snapshot).await;
        assert_eq!(
            saved_to.as_deref(),
            Some(format!("file:{}", fallback_path.display()).as_str())
        );
        assert_eq!(failures.len(), 1);

        // The fallback location now holds the exact snapshot.
        let restored = FileStore::new(fallback_path).load().await.unwrap().unwrap();
        assert_eq!(restored.subjects, snapshot.subjects);
    }

    #[tokio::test]
    async fn save_reports_total_failure_instead_of_raising() {
        let chain = StoreChain::new(vec![Box::new(BrokenStore), Box::new(BrokenStore)]);
        let report = chain.save(&sample_snapshot()).await;
        assert!(report.saved_to.is_none());
        assert_eq!(report.failures.len(), 2);
    }

    #[tokio::test]
    async fn load_skips_an_erroring_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stored.json");
        let seed = FileStore::new(path.clone());
        seed.save(&sample_snapshot()).await.unwrap();

        let chain = StoreChain::new(vec![Box::new(BrokenStore), Box::new(FileStore::new(path))]);
        let loaded = chain.load().await.unwrap();
        assert_eq!(loaded.subjects[0].subject, "Maths");
    }
}
