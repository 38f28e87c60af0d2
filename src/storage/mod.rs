//! Persistence of seen entries between runs.
//!
//! Every run is stateless, so the seen sets live in one remote document
//! that is read at the start of a run and overwritten at the end.
//!
//! ## Document Shape
//!
//! ```text
//! {
//!   "theatrical": ["[Event](https://...)", ...],
//!   "unionly": ["[Product \- $20](https://...)", ...]
//! }
//! ```
//!
//! Writes replace the whole document. There is no version check, so two
//! runs racing on `save` lose one update; only one run is expected at a time.

pub mod gist;
pub mod local;
#[cfg(feature = "s3")]
pub mod s3;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Secrets;
use crate::error::{AppError, Result};
use crate::models::{Config, PersistedState, StateCheck, StoreBackend, check_document};

// Re-export for convenience
pub use gist::GistBackend;
pub use local::LocalBackend;
#[cfg(feature = "s3")]
pub use s3::S3Backend;

/// A place that holds the state document as text.
#[async_trait]
pub trait StateBackend: Send + Sync {
    /// Read the document. `Ok(None)` means it does not exist.
    async fn read(&self) -> Result<Option<String>>;

    /// Replace the document with `content`.
    async fn write(&self, content: &str) -> Result<()>;

    /// Human-readable location for logs.
    fn location(&self) -> String;
}

#[async_trait]
impl<T: StateBackend + ?Sized> StateBackend for Arc<T> {
    async fn read(&self) -> Result<Option<String>> {
        (**self).read().await
    }

    async fn write(&self, content: &str) -> Result<()> {
        (**self).write(content).await
    }

    fn location(&self) -> String {
        (**self).location()
    }
}

/// Stand-in for a backend that could not be built.
///
/// Every read and write fails with the setup error, so a run over it loads
/// as [`LoadStatus::Unavailable`] and never saves.
pub struct UnavailableBackend {
    reason: String,
}

impl UnavailableBackend {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl StateBackend for UnavailableBackend {
    async fn read(&self) -> Result<Option<String>> {
        Err(AppError::store(self.reason.clone()))
    }

    async fn write(&self, _content: &str) -> Result<()> {
        Err(AppError::store(self.reason.clone()))
    }

    fn location(&self) -> String {
        "unconfigured store".to_string()
    }
}

/// How the state for this run was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadStatus {
    /// Document read and valid
    Loaded,
    /// Document missing or malformed; reset to empty
    Recovered { reason: String, repaired: bool },
    /// Document could not be read; running on empty state, never saved this run
    Unavailable { reason: String },
}

/// Loads and saves seen sets for a fixed list of sources.
pub struct DedupStore {
    backend: Box<dyn StateBackend>,
    sources: Vec<String>,
}

impl DedupStore {
    pub fn new(backend: Box<dyn StateBackend>, sources: Vec<String>) -> Self {
        Self { backend, sources }
    }

    pub fn location(&self) -> String {
        self.backend.location()
    }

    /// Load state, never failing. See [`DedupStore::load_with_status`].
    pub async fn load(&self) -> PersistedState {
        self.load_with_status().await.0
    }

    /// Load state and report how it was obtained.
    ///
    /// A missing or malformed document is replaced remotely with an empty,
    /// well-formed one so later runs load cleanly. If that repair write fails
    /// the run still proceeds on empty state.
    pub async fn load_with_status(&self) -> (PersistedState, LoadStatus) {
        let content = match self.backend.read().await {
            Ok(content) => content,
            Err(e) => {
                log::error!(
                    "Failed to fetch seen items from {}: {}",
                    self.backend.location(),
                    e
                );
                return (
                    self.empty(),
                    LoadStatus::Unavailable {
                        reason: e.to_string(),
                    },
                );
            }
        };

        let check = match content {
            Some(content) => check_document(&content, &self.sources),
            None => StateCheck::Invalid("document does not exist".to_string()),
        };

        match check {
            StateCheck::Valid(state) => {
                log::info!(
                    "Loaded {} seen entries from {}",
                    state.entry_count(),
                    self.backend.location()
                );
                (state, LoadStatus::Loaded)
            }
            StateCheck::Invalid(reason) => {
                log::warn!("State content is invalid or malformed ({reason}). Attempting to reset.");
                let repaired = self.recover().await;
                (self.empty(), LoadStatus::Recovered { reason, repaired })
            }
        }
    }

    /// Overwrite the remote document with the full state.
    pub async fn save(&self, state: &PersistedState) -> Result<()> {
        let content = state.to_document()?;
        self.backend.write(&content).await?;
        log::info!(
            "Saved {} seen entries to {}",
            state.entry_count(),
            self.backend.location()
        );
        Ok(())
    }

    /// Read-only inspection of the stored document.
    pub async fn peek(&self) -> Result<StateCheck> {
        let content = self
            .backend
            .read()
            .await?
            .ok_or_else(|| AppError::store("document does not exist"))?;
        Ok(check_document(&content, &self.sources))
    }

    fn empty(&self) -> PersistedState {
        PersistedState::empty(&self.sources)
    }

    async fn recover(&self) -> bool {
        let reset = match self.empty().to_document() {
            Ok(content) => self.backend.write(&content).await,
            Err(e) => Err(e),
        };

        match reset {
            Ok(()) => {
                log::warn!("State document reset to default structure.");
                true
            }
            Err(e) => {
                log::error!("Failed to reset state document: {}", e);
                false
            }
        }
    }
}

/// Build the configured backend.
///
/// Missing credentials are reported here, before any network call.
pub async fn build_backend(
    config: &Config,
    secrets: &Secrets,
    client: &reqwest::Client,
) -> Result<Box<dyn StateBackend>> {
    secrets.check_store(config)?;

    match config.store.backend {
        StoreBackend::Gist => {
            let token = secrets
                .gist_token
                .clone()
                .ok_or_else(|| AppError::config("GIST_TOKEN is not set"))?;
            Ok(Box::new(GistBackend::new(
                client.clone(),
                &config.store.github_api_base,
                &config.store.gist_id,
                &config.store.gist_filename,
                token,
            )))
        }
        StoreBackend::Local => Ok(Box::new(LocalBackend::new(&config.store.local_path))),
        #[cfg(feature = "s3")]
        StoreBackend::S3 => Ok(Box::new(
            S3Backend::from_env(&config.store.s3_bucket, &config.store.s3_key).await,
        )),
        #[cfg(not(feature = "s3"))]
        StoreBackend::S3 => Err(AppError::config(
            "store.backend = \"s3\" requires the 's3' feature",
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::models::Entry;

    const SOURCES: [&str; 2] = ["unionly", "theatrical"];

    /// In-memory backend that records every write.
    #[derive(Default)]
    struct MemoryBackend {
        content: Mutex<Option<String>>,
        writes: Mutex<Vec<String>>,
        fail_reads: bool,
        fail_writes: bool,
    }

    impl MemoryBackend {
        fn with(content: &str) -> Self {
            Self {
                content: Mutex::new(Some(content.to_string())),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl StateBackend for MemoryBackend {
        async fn read(&self) -> Result<Option<String>> {
            if self.fail_reads {
                return Err(AppError::store("read refused"));
            }
            Ok(self.content.lock().unwrap().clone())
        }

        async fn write(&self, content: &str) -> Result<()> {
            if self.fail_writes {
                return Err(AppError::store("write refused"));
            }
            self.writes.lock().unwrap().push(content.to_string());
            *self.content.lock().unwrap() = Some(content.to_string());
            Ok(())
        }

        fn location(&self) -> String {
            "memory".to_string()
        }
    }

    fn store(backend: MemoryBackend) -> (DedupStore, Arc<MemoryBackend>) {
        let backend = Arc::new(backend);
        let names = SOURCES.iter().map(|s| s.to_string()).collect();
        (DedupStore::new(Box::new(Arc::clone(&backend)), names), backend)
    }

    #[tokio::test]
    async fn test_load_valid_document() {
        let (store, backend) = store(MemoryBackend::with(
            r#"{"unionly": ["a"], "theatrical": ["b", "c"]}"#,
        ));
        let (state, status) = store.load_with_status().await;
        assert_eq!(status, LoadStatus::Loaded);
        assert_eq!(state.entry_count(), 3);
        assert!(backend.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupted_documents_are_repaired_once() {
        for doc in ["not json", "{}", r#"{"unionly": "x"}"#] {
            let (store, backend) = store(MemoryBackend::with(doc));
            let (state, status) = store.load_with_status().await;

            assert_eq!(state, PersistedState::empty(&SOURCES), "for {doc}");
            assert!(matches!(
                status,
                LoadStatus::Recovered { repaired: true, .. }
            ));

            let writes = backend.writes.lock().unwrap();
            assert_eq!(writes.len(), 1);
            assert!(matches!(
                check_document(&writes[0], &SOURCES),
                StateCheck::Valid(_)
            ));
        }
    }

    #[tokio::test]
    async fn test_missing_document_is_repaired() {
        let (store, backend) = store(MemoryBackend::default());
        let (_, status) = store.load_with_status().await;
        assert!(matches!(status, LoadStatus::Recovered { .. }));
        assert_eq!(backend.writes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_repair_still_returns_empty_state() {
        let (store, _) = store(MemoryBackend {
            content: Mutex::new(Some("[]".into())),
            fail_writes: true,
            ..MemoryBackend::default()
        });
        let (state, status) = store.load_with_status().await;
        assert_eq!(state, PersistedState::empty(&SOURCES));
        assert!(matches!(
            status,
            LoadStatus::Recovered {
                repaired: false,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unreadable_store_is_not_overwritten() {
        let (store, backend) = store(MemoryBackend {
            fail_reads: true,
            ..MemoryBackend::default()
        });
        let (state, status) = store.load_with_status().await;
        assert_eq!(state, PersistedState::empty(&SOURCES));
        assert!(matches!(status, LoadStatus::Unavailable { .. }));
        assert!(backend.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_is_stable_without_new_entries() {
        let (store, backend) = store(MemoryBackend::with(
            r#"{"unionly": ["b", "a"], "theatrical": []}"#,
        ));

        let state = store.load().await;
        store.save(&state).await.unwrap();
        let state = store.load().await;
        store.save(&state).await.unwrap();

        let writes = backend.writes.lock().unwrap();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0], writes[1]);
    }

    #[tokio::test]
    async fn test_save_failure_is_reported() {
        let (store, _) = store(MemoryBackend {
            fail_writes: true,
            ..MemoryBackend::default()
        });
        let mut state = PersistedState::empty(&SOURCES);
        state.seen_mut("unionly").insert(Entry::from("x"));
        assert!(store.save(&state).await.is_err());
    }

    #[tokio::test]
    async fn test_unavailable_backend_loads_empty() {
        let names = SOURCES.iter().map(|s| s.to_string()).collect();
        let store = DedupStore::new(
            Box::new(UnavailableBackend::new("GIST_TOKEN is not set")),
            names,
        );
        let (state, status) = store.load_with_status().await;
        assert_eq!(state, PersistedState::empty(&SOURCES));
        assert!(matches!(
            status,
            LoadStatus::Unavailable { reason } if reason.contains("GIST_TOKEN")
        ));
        assert!(store.save(&state).await.is_err());
    }

    #[tokio::test]
    async fn test_peek_does_not_repair() {
        let (store, backend) = store(MemoryBackend::with("garbage"));
        assert!(matches!(store.peek().await.unwrap(), StateCheck::Invalid(_)));
        assert!(backend.writes.lock().unwrap().is_empty());
    }
}
