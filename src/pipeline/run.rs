// src/pipeline/run.rs

//! One full watch run.
//!
//! Load → extract (per source) → diff → notify → persist, as a single
//! linear pass. No stage aborts the run; each degrades to a safe default
//! and reports through the log and the returned [`RunReport`].

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use crate::config::Secrets;
use crate::models::{CommitPolicy, Config, Entry, PersistedState, RawItem, SourceConfig};
use crate::pipeline::take_new;
use crate::services::{DeliveryOutcome, Digest, Notifier, SourceAdapter, TelegramNotifier};
use crate::storage::{DedupStore, LoadStatus, StateBackend, UnavailableBackend, build_backend};
use crate::utils::http::{HttpFetcher, PageFetcher, create_async_client};

/// Per-run switches.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Sources fetched at once; results stay in config order regardless
    pub max_concurrent: usize,
    pub commit_policy: CommitPolicy,
    /// Extract and diff only; never notify or save new entries.
    /// A corrupted document is still repaired on load.
    pub dry_run: bool,
}

impl RunOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_concurrent: config.crawler.max_concurrent,
            commit_policy: config.pipeline.commit_policy,
            dry_run: false,
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_concurrent: 1,
            commit_policy: CommitPolicy::default(),
            dry_run: false,
        }
    }
}

/// Counts for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReport {
    pub name: String,
    pub found: usize,
    pub new: usize,
}

/// What happened during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub load: LoadStatus,
    pub sources: Vec<SourceReport>,
    /// `None` when nothing was sent (no new entries, or a dry run)
    pub delivery: Option<DeliveryOutcome>,
    pub persisted: bool,
    pub dry_run: bool,
}

impl RunReport {
    pub fn new_count(&self) -> usize {
        self.sources.iter().map(|s| s.new).sum()
    }
}

/// Drives a run over borrowed collaborators.
pub struct Watcher<'a> {
    sources: &'a [SourceConfig],
    fetcher: &'a dyn PageFetcher,
    store: &'a DedupStore,
    notifier: &'a dyn Notifier,
    options: RunOptions,
}

impl<'a> Watcher<'a> {
    pub fn new(
        sources: &'a [SourceConfig],
        fetcher: &'a dyn PageFetcher,
        store: &'a DedupStore,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            sources,
            fetcher,
            store,
            notifier,
            options: RunOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Perform one run. Never fails; see the returned report.
    pub async fn run(&self) -> RunReport {
        let started_at = Utc::now();

        // Load
        let (mut state, load) = self.store.load_with_status().await;

        // Extract + diff
        let extracted = self.extract_all().await;
        let mut digest = Digest::default();
        let mut sources = Vec::with_capacity(self.sources.len());

        for (source, items) in self.sources.iter().zip(extracted) {
            let found = items.len();
            let new = Self::diff_source(&mut state, source, items);
            sources.push(SourceReport {
                name: source.name.clone(),
                found,
                new: new.len(),
            });
            digest.push(source.title.clone(), new);
        }

        let mut report = RunReport {
            started_at,
            finished_at: started_at,
            load,
            sources,
            delivery: None,
            persisted: false,
            dry_run: self.options.dry_run,
        };

        // Decide
        if !digest.has_entries() {
            log::info!("No new items found.");
            report.finished_at = Utc::now();
            return report;
        }

        if self.options.dry_run {
            log::info!("Dry run, not sending:\n{}", digest.render());
            report.finished_at = Utc::now();
            return report;
        }

        // Notify
        let delivery = self.notifier.send(&digest).await;

        // Persist
        report.persisted = self.commit(&state, &report.load, &delivery).await;
        report.delivery = Some(delivery);
        report.finished_at = Utc::now();
        report
    }

    /// Run every adapter, keeping config order.
    async fn extract_all(&self) -> Vec<Vec<RawItem>> {
        let adapter = SourceAdapter::new(self.fetcher);
        let adapter = &adapter;
        stream::iter(self.sources)
            .map(move |source| adapter.extract(source))
            .buffered(self.options.max_concurrent.max(1))
            .collect()
            .await
    }

    /// Normalize one source's items and move the unseen ones into its seen set.
    fn diff_source(
        state: &mut PersistedState,
        source: &SourceConfig,
        items: Vec<RawItem>,
    ) -> Vec<Entry> {
        let base = match source.base() {
            Ok(base) => base,
            Err(e) => {
                log::error!("{}: invalid base_url: {}", source.name, e);
                return Vec::new();
            }
        };

        let entries = items.into_iter().map(|item| {
            let entry = Entry::normalize(&item.text, item.href.as_deref(), &base);
            log::debug!("- {entry}");
            entry
        });

        let new = take_new(state.seen_mut(&source.name), entries);
        if !new.is_empty() {
            log::info!("{}: {} new items", source.name, new.len());
        }
        new
    }

    /// Save the merged state if the commit policy allows it.
    ///
    /// State that could not be read is never written back: it was rebuilt
    /// from empty and would replace the stored history with this run's
    /// entries only. A failed save is logged and swallowed; the same entries
    /// will be reported again next run.
    async fn commit(
        &self,
        state: &PersistedState,
        load: &LoadStatus,
        delivery: &DeliveryOutcome,
    ) -> bool {
        if let LoadStatus::Unavailable { reason } = load {
            log::warn!(
                "State at {} was not loaded ({}); leaving it untouched",
                self.store.location(),
                reason
            );
            return false;
        }

        if self.options.commit_policy == CommitPolicy::AfterDelivery && !delivery.is_delivered() {
            log::warn!("Digest not delivered; leaving state untouched so it is re-sent next run");
            return false;
        }

        match self.store.save(state).await {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to update seen items at {}: {}", self.store.location(), e);
                false
            }
        }
    }
}

/// Wire up the production collaborators and perform one run.
///
/// Never fails. An unusable store (missing credentials, unsupported
/// backend) is reported before any network call and the run continues
/// without state: everything found is new, and nothing is saved.
pub async fn run_once(config: &Config, secrets: &Secrets, dry_run: bool) -> RunReport {
    let client = create_async_client(&config.crawler).unwrap_or_else(|e| {
        log::error!("HTTP client setup failed ({}); using defaults", e);
        reqwest::Client::new()
    });
    let backend: Box<dyn StateBackend> = match build_backend(config, secrets, &client).await {
        Ok(backend) => backend,
        Err(e) => {
            log::error!("State store unusable: {}", e);
            Box::new(UnavailableBackend::new(e.to_string()))
        }
    };
    let store = DedupStore::new(backend, config.source_names());
    let fetcher = HttpFetcher::new(client.clone());
    let notifier = TelegramNotifier::new(
        client,
        config.notifier.clone(),
        secrets.bot_token.clone(),
        secrets.chat_id.clone(),
    );

    let options = RunOptions {
        dry_run,
        ..RunOptions::from_config(config)
    };

    log::info!(
        "Watching {} sources, state at {}",
        config.sources.len(),
        store.location()
    );

    Watcher::new(&config.sources, &fetcher, &store, &notifier)
        .with_options(options)
        .run()
        .await
}
