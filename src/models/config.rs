//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::SourceConfig;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP fetch behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Run-level policy settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Chat delivery settings
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Remote state document settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Watched sources, in digest order
    #[serde(default = "defaults::default_sources")]
    pub sources: Vec<SourceConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Names of all configured sources, in config order.
    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name.clone()).collect()
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.notifier.api_base.trim().is_empty() {
            return Err(AppError::validation("notifier.api_base is empty"));
        }
        if self.sources.is_empty() {
            return Err(AppError::validation("No sources defined"));
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            source.validate()?;
            if !names.insert(source.name.as_str()) {
                return Err(AppError::validation(format!(
                    "Duplicate source name '{}'",
                    source.name
                )));
            }
        }

        self.store.validate()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            pipeline: PipelineConfig::default(),
            notifier: NotifierConfig::default(),
            store: StoreConfig::default(),
            sources: defaults::default_sources(),
        }
    }
}

/// HTTP client settings shared by every outbound call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds (one attempt per call)
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum sources fetched at once
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// What to do with newly seen entries when the digest was not delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitPolicy {
    /// Persist regardless of the delivery outcome. An undelivered digest is lost.
    #[default]
    Always,
    /// Persist only after a successful delivery. Undelivered entries are reported again.
    AfterDelivery,
}

/// Run-level settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub commit_policy: CommitPolicy,
}

/// Telegram delivery settings. Credentials come from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Bot API base URL
    #[serde(default = "defaults::telegram_api_base")]
    pub api_base: String,

    /// Value sent as `parse_mode`
    #[serde(default = "defaults::parse_mode")]
    pub parse_mode: String,

    #[serde(default)]
    pub disable_web_page_preview: bool,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::telegram_api_base(),
            parse_mode: defaults::parse_mode(),
            disable_web_page_preview: false,
        }
    }
}

/// Which backend holds the persisted state document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Gist,
    Local,
    S3,
}

/// Remote state document settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Gist holding the state file (overridable with `GIST_ID`)
    #[serde(default = "defaults::gist_id")]
    pub gist_id: String,

    /// File name inside the gist
    #[serde(default = "defaults::gist_filename")]
    pub gist_filename: String,

    /// GitHub REST API base URL
    #[serde(default = "defaults::github_api_base")]
    pub github_api_base: String,

    /// State file for the local backend
    #[serde(default = "defaults::local_path")]
    pub local_path: String,

    #[serde(default)]
    pub s3_bucket: String,

    #[serde(default = "defaults::s3_key")]
    pub s3_key: String,
}

impl StoreConfig {
    fn validate(&self) -> Result<()> {
        match self.backend {
            StoreBackend::Gist if self.gist_filename.trim().is_empty() => {
                Err(AppError::validation("store.gist_filename is empty"))
            }
            StoreBackend::Local if self.local_path.trim().is_empty() => {
                Err(AppError::validation("store.local_path is empty"))
            }
            StoreBackend::S3 if self.s3_bucket.trim().is_empty() => {
                Err(AppError::validation("store.s3_bucket is empty"))
            }
            _ => Ok(()),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            gist_id: defaults::gist_id(),
            gist_filename: defaults::gist_filename(),
            github_api_base: defaults::github_api_base(),
            local_path: defaults::local_path(),
            s3_bucket: String::new(),
            s3_key: defaults::s3_key(),
        }
    }
}

mod defaults {
    use crate::models::SourceConfig;

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; pagewatch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_concurrent() -> usize {
        2
    }

    // Notifier defaults
    pub fn telegram_api_base() -> String {
        "https://api.telegram.org".into()
    }
    pub fn parse_mode() -> String {
        "Markdown".into()
    }

    // Store defaults
    pub fn gist_id() -> String {
        "21539a315a95814d617a76c3e80f2622".into()
    }
    pub fn gist_filename() -> String {
        "seenItems.json".into()
    }
    pub fn github_api_base() -> String {
        "https://api.github.com".into()
    }
    pub fn local_path() -> String {
        "data/seenItems.json".into()
    }
    pub fn s3_key() -> String {
        "pagewatch/seenItems.json".into()
    }

    // Source defaults
    pub fn default_sources() -> Vec<SourceConfig> {
        vec![
            SourceConfig {
                name: "unionly".to_string(),
                title: "Unionly".to_string(),
                url: "https://unionly.io/o/wwtt/store/products".to_string(),
                base_url: "https://unionly.io".to_string(),
                item_selector: "div.w-full.max-w-sm.mx-auto.rounded-md.shadow-md.overflow-hidden"
                    .to_string(),
                link_selector: "a".to_string(),
                link_attr: "href".to_string(),
            },
            SourceConfig {
                name: "theatrical".to_string(),
                title: "TheatricalTraining.org".to_string(),
                url: "https://theatricaltraining.com/#thecalendar".to_string(),
                base_url: "https://theatricaltraining.com".to_string(),
                item_selector: "div.ee-event-header-lnk".to_string(),
                link_selector: "a".to_string(),
                link_attr: "href".to_string(),
            },
        ]
    }
}
