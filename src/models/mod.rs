// src/models/mod.rs

//! Domain models for the watcher.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod entry;
mod source;
mod state;

// Re-export all public types
pub use config::{
    CommitPolicy, Config, CrawlerConfig, NotifierConfig, PipelineConfig, StoreBackend,
    StoreConfig,
};
pub use entry::{Entry, collapse_whitespace, escape_markdown};
pub use source::{SourceConfig, parse_selector};
pub use state::{PersistedState, SeenSet, StateCheck, check_document};

/// Raw (text, link) pair pulled from one candidate node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItem {
    pub text: String,
    pub href: Option<String>,
}
