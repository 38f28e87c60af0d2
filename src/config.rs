// src/config.rs

//! Configuration loading utilities.
//!
//! Non-secret settings come from a TOML file; credentials come only from
//! the process environment.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::{Config, StoreBackend};

/// Environment variable holding the Telegram bot token.
pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
/// Environment variable holding the destination chat id.
pub const ENV_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
/// Environment variable holding the GitHub token for the state gist.
pub const ENV_GIST_TOKEN: &str = "GIST_TOKEN";
/// Environment variable overriding `store.gist_id`.
pub const ENV_GIST_ID: &str = "GIST_ID";

/// Credentials supplied at process start. Empty values count as absent.
#[derive(Clone, Default)]
pub struct Secrets {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    pub gist_token: Option<String>,
    pub gist_id: Option<String>,
}

impl Secrets {
    /// Read credentials from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through an arbitrary lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            bot_token: get(ENV_BOT_TOKEN),
            chat_id: get(ENV_CHAT_ID),
            gist_token: get(ENV_GIST_TOKEN),
            gist_id: get(ENV_GIST_ID),
        }
    }

    /// Apply overrides to the file configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(id) = &self.gist_id {
            config.store.gist_id = id.clone();
        }
    }

    /// Check that the configured store backend has what it needs.
    ///
    /// Runs before any network call so a misconfigured deployment never
    /// touches the remote document.
    pub fn check_store(&self, config: &Config) -> Result<()> {
        if config.store.backend != StoreBackend::Gist {
            return Ok(());
        }
        if self.gist_token.is_none() {
            return Err(AppError::config(format!("{ENV_GIST_TOKEN} is not set")));
        }
        if config.store.gist_id.trim().is_empty() {
            return Err(AppError::config(format!(
                "store.gist_id is empty and {ENV_GIST_ID} is not set"
            )));
        }
        Ok(())
    }

    /// Whether the notifier can attempt delivery.
    pub fn has_notifier(&self) -> bool {
        self.bot_token.is_some() && self.chat_id.is_some()
    }
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "***");
        f.debug_struct("Secrets")
            .field("bot_token", &mask(&self.bot_token))
            .field("chat_id", &self.chat_id)
            .field("gist_token", &mask(&self.gist_token))
            .field("gist_id", &self.gist_id)
            .finish()
    }
}

/// Load the file configuration and layer environment overrides on top.
pub fn load_all(path: &Path) -> (Config, Secrets) {
    let mut config = Config::load_or_default(path);
    let secrets = Secrets::from_env();
    secrets.apply(&mut config);
    (config, secrets)
}
