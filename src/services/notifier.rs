// src/services/notifier.rs

//! Digest rendering and Telegram delivery.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Entry, NotifierConfig};

/// New entries for one source, in extraction order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestSection {
    pub title: String,
    pub entries: Vec<Entry>,
}

/// One outbound message covering every configured source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Digest {
    pub sections: Vec<DigestSection>,
}

impl Digest {
    pub fn push(&mut self, title: impl Into<String>, entries: Vec<Entry>) {
        self.sections.push(DigestSection {
            title: title.into(),
            entries,
        });
    }

    /// Whether any section has something to report.
    pub fn has_entries(&self) -> bool {
        self.sections.iter().any(|s| !s.entries.is_empty())
    }

    pub fn entry_count(&self) -> usize {
        self.sections.iter().map(|s| s.entries.len()).sum()
    }

    /// Render the message text.
    ///
    /// Every section is listed; one with no entries shows a `None` line.
    pub fn render(&self) -> String {
        self.sections
            .iter()
            .map(|section| {
                let body = if section.entries.is_empty() {
                    "None".to_string()
                } else {
                    section
                        .entries
                        .iter()
                        .map(|e| format!("- {e}"))
                        .collect::<Vec<_>>()
                        .join("\n")
                };
                format!("*{} Items:*\n{}", section.title, body)
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Result of a delivery attempt. Never an error: the run continues either way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered,
    /// Not attempted (missing credentials or nothing to send)
    Skipped(String),
    /// Attempted and rejected, or the request failed
    Failed(String),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Delivers a digest to a chat.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, digest: &Digest) -> DeliveryOutcome;
}

/// `sendMessage` request body.
#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

/// Telegram Bot API notifier.
pub struct TelegramNotifier {
    client: reqwest::Client,
    config: NotifierConfig,
    bot_token: Option<String>,
    chat_id: Option<String>,
}

impl TelegramNotifier {
    pub fn new(
        client: reqwest::Client,
        config: NotifierConfig,
        bot_token: Option<String>,
        chat_id: Option<String>,
    ) -> Self {
        Self {
            client,
            config,
            bot_token,
            chat_id,
        }
    }

    fn endpoint(&self, token: &str) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_base.trim_end_matches('/'),
            token
        )
    }

    async fn post(&self, token: &str, chat_id: &str, text: &str) -> Result<()> {
        let payload = SendMessage {
            chat_id,
            text,
            parse_mode: &self.config.parse_mode,
            disable_web_page_preview: self.config.disable_web_page_preview,
        };

        let response = self
            .client
            .post(self.endpoint(token))
            .json(&payload)
            .send()
            .await
            // The URL carries the bot token.
            .map_err(|e| AppError::Http(e.without_url()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(AppError::notify(format!("{status}: {body}")))
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, digest: &Digest) -> DeliveryOutcome {
        let (Some(token), Some(chat_id)) = (self.bot_token.as_deref(), self.chat_id.as_deref())
        else {
            log::error!("Missing Telegram credentials. Skipping Telegram message.");
            return DeliveryOutcome::Skipped("missing credentials".to_string());
        };

        if digest.sections.is_empty() {
            log::error!("Digest has no sections. Skipping Telegram message.");
            return DeliveryOutcome::Skipped("empty digest".to_string());
        }
        let text = digest.render();

        match self.post(token, chat_id, &text).await {
            Ok(()) => {
                log::info!("Telegram message sent ({} entries)", digest.entry_count());
                DeliveryOutcome::Delivered
            }
            Err(e) => {
                log::error!("Telegram error: {}", e);
                log::error!("Message that caused the error: {}", text);
                DeliveryOutcome::Failed(e.to_string())
            }
        }
    }
}
