// src/models/source.rs

//! Per-source extraction rules.

use scraper::Selector;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// One watched page and the rules for finding items on it.
///
/// Selection rules drift as the sites change, so they live here as
/// source-owned configuration rather than in the extraction code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Stable key in the persisted state document
    pub name: String,

    /// Heading shown in the digest
    pub title: String,

    /// Page to fetch
    pub url: String,

    /// Base for resolving relative links
    pub base_url: String,

    /// CSS selector matching one node per item
    pub item_selector: String,

    /// CSS selector for the link inside an item (first match wins)
    #[serde(default = "default_link_selector")]
    pub link_selector: String,

    /// Attribute holding the link target
    #[serde(default = "default_link_attr")]
    pub link_attr: String,
}

fn default_link_selector() -> String {
    "a".to_string()
}

fn default_link_attr() -> String {
    "href".to_string()
}

impl SourceConfig {
    /// Parsed base URL for link resolution.
    pub fn base(&self) -> Result<Url> {
        Ok(Url::parse(&self.base_url)?)
    }

    /// Check names, URLs and selectors.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("source name is empty"));
        }
        if self.link_attr.trim().is_empty() {
            return Err(AppError::validation(format!(
                "source '{}' has an empty link_attr",
                self.name
            )));
        }
        Url::parse(&self.url)?;
        self.base()?;
        parse_selector(&self.item_selector)?;
        parse_selector(&self.link_selector)?;
        Ok(())
    }
}

/// Parse a CSS selector, keeping the offending text in the error.
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SourceConfig {
        SourceConfig {
            name: "events".into(),
            title: "Events".into(),
            url: "https://example.com/events".into(),
            base_url: "https://example.com".into(),
            item_selector: "div.event".into(),
            link_selector: default_link_selector(),
            link_attr: default_link_attr(),
        }
    }

    #[test]
    fn test_parse_selector_valid() {
        assert!(parse_selector("div.class").is_ok());
        assert!(parse_selector("ul > li a[href]").is_ok());
    }

    #[test]
    fn test_parse_selector_invalid() {
        assert!(parse_selector("[[invalid").is_err());
    }

    #[test]
    fn test_validate() {
        assert!(sample().validate().is_ok());

        let mut bad_url = sample();
        bad_url.base_url = "not a url".into();
        assert!(bad_url.validate().is_err());

        let mut bad_selector = sample();
        bad_selector.item_selector = "[[".into();
        assert!(matches!(
            bad_selector.validate(),
            Err(AppError::Selector { .. })
        ));
    }
}
