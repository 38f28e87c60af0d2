// src/services/sources.rs

//! Source adapter.
//!
//! Fetches one page and pulls (text, link) pairs out of the nodes matching
//! the source's item selector, in document order.

use scraper::Html;

use crate::error::Result;
use crate::models::{RawItem, SourceConfig, parse_selector};
use crate::utils::http::PageFetcher;

/// Extracts raw items from a configured source.
pub struct SourceAdapter<'a> {
    fetcher: &'a dyn PageFetcher,
}

impl<'a> SourceAdapter<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher) -> Self {
        Self { fetcher }
    }

    /// Fetch and extract. Failures are logged and yield no items.
    pub async fn extract(&self, source: &SourceConfig) -> Vec<RawItem> {
        match self.try_extract(source).await {
            Ok(items) => {
                log::info!("{}: found {} items", source.name, items.len());
                items
            }
            Err(e) => {
                log::error!("{}: error scraping {}: {}", source.name, source.url, e);
                Vec::new()
            }
        }
    }

    async fn try_extract(&self, source: &SourceConfig) -> Result<Vec<RawItem>> {
        let html = self.fetcher.fetch(&source.url).await?;
        parse_items(source, &html)
    }
}

/// Pull raw items out of page markup.
///
/// A node without a link is still returned, with `href` set to `None`.
pub fn parse_items(source: &SourceConfig, html: &str) -> Result<Vec<RawItem>> {
    let item_sel = parse_selector(&source.item_selector)?;
    let link_sel = parse_selector(&source.link_selector)?;
    let document = Html::parse_document(html);

    let items = document
        .select(&item_sel)
        .map(|node| {
            let text: String = node.text().collect();
            let href = node
                .select(&link_sel)
                .next()
                .and_then(|link| link.value().attr(&source.link_attr))
                .map(str::to_string);
            RawItem { text, href }
        })
        .collect();

    Ok(items)
}
