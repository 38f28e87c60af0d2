//! Shared helpers: HTTP plumbing and link resolution.

pub mod http;

use url::Url;

/// Turn a scraped `href` into an absolute link against the source base.
///
/// Absolute links come back unchanged. An `href` that cannot be joined is
/// kept verbatim, so the entry stays stable across runs.
pub fn resolve_url(base: &Url, href: &str) -> String {
    match base.join(href) {
        Ok(url) => url.to_string(),
        Err(_) => href.to_string(),
    }
}
