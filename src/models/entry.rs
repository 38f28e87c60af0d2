// src/models/entry.rs

//! Canonical entry strings.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::utils::resolve_url;

/// Characters with meaning in the digest markup.
static MARKDOWN_SPECIAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([_*\[\]()~`>#+=|{}.!\-])").expect("markdown escape pattern is valid")
});

/// One observed item, in the exact form it is compared, stored and sent.
///
/// Two extractions of the same item must produce byte-identical entries,
/// otherwise novelty detection reports it again (or never).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entry(String);

impl Entry {
    /// Build an entry from raw node text and an optional link.
    ///
    /// Whitespace runs collapse to single spaces, markup characters in the
    /// text are backslash-escaped, and a relative link is resolved against
    /// `base`. The link itself is never escaped.
    pub fn normalize(text: &str, href: Option<&str>, base: &Url) -> Self {
        let escaped = escape_markdown(&collapse_whitespace(text));

        let link = href
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(|h| resolve_url(base, h));

        match link {
            Some(link) => Self(format!("[{escaped}]({link})")),
            None => Self(escaped),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Entry {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Entry {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Collapse all whitespace runs (newlines and tabs included) and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Backslash-escape every markup character exactly once.
pub fn escape_markdown(text: &str) -> String {
    MARKDOWN_SPECIAL.replace_all(text, r"\${1}").into_owned()
}
