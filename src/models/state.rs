// src/models/state.rs

//! Seen-entry sets and their persisted document form.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::models::Entry;

/// Entries observed for one source across all prior runs.
///
/// Keeps first-seen order so the serialized document does not churn
/// between runs that add nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Entry>", into = "Vec<Entry>")]
pub struct SeenSet {
    order: Vec<Entry>,
    index: HashSet<Entry>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry. Returns `true` if it was not already present.
    pub fn insert(&mut self, entry: Entry) -> bool {
        if self.index.contains(&entry) {
            return false;
        }
        self.index.insert(entry.clone());
        self.order.push(entry);
        true
    }

    pub fn contains(&self, entry: &Entry) -> bool {
        self.index.contains(entry)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.order.iter()
    }
}

impl From<Vec<Entry>> for SeenSet {
    fn from(entries: Vec<Entry>) -> Self {
        let mut set = Self::new();
        for entry in entries {
            set.insert(entry);
        }
        set
    }
}

impl From<SeenSet> for Vec<Entry> {
    fn from(set: SeenSet) -> Self {
        set.order
    }
}

/// All seen sets, keyed by source name. Serialized as one JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersistedState {
    sources: BTreeMap<String, SeenSet>,
}

impl PersistedState {
    /// An empty but well-formed state with a key for every source.
    pub fn empty<S: AsRef<str>>(source_names: &[S]) -> Self {
        Self {
            sources: source_names
                .iter()
                .map(|name| (name.as_ref().to_string(), SeenSet::new()))
                .collect(),
        }
    }

    pub fn seen(&self, source: &str) -> Option<&SeenSet> {
        self.sources.get(source)
    }

    /// Seen set for a source, created empty if missing.
    pub fn seen_mut(&mut self, source: &str) -> &mut SeenSet {
        self.sources.entry(source.to_string()).or_default()
    }

    /// Total number of entries across all sources.
    pub fn entry_count(&self) -> usize {
        self.sources.values().map(SeenSet::len).sum()
    }

    /// Pretty-printed JSON document.
    pub fn to_document(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Outcome of checking a stored document against the expected shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateCheck {
    Valid(PersistedState),
    Invalid(String),
}

/// Validate a stored document.
///
/// A valid document is a JSON object with an array of strings for every
/// known source. Unknown extra keys are dropped.
pub fn check_document<S: AsRef<str>>(content: &str, source_names: &[S]) -> StateCheck {
    let value: Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(e) => return StateCheck::Invalid(format!("not valid JSON: {e}")),
    };

    let Value::Object(mut map) = value else {
        return StateCheck::Invalid("document is not a JSON object".to_string());
    };

    let mut state = PersistedState::default();
    for name in source_names {
        let name = name.as_ref();
        let Some(Value::Array(items)) = map.remove(name) else {
            return StateCheck::Invalid(format!("'{name}' is missing or not an array"));
        };

        let set = state.seen_mut(name);
        for item in items {
            let Value::String(s) = item else {
                return StateCheck::Invalid(format!("'{name}' contains a non-string item"));
            };
            set.insert(Entry::from(s));
        }
    }

    if !map.is_empty() {
        log::debug!(
            "Ignoring unknown keys in state document: {:?}",
            map.keys().collect::<Vec<_>>()
        );
    }

    StateCheck::Valid(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCES: [&str; 2] = ["unionly", "theatrical"];

    #[test]
    fn test_seen_set_keeps_first_order() {
        let mut set = SeenSet::new();
        assert!(set.insert("b".into()));
        assert!(set.insert("a".into()));
        assert!(!set.insert("b".into()));
        let items: Vec<_> = set.iter().map(Entry::as_str).collect();
        assert_eq!(items, vec!["b", "a"]);
    }

    #[test]
    fn test_check_valid_document() {
        let doc = r#"{"unionly": ["x", "y"], "theatrical": [], "legacy": 1}"#;
        let StateCheck::Valid(state) = check_document(doc, &SOURCES) else {
            panic!("expected valid document");
        };
        assert_eq!(state.seen("unionly").unwrap().len(), 2);
        assert!(state.seen("theatrical").unwrap().is_empty());
        assert!(state.seen("legacy").is_none());
    }

    #[test]
    fn test_check_rejects_malformed_documents() {
        for doc in [
            "not json",
            "{}",
            r#"{"unionly": "x"}"#,
            r#"["unionly"]"#,
            "null",
            r#"{"unionly": [], "theatrical": [1]}"#,
            r#"{"unionly": []}"#,
        ] {
            assert!(
                matches!(check_document(doc, &SOURCES), StateCheck::Invalid(_)),
                "accepted {doc}"
            );
        }
    }

    #[test]
    fn test_document_round_trip() {
        let mut state = PersistedState::empty(&SOURCES);
        state.seen_mut("unionly").insert(r"[A\_B](https://x.io/1)".into());
        state.seen_mut("unionly").insert("plain".into());

        let doc = state.to_document().unwrap();
        let StateCheck::Valid(parsed) = check_document(&doc, &SOURCES) else {
            panic!("round trip produced invalid document");
        };
        assert_eq!(parsed, state);
        assert_eq!(parsed.to_document().unwrap(), doc);
    }

    #[test]
    fn test_empty_state_has_every_source() {
        let state = PersistedState::empty(&SOURCES);
        assert_eq!(
            state.to_document().unwrap().replace(char::is_whitespace, ""),
            r#"{"theatrical":[],"unionly":[]}"#
        );
        assert_eq!(state.entry_count(), 0);
    }
}
