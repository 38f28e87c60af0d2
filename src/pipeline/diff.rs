//! Novelty detection against a seen set.

use crate::models::{Entry, SeenSet};

/// Split `entries` into what `seen` already holds and what it does not.
///
/// Returns the new entries in input order, first occurrence only. Every new
/// entry is added to `seen` immediately, so duplicates within the same batch
/// are suppressed too. Afterwards `seen` is the union of its old contents
/// and `entries`.
pub fn take_new<I>(seen: &mut SeenSet, entries: I) -> Vec<Entry>
where
    I: IntoIterator<Item = Entry>,
{
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.clone()))
        .collect()
}
