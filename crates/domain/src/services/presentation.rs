//! List and map view derivation.
//!
//! Pure functions from roster entries to the filtered, ordered slice a UI
//! renders. Nothing here touches the roster cell.

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::LoadFailure;
use crate::models::{DisplayMode, RosterEntry, RosterSnapshot, SubscriptionHealth};

/// A filtered, ordered roster with the state a UI shows around it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterView {
    #[serde(serialize_with = "serialize_entries")]
    pub entries: Vec<Arc<RosterEntry>>,
    /// Roster size before filtering.
    pub total: usize,
    pub is_loading: bool,
    pub has_loaded: bool,
    pub error: Option<LoadFailure>,
    pub subscription: SubscriptionHealth,
}

impl RosterView {
    pub fn from_snapshot(
        snapshot: &RosterSnapshot,
        query: &str,
        mode: DisplayMode,
        subscription: SubscriptionHealth,
    ) -> Self {
        Self {
            entries: filter_and_sort(snapshot.entries.entries(), query, mode),
            total: snapshot.entries.len(),
            is_loading: snapshot.is_loading,
            has_loaded: snapshot.has_loaded,
            error: snapshot.error.clone(),
            subscription,
        }
    }
}

fn serialize_entries<S: Serializer>(
    entries: &[Arc<RosterEntry>],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(entries.iter().map(|entry| entry.as_ref()))
}

/// Filters `entries` by `query` and `mode`, then sorts them for display.
///
/// Deterministic and idempotent: applying it to its own output yields the
/// same sequence.
pub fn filter_and_sort(
    entries: &[Arc<RosterEntry>],
    query: &str,
    mode: DisplayMode,
) -> Vec<Arc<RosterEntry>> {
    let needle = query.trim().to_lowercase();
    let mut view: Vec<Arc<RosterEntry>> = entries
        .iter()
        .filter(|entry| matches_mode(entry, mode))
        .filter(|entry| matches_query(entry, &needle))
        .cloned()
        .collect();
    view.sort_by(|a, b| compare_entries(a, b));
    view
}

fn matches_mode(entry: &RosterEntry, mode: DisplayMode) -> bool {
    match mode {
        DisplayMode::All => true,
        DisplayMode::WithLocationOnly => entry.has_location(),
    }
}

/// Case-insensitive substring match against name, group, location and email.
///
/// `needle` must already be trimmed and lowercased; an empty needle matches
/// everything.
pub fn matches_query(entry: &RosterEntry, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let contains = |haystack: &str| haystack.to_lowercase().contains(needle);

    contains(&entry.display_name)
        || contains(&entry.group_name)
        || entry.location_label().is_some_and(|label| contains(&label))
        || contains(&entry.email)
}

/// Display order: safe first, then located, then most recent report, then name.
pub fn compare_entries(a: &RosterEntry, b: &RosterEntry) -> Ordering {
    b.status
        .is_safe()
        .cmp(&a.status.is_safe())
        .then_with(|| b.has_location().cmp(&a.has_location()))
        .then_with(|| match (a.last_reported_at, b.last_reported_at) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| {
            a.display_name
                .to_lowercase()
                .cmp(&b.display_name.to_lowercase())
        })
}
