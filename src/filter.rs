//! Filter pipeline - pure selection of triage candidates from the catalog

use crate::catalog::{Item, MediaKind};
use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Media-kind predicate. `Photos` is plain images only; live photos have
/// their own bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KindFilter {
    Photos,
    Videos,
    LivePhotos,
}

impl KindFilter {
    fn matches(self, kind: MediaKind) -> bool {
        match self {
            KindFilter::Photos => kind == MediaKind::Photo,
            KindFilter::Videos => kind == MediaKind::Video,
            KindFilter::LivePhotos => kind == MediaKind::LivePhoto,
        }
    }
}

/// AND-combined predicates; `None` means "no restriction"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub folder: Option<String>,
    pub kind: Option<KindFilter>,
    /// Exact `YYYYMM` key, compared as a string
    pub month: Option<String>,
}

/// Month key from the local calendar fields of a capture timestamp.
/// A zero/garbage timestamp maps to a degenerate key that never matches a
/// real month filter; that is accepted behavior, not an error.
pub fn month_key(taken_at: i64) -> String {
    Local
        .timestamp_opt(taken_at, 0)
        .single()
        .map(|dt| dt.format("%Y%m").to_string())
        .unwrap_or_else(|| "000000".to_string())
}

/// Pure and deterministic: catalog order in, catalog order out, minus
/// processed items and anything a predicate rejects.
pub fn filter_candidates(items: &[Item], spec: &FilterSpec, processed: &HashSet<i64>) -> Vec<Item> {
    items
        .iter()
        .filter(|item| !processed.contains(&item.id))
        .filter(|item| spec.folder.as_deref().map_or(true, |f| item.folder == f))
        .filter(|item| spec.kind.map_or(true, |k| k.matches(item.kind)))
        .filter(|item| {
            spec.month
                .as_deref()
                .map_or(true, |m| month_key(item.taken_at) == m)
        })
        .cloned()
        .collect()
}
