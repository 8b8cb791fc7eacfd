//! Tombstone tracking for deletion propagation.
//!
//! Deleting an entity only removes it locally; a stale copy may still
//! live on another device. The id of every deleted entity is recorded
//! here so the merge can veto its resurrection. Lists are
//! append-only under normal operation and trimmed by [`DeletedIds::prune`].

use crate::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Maximum number of tombstones kept per entity kind once an id no
/// longer excludes anything. Oldest entries are dropped first.
pub const TOMBSTONE_CAPACITY: usize = 200;

/// Per-entity-kind deletion log.
///
/// An id present here must never reappear in the matching collection
/// after a merge. New ids are appended, so list order doubles as
/// recency order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedIds {
    #[serde(default)]
    pub transactions: Vec<EntityId>,
    #[serde(default)]
    pub goals: Vec<EntityId>,
    #[serde(default)]
    pub jobs: Vec<EntityId>,
}

impl DeletedIds {
    /// True when no kind holds any tombstone.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty() && self.goals.is_empty() && self.jobs.is_empty()
    }

    /// Total tombstone count across all kinds.
    pub fn len(&self) -> usize {
        self.transactions.len() + self.goals.len() + self.jobs.len()
    }

    /// Union of two deletion logs, preserving recency order: all of
    /// `self` first, then ids only `other` knows about. A deletion
    /// recorded on either device wins over a live copy on the other,
    /// so the union runs before any entity merging.
    pub fn union(&self, other: &DeletedIds) -> DeletedIds {
        DeletedIds {
            transactions: union_kind(&self.transactions, &other.transactions),
            goals: union_kind(&self.goals, &other.goals),
            jobs: union_kind(&self.jobs, &other.jobs),
        }
    }

    /// Drop tombstones that no longer earn their keep.
    ///
    /// An id found in the matching `excluding` set still suppresses a
    /// live entity somewhere and is kept unconditionally. The rest are
    /// capped at [`TOMBSTONE_CAPACITY`] per kind, most recent first.
    /// Pruning an id a lagging device still needs can in theory allow
    /// a resurrection; the capacity is a policy knob, not a
    /// correctness guarantee.
    pub fn prune(&self, excluding: &ExcludedIds) -> DeletedIds {
        DeletedIds {
            transactions: prune_kind(
                &self.transactions,
                &excluding.transactions,
                TOMBSTONE_CAPACITY,
            ),
            goals: prune_kind(&self.goals, &excluding.goals, TOMBSTONE_CAPACITY),
            jobs: prune_kind(&self.jobs, &excluding.jobs, TOMBSTONE_CAPACITY),
        }
    }
}

/// Ids that a merge actually filtered out of a collection, per kind.
/// These tombstones are still doing work and must survive pruning.
#[derive(Debug, Clone, Default)]
pub struct ExcludedIds {
    pub transactions: HashSet<EntityId>,
    pub goals: HashSet<EntityId>,
    pub jobs: HashSet<EntityId>,
}

fn union_kind(a: &[EntityId], b: &[EntityId]) -> Vec<EntityId> {
    let mut seen: HashSet<&str> = a.iter().map(String::as_str).collect();
    let mut out = a.to_vec();
    for id in b {
        if seen.insert(id) {
            out.push(id.clone());
        }
    }
    out
}

fn prune_kind(ids: &[EntityId], excluding: &HashSet<EntityId>, capacity: usize) -> Vec<EntityId> {
    let (kept, prunable): (Vec<_>, Vec<_>) = ids
        .iter()
        .cloned()
        .partition(|id| excluding.contains(id));

    let mut out = kept;
    if prunable.len() > capacity {
        // Newest entries sit at the tail
        out.extend(prunable[prunable.len() - capacity..].iter().cloned());
    } else {
        out.extend(prunable);
    }
    out
}
