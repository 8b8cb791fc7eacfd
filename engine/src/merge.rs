//! Pairwise merge of a local and a remote state.
//!
//! The policy is field-owner reconciliation rather than clock
//! comparison: each entity kind has a designated authority that wins
//! ties on the same id.
//!
//! - **Jobs** are remote-authoritative: the device holding the
//!   canonical cloud record (the parent) owns the job board.
//! - **Transactions and goals** are local-authoritative: the child's
//!   device is the source of truth for its own spending.
//!
//! Tombstones are unioned *before* any entity merging, so a deletion
//! recorded on either device always beats a live copy on the other.
//! The merge is pairwise only; convergence across three or more
//! replicas that diverged independently is not defined by this policy.

use crate::model::{AppState, Entity, ParentSettings};
use crate::tombstone::ExcludedIds;
use crate::EntityId;
use std::collections::{HashMap, HashSet};

/// Which side wins when both hold the same entity id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Authority {
    Local,
    Remote,
}

/// Merge `remote` into `local`, producing the reconciled state.
///
/// Idempotent: `merge(s, s)` is fingerprint-equal to `s`.
pub fn merge(local: &AppState, remote: &AppState) -> AppState {
    let tombstones = local.deleted_ids.union(&remote.deleted_ids);

    let (jobs, excluded_jobs) = merge_collection(
        &local.jobs,
        &remote.jobs,
        Authority::Remote,
        &tombstones.jobs,
    );
    let (transactions, excluded_transactions) = merge_collection(
        &local.transactions,
        &remote.transactions,
        Authority::Local,
        &tombstones.transactions,
    );
    let (goals, excluded_goals) = merge_collection(
        &local.goals,
        &remote.goals,
        Authority::Local,
        &tombstones.goals,
    );

    let excluded = ExcludedIds {
        transactions: excluded_transactions,
        goals: excluded_goals,
        jobs: excluded_jobs,
    };

    AppState {
        transactions,
        goals,
        jobs,
        parent_settings: merge_settings(
            local.parent_settings.as_ref(),
            remote.parent_settings.as_ref(),
        ),
        linked_family_code: local
            .linked_family_code
            .clone()
            .or_else(|| remote.linked_family_code.clone()),
        deleted_ids: tombstones.prune(&excluded),
    }
}

/// Build the merged collection for one entity kind.
///
/// The non-authoritative side is inserted first, then overwritten by
/// the authoritative side's entries; first-seen order is preserved.
/// Tombstoned ids are filtered out afterwards and reported so pruning
/// knows which tombstones are still doing work.
fn merge_collection<T: Entity + Clone>(
    local: &[T],
    remote: &[T],
    authority: Authority,
    tombstones: &[EntityId],
) -> (Vec<T>, HashSet<EntityId>) {
    let (first, second): (&[T], &[T]) = match authority {
        Authority::Remote => (local, remote),
        Authority::Local => (remote, local),
    };

    let mut order: Vec<EntityId> = Vec::with_capacity(first.len() + second.len());
    let mut by_id: HashMap<EntityId, T> = HashMap::with_capacity(first.len() + second.len());
    for item in first.iter().chain(second.iter()) {
        let id = item.entity_id().to_string();
        if by_id.insert(id.clone(), item.clone()).is_none() {
            order.push(id);
        }
    }

    let dead: HashSet<&str> = tombstones.iter().map(String::as_str).collect();
    let mut merged = Vec::with_capacity(order.len());
    let mut excluded = HashSet::new();
    for id in order {
        let item = by_id.remove(&id).expect("id recorded in order");
        if dead.contains(id.as_str()) {
            excluded.insert(id);
        } else {
            merged.push(item);
        }
    }
    (merged, excluded)
}

/// Remote fields overwrite local fields, except the pin hash: the
/// credential is never pushed, so it is sourced from whichever side
/// has it, local preferred.
fn merge_settings(
    local: Option<&ParentSettings>,
    remote: Option<&ParentSettings>,
) -> Option<ParentSettings> {
    match (local, remote) {
        (Some(local), Some(remote)) => {
            let mut merged = remote.clone();
            merged.pin_hash = local.pin_hash.clone().or_else(|| remote.pin_hash.clone());
            Some(merged)
        }
        (Some(local), None) => Some(local.clone()),
        (None, Some(remote)) => Some(remote.clone()),
        (None, None) => None,
    }
}
