//! Change fingerprinting for no-op detection.
//!
//! A fingerprint is a deterministic, order-independent digest of the
//! convergence-relevant projection of the state. Two states with equal
//! fingerprints are synchronization-equivalent even when incidental
//! fields (labels, notes, icons) differ. The orchestrator compares
//! fingerprints to skip redundant persistence and, crucially, to
//! recognize the echo of its own push coming back from the cloud.

use crate::model::AppState;
use sha2::{Digest, Sha256};

/// Compute the fingerprint of a state.
///
/// The projection is one line per fact, sorted before hashing so that
/// collection ordering never changes the result.
pub fn fingerprint(state: &AppState) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(
        state.transactions.len() + state.goals.len() + state.jobs.len() + state.deleted_ids.len(),
    );

    for tx in &state.transactions {
        lines.push(format!("t:{}:{}", tx.id, canonical_amount(tx.amount)));
    }
    for goal in &state.goals {
        lines.push(format!(
            "g:{}:{}",
            goal.id,
            canonical_amount(goal.current_amount)
        ));
    }
    for job in &state.jobs {
        lines.push(format!("j:{}:{}", job.id, job.status.as_str()));
    }

    for id in &state.deleted_ids.transactions {
        lines.push(format!("dt:{id}"));
    }
    for id in &state.deleted_ids.goals {
        lines.push(format!("dg:{id}"));
    }
    for id in &state.deleted_ids.jobs {
        lines.push(format!("dj:{id}"));
    }

    if let Some(settings) = &state.parent_settings {
        // The pin hash is deliberately absent: it never syncs, so a
        // pin change must not trigger a push.
        lines.push(format!(
            "s:{}:{}:{}:{}",
            settings.child_name.as_deref().unwrap_or(""),
            settings
                .spending_warning_threshold
                .map(canonical_amount)
                .unwrap_or_default(),
            settings
                .allowance
                .as_ref()
                .map(|a| {
                    format!(
                        "{}@{:?}@{}",
                        canonical_amount(a.amount),
                        a.frequency,
                        a.is_active
                    )
                })
                .unwrap_or_default(),
            settings.family_code.as_deref().unwrap_or(""),
        ));
    }
    if let Some(code) = &state.linked_family_code {
        lines.push(format!("l:{code}"));
    }

    lines.sort_unstable();

    let mut hasher = Sha256::new();
    for line in &lines {
        hasher.update(line.as_bytes());
        hasher.update(b"\n");
    }
    hex(&hasher.finalize())
}

// Fixed-precision rendering so 5.0 and 5 fingerprint identically.
fn canonical_amount(amount: f64) -> String {
    format!("{amount:.2}")
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Goal, JobStatus, Transaction, TransactionKind};
    use chrono::{TimeZone, Utc};

    fn tx(id: &str, amount: f64) -> Transaction {
        Transaction {
            id: id.into(),
            kind: TransactionKind::Income,
            amount,
            category: "test".into(),
            label: "test".into(),
            date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            notes: None,
        }
    }

    #[test]
    fn order_independent() {
        let a = AppState {
            transactions: vec![tx("t1", 1.0), tx("t2", 2.0)],
            ..Default::default()
        };
        let b = AppState {
            transactions: vec![tx("t2", 2.0), tx("t1", 1.0)],
            ..Default::default()
        };
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn incidental_fields_do_not_change_fingerprint() {
        let a = AppState {
            transactions: vec![tx("t1", 1.0)],
            ..Default::default()
        };
        let mut b = a.clone();
        b.transactions[0].label = "renamed".into();
        b.transactions[0].notes = Some("extra".into());
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn amount_changes_are_significant() {
        let a = AppState {
            transactions: vec![tx("t1", 1.0)],
            ..Default::default()
        };
        let mut b = a.clone();
        b.transactions[0].amount = 1.5;
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn job_status_is_significant() {
        let mut job = crate::model::Job {
            id: "j1".into(),
            title: "t".into(),
            description: String::new(),
            reward: 1.0,
            status: JobStatus::Available,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            accepted_at: None,
            completed_at: None,
            icon: None,
            transaction_id: None,
            frequency: Default::default(),
            requires_validation: false,
        };
        let a = AppState {
            jobs: vec![job.clone()],
            ..Default::default()
        };
        job.status = JobStatus::InProgress;
        let b = AppState {
            jobs: vec![job],
            ..Default::default()
        };
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn tombstones_are_significant() {
        let a = AppState::default();
        let mut b = AppState::default();
        b.deleted_ids.transactions.push("t1".into());
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn pin_hash_is_not_significant() {
        let mut a = AppState::default();
        a.parent_settings = Some(crate::model::ParentSettings {
            pin_hash: Some("hash-a".into()),
            child_name: Some("Léa".into()),
            spending_warning_threshold: None,
            allowance: None,
            family_code: None,
        });
        let mut b = a.clone();
        b.parent_settings.as_mut().unwrap().pin_hash = Some("hash-b".into());
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn goal_current_amount_is_significant() {
        let goal = Goal {
            id: "g1".into(),
            name: "vélo".into(),
            target_amount: 50.0,
            current_amount: 10.0,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            image_url: None,
        };
        let a = AppState {
            goals: vec![goal.clone()],
            ..Default::default()
        };
        let mut changed = goal;
        changed.current_amount = 12.0;
        let b = AppState {
            goals: vec![changed],
            ..Default::default()
        };
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }
}
