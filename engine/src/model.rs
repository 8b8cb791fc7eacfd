//! Entity types for the family ledger.
//!
//! Three entity kinds live in the state: transactions (money in/out),
//! savings goals, and jobs (chores with a reward). Entities carry a
//! globally unique string id that is never reused after deletion.

use crate::{EntityId, Timestamp};
use serde::{Deserialize, Serialize};

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

/// A single money movement in the child's wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Unique identifier, immutable once created
    pub id: EntityId,
    /// Income or expense
    pub kind: TransactionKind,
    /// Amount, always positive; the kind carries the sign
    pub amount: f64,
    /// Category label (free-form)
    pub category: String,
    /// Short description shown in the history
    pub label: String,
    /// When the transaction happened
    pub date: Timestamp,
    /// Optional free-form note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A savings goal the child is working towards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: EntityId,
    pub name: String,
    pub target_amount: f64,
    /// Amount saved so far; the only field that matters for convergence
    pub current_amount: f64,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Goal {
    /// Progress towards the target, clamped to 0..=100.
    pub fn progress_percent(&self) -> f64 {
        if self.target_amount == 0.0 {
            return 0.0;
        }
        (self.current_amount / self.target_amount * 100.0).min(100.0)
    }

    pub fn is_reached(&self) -> bool {
        self.current_amount >= self.target_amount
    }
}

/// Lifecycle status of a job.
///
/// `available -> in_progress -> pending_validation -> completed`,
/// with `pending_validation` skipped when the job does not require
/// validation and `completed` replaced by a reset to `available` for
/// recurring jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Available,
    InProgress,
    PendingValidation,
    Completed,
}

impl JobStatus {
    /// Stable string form used in fingerprints.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Available => "available",
            JobStatus::InProgress => "in_progress",
            JobStatus::PendingValidation => "pending_validation",
            JobStatus::Completed => "completed",
        }
    }
}

/// How often a job can be done. Anything but `Once` makes the job
/// recurring: it never settles in `completed` and resets to
/// `available` after each validated occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobFrequency {
    Once,
    Daily,
    Weekly,
}

impl Default for JobFrequency {
    fn default() -> Self {
        JobFrequency::Once
    }
}

/// A chore offered by the parent for a reward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: EntityId,
    pub title: String,
    pub description: String,
    /// Reward paid out as an income transaction on completion
    pub reward: f64,
    pub status: JobStatus,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Id of the income transaction generated on completion, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<EntityId>,
    #[serde(default)]
    pub frequency: JobFrequency,
    /// When false, `in_progress` jobs complete directly without the
    /// parent validation step
    #[serde(default)]
    pub requires_validation: bool,
}

impl Job {
    pub fn is_recurring(&self) -> bool {
        self.frequency != JobFrequency::Once
    }
}

/// Allowance payment cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllowanceFrequency {
    Weekly,
    Monthly,
}

/// Recurring allowance configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allowance {
    pub amount: f64,
    pub frequency: AllowanceFrequency,
    pub is_active: bool,
    /// Date of the last payment that was actually applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_paid_date: Option<Timestamp>,
    /// Schedule anchor; occurrences are computed from this date to
    /// avoid drift
    pub created_at: Timestamp,
}

/// Parent-side configuration.
///
/// `pin_hash` is locally authoritative: it is stripped before any
/// push and survives merges even when the remote copy lacks it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spending_warning_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowance: Option<Allowance>,
    /// Family code generated on this (parent) device
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_code: Option<String>,
}

/// Anything addressable by a stable id in the merge.
pub trait Entity {
    fn entity_id(&self) -> &str;
}

impl Entity for Transaction {
    fn entity_id(&self) -> &str {
        &self.id
    }
}

impl Entity for Goal {
    fn entity_id(&self) -> &str {
        &self.id
    }
}

impl Entity for Job {
    fn entity_id(&self) -> &str {
        &self.id
    }
}

/// The full application state.
///
/// Exclusively owned by the reducer; everything else sees clones.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_settings: Option<ParentSettings>,
    /// Family code this (child) device linked to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_family_code: Option<String>,
    #[serde(default)]
    pub deleted_ids: crate::DeletedIds,
}

impl AppState {
    /// The family code binding this device to a remote record, from
    /// either side of the parent/child split.
    pub fn family_code(&self) -> Option<&str> {
        self.parent_settings
            .as_ref()
            .and_then(|s| s.family_code.as_deref())
            .or(self.linked_family_code.as_deref())
    }

    /// Current wallet balance: income minus expense.
    pub fn balance(&self) -> f64 {
        self.transactions.iter().fold(0.0, |acc, tx| match tx.kind {
            TransactionKind::Income => acc + tx.amount,
            TransactionKind::Expense => acc - tx.amount,
        })
    }

    /// Copy of this state safe to push to the remote store: the pin
    /// hash never leaves the device.
    pub fn sanitized_for_remote(&self) -> AppState {
        let mut out = self.clone();
        if let Some(settings) = out.parent_settings.as_mut() {
            settings.pin_hash = None;
        }
        out
    }
}
