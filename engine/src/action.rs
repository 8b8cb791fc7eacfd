//! Actions and the state reducer.
//!
//! Every local mutation goes through [`reduce`]: a total, pure,
//! synchronous transition function. Actions referencing an unknown id
//! are no-ops by construction, never errors. Timestamps travel inside
//! the actions so the reducer itself stays deterministic.

use crate::merge;
use crate::model::{
    Allowance, AppState, Goal, Job, JobStatus, ParentSettings, Transaction,
};
use crate::{EntityId, Timestamp};
use serde::{Deserialize, Serialize};

/// Partial update for [`ParentSettings`]; `Some` fields replace the
/// existing value, `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentSettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spending_warning_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowance: Option<Allowance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_code: Option<String>,
}

/// A state transition request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Action {
    AddTransaction(Transaction),
    UpdateTransaction(Transaction),
    DeleteTransaction(EntityId),

    AddGoal(Goal),
    UpdateGoal(Goal),
    DeleteGoal(EntityId),
    /// Move money from the wallet into a goal: records the expense
    /// transaction and bumps the goal's saved amount.
    AddToGoal {
        goal_id: EntityId,
        amount: f64,
        transaction: Transaction,
    },

    AddJob(Job),
    UpdateJob(Job),
    DeleteJob(EntityId),
    /// available -> in_progress
    AcceptJob { id: EntityId, at: Timestamp },
    /// in_progress -> pending_validation (validation-gated jobs only)
    SubmitJob(EntityId),
    /// pending_validation -> completed (or back to available for
    /// recurring jobs), paying out the reward transaction.
    ValidateJob {
        id: EntityId,
        transaction: Transaction,
        at: Timestamp,
    },
    /// pending_validation -> available, clearing the acceptance stamp
    RejectJob(EntityId),
    /// in_progress -> completed directly, when no validation is
    /// configured for the job.
    CompleteJob {
        id: EntityId,
        transaction: Transaction,
        at: Timestamp,
    },

    /// Install an externally loaded state (startup, import).
    LoadState(AppState),
    /// Reconcile a remote snapshot through the merge engine.
    SyncState(AppState),
    ResetState,
    /// Wipe child data, keep parent settings, tombstone everything.
    ResetChildData,

    SetParentSettings(ParentSettings),
    UpdateParentSettings(ParentSettingsPatch),
    SetFamilyCode(String),
}

/// Apply an action to a state, returning the next state.
pub fn reduce(state: AppState, action: Action) -> AppState {
    match action {
        Action::AddTransaction(tx) => {
            let mut next = state;
            next.transactions.insert(0, tx);
            next
        }

        Action::UpdateTransaction(tx) => {
            let mut next = state;
            if let Some(existing) = next.transactions.iter_mut().find(|t| t.id == tx.id) {
                *existing = tx;
            }
            next
        }

        Action::DeleteTransaction(id) => {
            let mut next = state;
            next.transactions.retain(|t| t.id != id);
            next.deleted_ids.transactions.push(id);
            next
        }

        Action::AddGoal(goal) => {
            let mut next = state;
            next.goals.push(goal);
            next
        }

        Action::UpdateGoal(goal) => {
            let mut next = state;
            if let Some(existing) = next.goals.iter_mut().find(|g| g.id == goal.id) {
                *existing = goal;
            }
            next
        }

        Action::DeleteGoal(id) => {
            let mut next = state;
            next.goals.retain(|g| g.id != id);
            next.deleted_ids.goals.push(id);
            next
        }

        Action::AddToGoal {
            goal_id,
            amount,
            transaction,
        } => {
            let mut next = state;
            next.transactions.insert(0, transaction);
            if let Some(goal) = next.goals.iter_mut().find(|g| g.id == goal_id) {
                goal.current_amount += amount;
            }
            next
        }

        Action::AddJob(job) => {
            let mut next = state;
            next.jobs.insert(0, job);
            next
        }

        Action::UpdateJob(job) => {
            let mut next = state;
            if let Some(existing) = next.jobs.iter_mut().find(|j| j.id == job.id) {
                *existing = job;
            }
            next
        }

        Action::DeleteJob(id) => {
            let mut next = state;
            // Composite delete: a job that already paid out drags its
            // income transaction down with it, tombstoning both ids.
            let linked_tx = next
                .jobs
                .iter()
                .find(|j| j.id == id)
                .and_then(|j| j.transaction_id.clone());
            next.jobs.retain(|j| j.id != id);
            next.deleted_ids.jobs.push(id);
            if let Some(tx_id) = linked_tx {
                next.transactions.retain(|t| t.id != tx_id);
                next.deleted_ids.transactions.push(tx_id);
            }
            next
        }

        Action::AcceptJob { id, at } => {
            let mut next = state;
            if let Some(job) = find_job(&mut next, &id, JobStatus::Available) {
                job.status = JobStatus::InProgress;
                job.accepted_at = Some(at);
            }
            next
        }

        Action::SubmitJob(id) => {
            let mut next = state;
            if let Some(job) = find_job(&mut next, &id, JobStatus::InProgress) {
                if job.requires_validation {
                    job.status = JobStatus::PendingValidation;
                }
            }
            next
        }

        Action::ValidateJob { id, transaction, at } => {
            let mut next = state;
            if let Some(job) = find_job(&mut next, &id, JobStatus::PendingValidation) {
                settle_job(job, &transaction, at);
                next.transactions.insert(0, transaction);
            }
            next
        }

        Action::RejectJob(id) => {
            let mut next = state;
            if let Some(job) = find_job(&mut next, &id, JobStatus::PendingValidation) {
                job.status = JobStatus::Available;
                job.accepted_at = None;
            }
            next
        }

        Action::CompleteJob { id, transaction, at } => {
            let mut next = state;
            if let Some(job) = find_job(&mut next, &id, JobStatus::InProgress) {
                if !job.requires_validation {
                    settle_job(job, &transaction, at);
                    next.transactions.insert(0, transaction);
                }
            }
            next
        }

        Action::LoadState(payload) => {
            let mut next = payload;
            // The loaded blob may predate parent settings or
            // tombstones; never drop what this device already knows.
            if next.parent_settings.is_none() {
                next.parent_settings = state.parent_settings;
            }
            if next.deleted_ids.is_empty() {
                next.deleted_ids = state.deleted_ids;
            }
            next
        }

        Action::SyncState(remote) => merge::merge(&state, &remote),

        Action::ResetState => AppState::default(),

        Action::ResetChildData => {
            let mut deleted_ids = state.deleted_ids;
            deleted_ids
                .transactions
                .extend(state.transactions.iter().map(|t| t.id.clone()));
            deleted_ids
                .goals
                .extend(state.goals.iter().map(|g| g.id.clone()));
            deleted_ids
                .jobs
                .extend(state.jobs.iter().map(|j| j.id.clone()));
            AppState {
                parent_settings: state.parent_settings,
                deleted_ids,
                ..Default::default()
            }
        }

        Action::SetParentSettings(settings) => {
            let mut next = state;
            next.parent_settings = Some(settings);
            next
        }

        Action::UpdateParentSettings(patch) => {
            let mut next = state;
            if let Some(settings) = next.parent_settings.as_mut() {
                if let Some(pin_hash) = patch.pin_hash {
                    settings.pin_hash = Some(pin_hash);
                }
                if let Some(child_name) = patch.child_name {
                    settings.child_name = Some(child_name);
                }
                if let Some(threshold) = patch.spending_warning_threshold {
                    settings.spending_warning_threshold = Some(threshold);
                }
                if let Some(allowance) = patch.allowance {
                    settings.allowance = Some(allowance);
                }
                if let Some(family_code) = patch.family_code {
                    settings.family_code = Some(family_code);
                }
            }
            next
        }

        Action::SetFamilyCode(code) => {
            let mut next = state;
            next.linked_family_code = Some(code);
            next
        }
    }
}

fn find_job<'a>(state: &'a mut AppState, id: &str, expected: JobStatus) -> Option<&'a mut Job> {
    state
        .jobs
        .iter_mut()
        .find(|j| j.id == id && j.status == expected)
}

/// Terminal bookkeeping shared by validate and direct completion.
/// Recurring jobs go back on the board instead of settling.
fn settle_job(job: &mut Job, transaction: &Transaction, at: Timestamp) {
    if job.is_recurring() {
        job.status = JobStatus::Available;
        job.accepted_at = None;
        job.completed_at = None;
        job.transaction_id = None;
    } else {
        job.status = JobStatus::Completed;
        job.completed_at = Some(at);
        job.transaction_id = Some(transaction.id.clone());
    }
}
