//! Shared state container.
//!
//! [`StateStore`] owns the single [`AppState`] for the process. All
//! mutation goes through [`StateStore::dispatch`], which runs the
//! engine reducer and publishes the new state on a watch channel the
//! orchestrator and the UI both observe.

use chrono::Utc;
use std::sync::{Arc, Mutex};
use tirelire_engine::model::AppState;
use tirelire_engine::{allowance, reduce, Action, ParentSettingsPatch, Timestamp};
use tokio::sync::watch;

pub struct StateStore {
    state: Mutex<AppState>,
    watch_tx: watch::Sender<AppState>,
}

impl StateStore {
    pub fn new(initial: AppState) -> Arc<Self> {
        let (watch_tx, _) = watch::channel(initial.clone());
        Arc::new(Self {
            state: Mutex::new(initial),
            watch_tx,
        })
    }

    /// Run an action through the reducer and publish the result.
    /// Returns the new state.
    pub fn dispatch(&self, action: Action) -> AppState {
        let mut guard = self.state.lock().expect("state lock");
        let next = reduce(guard.clone(), action);
        *guard = next.clone();
        drop(guard);
        // Receivers may all be gone during shutdown
        let _ = self.watch_tx.send(next.clone());
        next
    }

    pub fn snapshot(&self) -> AppState {
        self.state.lock().expect("state lock").clone()
    }

    /// Observe every state published by [`dispatch`](Self::dispatch).
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.watch_tx.subscribe()
    }

    /// Pay out allowance occurrences that came due while the app was
    /// closed. Returns the number of payments recorded.
    pub fn process_due_allowances(&self, now: Timestamp) -> usize {
        let snapshot = self.snapshot();
        let Some(allowance) = snapshot
            .parent_settings
            .as_ref()
            .and_then(|s| s.allowance.clone())
        else {
            return 0;
        };

        let dues = allowance::due_allowances(&allowance, now);
        if dues.is_empty() {
            return 0;
        }

        let last_date = dues.last().map(|d| d.date);
        for due in &dues {
            self.dispatch(Action::AddTransaction(allowance_transaction(
                due.amount, due.date,
            )));
        }

        let mut paid = allowance;
        paid.last_paid_date = last_date;
        self.dispatch(Action::UpdateParentSettings(ParentSettingsPatch {
            allowance: Some(paid),
            ..Default::default()
        }));

        tracing::info!(payments = dues.len(), "applied due allowance payments");
        dues.len()
    }
}

fn allowance_transaction(
    amount: f64,
    date: Timestamp,
) -> tirelire_engine::model::Transaction {
    tirelire_engine::model::Transaction {
        id: uuid::Uuid::new_v4().to_string(),
        kind: tirelire_engine::model::TransactionKind::Income,
        amount,
        category: "allowance".into(),
        label: "Argent de poche".into(),
        date,
        notes: None,
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore").finish_non_exhaustive()
    }
}

/// Convenience for modules that only need the current wall clock.
pub fn now() -> Timestamp {
    Utc::now()
}
