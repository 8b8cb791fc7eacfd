//! Cloud transport abstraction.
//!
//! The orchestrator talks to the backend exclusively through
//! [`CloudTransport`], so the sync policy can be tested against an
//! in-process implementation and the real backend can be swapped in by
//! the embedding application.

use crate::{Result, SyncError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tirelire_engine::model::AppState;
use tokio::sync::mpsc;

/// Remote store keyed by family code, one state document per family.
///
/// `push` replaces the document wholesale; there is no server-side
/// merging, reconciliation happens on the devices. `subscribe` streams
/// every subsequent write to the code's document, including the echo
/// of this device's own pushes.
#[async_trait]
pub trait CloudTransport: Send + Sync {
    async fn push(&self, code: &str, state: &AppState) -> Result<()>;

    async fn pull(&self, code: &str) -> Result<Option<AppState>>;

    async fn subscribe(&self, code: &str) -> Result<mpsc::UnboundedReceiver<AppState>>;
}

/// The backend the orchestrator was built with.
///
/// Unconfigured is a first-class mode: the app works fully offline and
/// every sync operation degrades to a no-op.
#[derive(Clone)]
pub enum SyncBackend {
    Configured(Arc<dyn CloudTransport>),
    Unconfigured,
}

impl SyncBackend {
    pub fn transport(&self) -> Option<&Arc<dyn CloudTransport>> {
        match self {
            SyncBackend::Configured(transport) => Some(transport),
            SyncBackend::Unconfigured => None,
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, SyncBackend::Configured(_))
    }
}

impl std::fmt::Debug for SyncBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncBackend::Configured(_) => write!(f, "SyncBackend::Configured"),
            SyncBackend::Unconfigured => write!(f, "SyncBackend::Unconfigured"),
        }
    }
}

/// In-process transport backed by a map, for tests and local
/// development. Writes fan out to every subscriber of the code,
/// the writer included, which matches how real backends echo.
#[derive(Default)]
pub struct MemoryTransport {
    records: Mutex<HashMap<String, AppState>>,
    subscribers: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<AppState>>>>,
    push_count: AtomicUsize,
    fail_pushes: std::sync::atomic::AtomicBool,
}

impl MemoryTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed a remote document directly, bypassing notifications.
    pub fn seed(&self, code: &str, state: AppState) {
        self.records
            .lock()
            .expect("records lock")
            .insert(code.to_string(), state);
    }

    /// The current remote document for a code.
    pub fn record(&self, code: &str) -> Option<AppState> {
        self.records.lock().expect("records lock").get(code).cloned()
    }

    /// Number of pushes accepted so far.
    pub fn push_count(&self) -> usize {
        self.push_count.load(Ordering::SeqCst)
    }

    /// Make subsequent pushes fail, simulating a lost connection.
    pub fn set_fail_pushes(&self, fail: bool) {
        self.fail_pushes.store(fail, Ordering::SeqCst);
    }

    fn notify(&self, code: &str, state: &AppState) {
        if let Some(senders) = self.subscribers.lock().expect("subscribers lock").get_mut(code) {
            senders.retain(|sender| sender.send(state.clone()).is_ok());
        }
    }
}

#[async_trait]
impl CloudTransport for MemoryTransport {
    async fn push(&self, code: &str, state: &AppState) -> Result<()> {
        if self.fail_pushes.load(Ordering::SeqCst) {
            return Err(SyncError::Transport("simulated push failure".into()));
        }
        self.records
            .lock()
            .expect("records lock")
            .insert(code.to_string(), state.clone());
        self.push_count.fetch_add(1, Ordering::SeqCst);
        self.notify(code, state);
        Ok(())
    }

    async fn pull(&self, code: &str) -> Result<Option<AppState>> {
        Ok(self.record(code))
    }

    async fn subscribe(&self, code: &str) -> Result<mpsc::UnboundedReceiver<AppState>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .expect("subscribers lock")
            .entry(code.to_string())
            .or_default()
            .push(tx);
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn push_then_pull_roundtrip() {
        let transport = MemoryTransport::new();
        let state = AppState::default();

        assert!(transport.pull("ABCDEF").await.unwrap().is_none());
        transport.push("ABCDEF", &state).await.unwrap();
        assert_eq!(transport.pull("ABCDEF").await.unwrap(), Some(state));
        assert_eq!(transport.push_count(), 1);
    }

    #[tokio::test]
    async fn subscribers_see_pushes_for_their_code_only() {
        let transport = MemoryTransport::new();
        let mut rx_a = transport.subscribe("AAAAAA").await.unwrap();
        let mut rx_b = transport.subscribe("BBBBBB").await.unwrap();

        transport.push("AAAAAA", &AppState::default()).await.unwrap();

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn failing_pushes_do_not_touch_the_record() {
        let transport = MemoryTransport::new();
        transport.set_fail_pushes(true);
        assert!(transport.push("ABCDEF", &AppState::default()).await.is_err());
        assert!(transport.record("ABCDEF").is_none());
        assert_eq!(transport.push_count(), 0);
    }
}
