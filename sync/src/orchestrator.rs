//! The sync orchestrator.
//!
//! Watches the state store and drives the three side effects around
//! it: debounced local persistence, debounced cloud pushes, and
//! applying remote snapshots from pulls and live subscriptions.
//!
//! The whole loop is kept stable by fingerprints:
//!
//! - persistence and pushes only happen when the fingerprint moved
//! - the last pushed fingerprint is recorded on confirmed success
//!   only, so a failed push is retried by the next opportunity
//! - an incoming snapshot whose fingerprint equals the last push is
//!   this device's own echo and is dropped before the reducer sees it

use crate::debounce::Debouncer;
use crate::persist::{self, LocalStore};
use crate::store::StateStore;
use crate::transport::SyncBackend;
use crate::{link, Result, SyncError, SyncStatus};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tirelire_engine::model::AppState;
use tirelire_engine::{fingerprint, Action, ParentSettingsPatch};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Timing knobs, mostly interesting to tests.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Quiet period before a state change is pushed.
    pub push_debounce: Duration,
    /// Quiet period before a state change is persisted locally.
    pub persist_debounce: Duration,
    /// Push attempts before giving up until the next change or pull.
    pub max_push_attempts: u32,
    /// First retry delay; doubles per attempt.
    pub backoff_base: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            push_debounce: Duration::from_millis(1000),
            persist_debounce: Duration::from_millis(500),
            max_push_attempts: 5,
            backoff_base: Duration::from_millis(500),
        }
    }
}

/// Mutable bookkeeping shared between the orchestrator's tasks.
#[derive(Default)]
struct Book {
    last_pushed: Option<String>,
    last_persisted: Option<String>,
    subscribed_code: Option<String>,
    offline: bool,
    pending: bool,
}

pub struct SyncService {
    /// Self-reference for handing owned clones to spawned tasks
    weak: Weak<Self>,
    store: Arc<StateStore>,
    backend: SyncBackend,
    local: Arc<dyn LocalStore>,
    config: SyncConfig,
    book: Mutex<Book>,
    status_tx: watch::Sender<SyncStatus>,
    push_debouncer: Debouncer,
    persist_debouncer: Debouncer,
    subscription: Mutex<Option<JoinHandle<()>>>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl SyncService {
    pub fn new(
        store: Arc<StateStore>,
        backend: SyncBackend,
        local: Arc<dyn LocalStore>,
        config: SyncConfig,
    ) -> Arc<Self> {
        let (status_tx, _) = watch::channel(SyncStatus::NotLinked);
        Arc::new_cyclic(|weak| Self {
            weak: weak.clone(),
            store,
            backend,
            local,
            push_debouncer: Debouncer::new(config.push_debounce),
            persist_debouncer: Debouncer::new(config.persist_debounce),
            config,
            book: Mutex::new(Book::default()),
            status_tx,
            subscription: Mutex::new(None),
            watcher: Mutex::new(None),
        })
    }

    fn strong(&self) -> Arc<Self> {
        self.weak.upgrade().expect("service owner alive")
    }

    /// Load the persisted state, catch up on allowances, connect to
    /// the family record if linked, and start watching for changes.
    pub async fn start(&self) -> Result<()> {
        let initial = persist::load_initial_state(self.local.as_ref())?;
        self.store.dispatch(Action::LoadState(initial));

        // Freshly loaded; rewriting it would be a no-op
        {
            let mut book = self.book.lock().expect("book lock");
            book.last_persisted = Some(fingerprint(&self.store.snapshot()));
        }

        let mut rx = self.store.subscribe();
        let this = self.strong();
        let handle = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let state = rx.borrow_and_update().clone();
                this.on_local_change(&state);
            }
        });
        *self.watcher.lock().expect("watcher lock") = Some(handle);

        self.store.process_due_allowances(crate::store::now());

        let snapshot = self.store.snapshot();
        if snapshot.family_code().is_some() && self.backend.is_configured() {
            // Startup pull failures are not fatal: the device keeps
            // working from local state and shows up as offline.
            if let Err(e) = self.pull_now().await {
                tracing::warn!(error = %e, "startup pull failed");
            }
            self.resubscribe();
        }

        self.refresh_status();
        tracing::info!(status = %self.current_status(), "sync service started");
        Ok(())
    }

    /// Latest derived status.
    pub fn current_status(&self) -> SyncStatus {
        *self.status_tx.borrow()
    }

    /// Observe status changes.
    pub fn status(&self) -> watch::Receiver<SyncStatus> {
        self.status_tx.subscribe()
    }

    /// Fetch and merge the remote record now, bypassing debouncing.
    /// Meant for app focus and pull-to-refresh. Returns whether a
    /// remote record existed.
    pub async fn pull_now(&self) -> Result<bool> {
        let snapshot = self.store.snapshot();
        let code = snapshot.family_code().ok_or(SyncError::NotLinked)?.to_string();
        let transport = self.backend.transport().ok_or(SyncError::NoBackend)?;

        match transport.pull(&code).await {
            Ok(Some(remote)) => {
                self.set_offline(false);
                self.apply_remote(remote);
                Ok(true)
            }
            Ok(None) => {
                self.set_offline(false);
                Ok(false)
            }
            Err(e) => {
                tracing::warn!(error = %e, "pull failed");
                self.set_offline(true);
                Err(e)
            }
        }
    }

    /// Mint a family code, store it in the parent settings and claim
    /// it by pushing the current state. Returns the existing code if
    /// this device is already linked.
    pub async fn create_link(&self) -> Result<String> {
        if let Some(code) = self.store.snapshot().family_code() {
            return Ok(code.to_string());
        }
        let transport = self.backend.transport().ok_or(SyncError::NoBackend)?;

        let mut rng = StdRng::from_entropy();
        let code = link::create_family_code(transport, &mut rng).await?;

        let snapshot = self.store.snapshot();
        if snapshot.parent_settings.is_some() {
            self.store
                .dispatch(Action::UpdateParentSettings(ParentSettingsPatch {
                    family_code: Some(code.clone()),
                    ..Default::default()
                }));
        } else {
            self.store.dispatch(Action::SetFamilyCode(code.clone()));
        }

        let claimed = self.store.snapshot();
        transport.push(&code, &claimed.sanitized_for_remote()).await?;
        {
            let mut book = self.book.lock().expect("book lock");
            book.last_pushed = Some(fingerprint(&claimed));
            book.offline = false;
            book.pending = false;
        }
        self.resubscribe();
        self.refresh_status();
        tracing::info!(%code, "family link created");
        Ok(code)
    }

    /// Link this device to an existing family and merge its record in.
    pub async fn join(&self, code: &str) -> Result<()> {
        let transport = self.backend.transport().ok_or(SyncError::NoBackend)?;
        let remote = link::join_family(transport, code).await?;

        self.store.dispatch(Action::SetFamilyCode(code.to_string()));
        self.set_offline(false);
        self.apply_remote(remote);
        self.resubscribe();
        self.refresh_status();
        tracing::info!(%code, "joined family");
        Ok(())
    }

    /// Stop timers and background tasks and flush the state to disk.
    pub async fn shutdown(&self) {
        self.push_debouncer.cancel();
        self.persist_debouncer.cancel();
        if let Some(handle) = self.subscription.lock().expect("subscription lock").take() {
            handle.abort();
        }
        if let Some(handle) = self.watcher.lock().expect("watcher lock").take() {
            handle.abort();
        }
        if let Err(e) = persist::persist_state(self.local.as_ref(), &self.store.snapshot()) {
            tracing::error!(error = %e, "final flush failed");
        }
        tracing::info!("sync service stopped");
    }

    fn on_local_change(&self, state: &AppState) {
        let fp = fingerprint(state);
        let code = state.family_code().map(str::to_string);
        let linked = code.is_some() && self.backend.is_configured();

        let (needs_persist, needs_push, needs_subscribe) = {
            let mut book = self.book.lock().expect("book lock");
            let needs_persist = book.last_persisted.as_deref() != Some(fp.as_str());
            let needs_push = linked && book.last_pushed.as_deref() != Some(fp.as_str());
            let needs_subscribe = linked && book.subscribed_code != code;
            if needs_push {
                book.pending = true;
            }
            (needs_persist, needs_push, needs_subscribe)
        };

        if needs_persist {
            let this = self.strong();
            self.persist_debouncer.call(move || async move {
                this.persist_now();
            });
        }
        if needs_subscribe {
            self.resubscribe();
        }
        if needs_push {
            self.refresh_status();
            let this = self.strong();
            self.push_debouncer.call(move || async move {
                this.push_with_backoff().await;
            });
        }
    }

    fn persist_now(&self) {
        let snapshot = self.store.snapshot();
        let fp = fingerprint(&snapshot);
        {
            let book = self.book.lock().expect("book lock");
            if book.last_persisted.as_deref() == Some(fp.as_str()) {
                return;
            }
        }
        match persist::persist_state(self.local.as_ref(), &snapshot) {
            Ok(()) => {
                self.book.lock().expect("book lock").last_persisted = Some(fp);
                tracing::debug!("state persisted");
            }
            Err(e) => tracing::error!(error = %e, "persist failed"),
        }
    }

    async fn push_with_backoff(self: Arc<Self>) {
        let snapshot = self.store.snapshot();
        let Some(code) = snapshot.family_code().map(str::to_string) else {
            return;
        };
        let Some(transport) = self.backend.transport().cloned() else {
            return;
        };

        let fp = fingerprint(&snapshot);
        {
            // A pull or an echo may have settled this in the meantime
            let mut book = self.book.lock().expect("book lock");
            if book.last_pushed.as_deref() == Some(fp.as_str()) {
                book.pending = false;
                drop(book);
                self.refresh_status();
                return;
            }
        }

        let payload = snapshot.sanitized_for_remote();
        for attempt in 1..=self.config.max_push_attempts {
            match transport.push(&code, &payload).await {
                Ok(()) => {
                    let still_dirty = fingerprint(&self.store.snapshot()) != fp;
                    {
                        let mut book = self.book.lock().expect("book lock");
                        book.last_pushed = Some(fp.clone());
                        book.offline = false;
                        book.pending = still_dirty;
                    }
                    self.refresh_status();
                    tracing::debug!(attempt, "push confirmed");
                    return;
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "push failed");
                    if attempt < self.config.max_push_attempts {
                        sleep(self.config.backoff_base * 2u32.pow(attempt - 1)).await;
                    }
                }
            }
        }

        // Give up until the next local change or explicit pull
        self.set_offline(true);
        tracing::warn!("push abandoned after {} attempts", self.config.max_push_attempts);
    }

    /// Merge an incoming remote snapshot, unless it is the echo of
    /// this device's own last push.
    fn apply_remote(&self, remote: AppState) {
        let fp = fingerprint(&remote);
        {
            let mut book = self.book.lock().expect("book lock");
            if book.last_pushed.as_deref() == Some(fp.as_str()) {
                book.offline = false;
                tracing::trace!("dropped own echo");
                return;
            }
        }

        let merged = self.store.dispatch(Action::SyncState(remote));
        let merged_fp = fingerprint(&merged);
        {
            let mut book = self.book.lock().expect("book lock");
            book.offline = false;
            // Nothing local on top of the remote record: note it as
            // already pushed so the merge does not bounce back.
            if merged_fp == fp {
                book.last_pushed = Some(merged_fp);
                book.pending = false;
            }
        }
        self.refresh_status();
    }

    /// Tear down the current subscription and open one for the
    /// current family code.
    fn resubscribe(&self) {
        let Some(code) = self.store.snapshot().family_code().map(str::to_string) else {
            return;
        };
        let Some(transport) = self.backend.transport().cloned() else {
            return;
        };

        let mut guard = self.subscription.lock().expect("subscription lock");
        if let Some(old) = guard.take() {
            old.abort();
        }
        self.book.lock().expect("book lock").subscribed_code = Some(code.clone());

        let this = self.strong();
        *guard = Some(tokio::spawn(async move {
            match transport.subscribe(&code).await {
                Ok(mut rx) => {
                    tracing::info!(%code, "subscribed to family updates");
                    while let Some(remote) = rx.recv().await {
                        this.apply_remote(remote);
                    }
                    tracing::debug!(%code, "subscription stream ended");
                }
                Err(e) => {
                    tracing::warn!(%code, error = %e, "subscribe failed");
                    this.set_offline(true);
                }
            }
        }));
    }

    fn set_offline(&self, offline: bool) {
        self.book.lock().expect("book lock").offline = offline;
        self.refresh_status();
    }

    fn refresh_status(&self) {
        let linked =
            self.store.snapshot().family_code().is_some() && self.backend.is_configured();
        let status = {
            let book = self.book.lock().expect("book lock");
            SyncStatus::derive(linked, !book.offline, book.pending)
        };
        self.status_tx.send_replace(status);
    }
}
