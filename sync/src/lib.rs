//! # Tirelire Sync
//!
//! IO layer around `tirelire-engine`: owns the shared state store,
//! persists it locally, and keeps it reconciled with the family's
//! cloud record.
//!
//! The embedding application provides a [`CloudTransport`] for its
//! backend (or runs [`SyncBackend::Unconfigured`] for a purely local
//! install), then drives everything through [`SyncService`]:
//!
//! - dispatch actions on the [`StateStore`] and render its watch
//!   channel
//! - observe [`SyncService::status`] for the connectivity indicator
//! - call [`SyncService::pull_now`] on app focus,
//!   [`SyncService::create_link`] / [`SyncService::join`] for the
//!   pairing flows, and [`SyncService::shutdown`] on exit

pub mod debounce;
pub mod error;
pub mod link;
pub mod orchestrator;
pub mod persist;
pub mod status;
pub mod store;
pub mod transport;

pub use error::{Result, SyncError};
pub use orchestrator::{SyncConfig, SyncService};
pub use persist::{FileStore, LocalStore, MemoryStore};
pub use status::SyncStatus;
pub use store::StateStore;
pub use transport::{CloudTransport, MemoryTransport, SyncBackend};
