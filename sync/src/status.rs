//! Connectivity status surfaced to the UI.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the device stands relative to the cloud record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// No family code configured; the device is purely local.
    NotLinked,
    /// Last push confirmed, nothing waiting.
    Synced,
    /// Local changes exist that have not been confirmed remotely.
    Pending,
    /// The last exchange with the backend failed.
    Offline,
}

impl SyncStatus {
    /// Fold the orchestrator's bookkeeping into a displayable status.
    ///
    /// Offline wins over pending: a queued change the backend cannot
    /// be reached for is an offline condition, not a pending one.
    pub fn derive(linked: bool, online: bool, pending: bool) -> Self {
        if !linked {
            SyncStatus::NotLinked
        } else if !online {
            SyncStatus::Offline
        } else if pending {
            SyncStatus::Pending
        } else {
            SyncStatus::Synced
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncStatus::NotLinked => "not_linked",
            SyncStatus::Synced => "synced",
            SyncStatus::Pending => "pending",
            SyncStatus::Offline => "offline",
        };
        write!(f, "{s}")
    }
}
