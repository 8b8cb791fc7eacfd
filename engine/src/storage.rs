//! Serialization of state for durable storage and file exchange.
//!
//! The durable form is a single JSON blob shaped like [`AppState`],
//! stored under a fixed key. Loading is forward-compatible: missing
//! collections default to empty, missing tombstones to an empty
//! structure, so blobs written by older versions keep working.

use crate::model::AppState;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Fixed key for the local durable blob.
pub const STORAGE_KEY: &str = "tirelire-data";

/// Version of the storage format, written alongside the state.
pub const STORAGE_FORMAT_VERSION: u32 = 2;

/// On-disk representation: the state plus a format marker.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredBlob {
    /// Absent in blobs written before versioning was introduced
    #[serde(default)]
    format_version: Option<u32>,
    #[serde(flatten)]
    state: AppState,
}

/// Parse a stored blob into a fully populated canonical state.
///
/// This is the single migration point: every field of [`AppState`]
/// defaults when absent, so any older shape loads cleanly.
pub fn load_state(json: &str) -> Result<AppState> {
    let blob: StoredBlob =
        serde_json::from_str(json).map_err(|e| Error::InvalidStoredState(e.to_string()))?;
    if let Some(version) = blob.format_version {
        if version > STORAGE_FORMAT_VERSION {
            return Err(Error::InvalidStoredState(format!(
                "unsupported storage format version: {version} (max supported: {STORAGE_FORMAT_VERSION})"
            )));
        }
    }
    Ok(blob.state)
}

/// Serialize a state for durable storage.
pub fn save_state(state: &AppState) -> Result<String> {
    let blob = StoredBlob {
        format_version: Some(STORAGE_FORMAT_VERSION),
        state: state.clone(),
    };
    serde_json::to_string(&blob).map_err(|e| Error::Serialization(e.to_string()))
}

/// Serialize a state as a pretty-printed export document.
pub fn export_json(state: &AppState) -> Result<String> {
    serde_json::to_string_pretty(state).map_err(|e| Error::Serialization(e.to_string()))
}

/// How an imported document is combined with the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Wholesale replacement, keeping locally-known parent settings
    /// and the union of both tombstone logs.
    Replace,
    /// Additive merge by concatenation. Deliberately not the id-aware
    /// merge engine: duplicated ids are the caller's problem here.
    Merge,
}

/// Validate and parse an import document.
///
/// All-or-nothing: the document is rejected before any state mutation
/// when the minimum structure (`transactions` and `goals` arrays) is
/// missing.
pub fn parse_import(json: &str) -> Result<AppState> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| Error::InvalidImport(e.to_string()))?;

    for field in ["transactions", "goals"] {
        match value.get(field) {
            Some(v) if v.is_array() => {}
            _ => {
                return Err(Error::InvalidImport(format!(
                    "missing or invalid `{field}` array"
                )))
            }
        }
    }

    serde_json::from_value(value).map_err(|e| Error::InvalidImport(e.to_string()))
}

/// Combine an already validated import with the current state.
pub fn apply_import(current: &AppState, imported: AppState, mode: ImportMode) -> AppState {
    match mode {
        ImportMode::Replace => {
            let mut next = imported;
            if current.parent_settings.is_some() {
                next.parent_settings = current.parent_settings.clone();
            }
            next.deleted_ids = current.deleted_ids.union(&next.deleted_ids);
            next
        }
        ImportMode::Merge => {
            let mut next = current.clone();
            next.transactions.extend(imported.transactions);
            next.goals.extend(imported.goals);
            next.jobs.extend(imported.jobs);
            next.deleted_ids = next.deleted_ids.union(&imported.deleted_ids);
            next
        }
    }
}
