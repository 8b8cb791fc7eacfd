//! # Tirelire Engine
//!
//! Deterministic core of the Tirelire family-finance tracker: the
//! state model, the reducer, and the merge logic that reconciles two
//! devices editing the same family's data concurrently.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine has no knowledge of files, network, or
//!   timers; the `tirelire-sync` crate owns all of that
//! - **Deterministic**: same inputs always produce the same outputs;
//!   timestamps and generated ids travel inside actions
//! - **Total**: the reducer never fails; actions on unknown ids or
//!   wrong job states are no-ops, not errors
//!
//! ## Core Concepts
//!
//! ### State and actions
//!
//! [`AppState`] holds the three entity collections (transactions,
//! goals, jobs), optional parent settings, the link code and the
//! tombstone log. All mutation goes through [`reduce`] with an
//! [`Action`].
//!
//! ### Tombstones
//!
//! Deleting an entity records its id in [`DeletedIds`]. During a merge
//! the tombstone logs of both sides are unioned *first*, so a deletion
//! on either device wins over a live copy on the other. The log is
//! pruned with a recency bias once ids stop excluding anything.
//!
//! ### Merge authority
//!
//! [`merge`] reconciles a remote snapshot pairwise: jobs are
//! remote-authoritative (the parent device owns the job board),
//! transactions and goals are local-authoritative (the child device
//! owns its spending). The parent PIN hash never syncs and always
//! survives locally.
//!
//! ### Fingerprints
//!
//! [`fingerprint`] digests the convergence-relevant projection of a
//! state, order-independently. The sync layer uses fingerprint
//! equality to skip redundant persistence and to recognize the echo of
//! its own push, which is what keeps the push/pull cycle from looping
//! forever.

pub mod action;
pub mod allowance;
pub mod error;
pub mod fingerprint;
pub mod link_code;
pub mod merge;
pub mod model;
pub mod pin;
pub mod storage;
pub mod tombstone;

// Re-export main types at crate root
pub use action::{reduce, Action, ParentSettingsPatch};
pub use error::{Error, Result};
pub use fingerprint::fingerprint;
pub use merge::merge;
pub use model::{
    Allowance, AllowanceFrequency, AppState, Entity, Goal, Job, JobFrequency, JobStatus,
    ParentSettings, Transaction, TransactionKind,
};
pub use storage::{ImportMode, STORAGE_FORMAT_VERSION, STORAGE_KEY};
pub use tombstone::{DeletedIds, ExcludedIds, TOMBSTONE_CAPACITY};

/// Type aliases for clarity
pub type EntityId = String;
pub type FamilyCode = String;
pub type Timestamp = chrono::DateTime<chrono::Utc>;
