//! Unified error handling for the sync layer.

/// Sync layer error type.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("engine error: {0}")]
    Engine(#[from] tirelire_engine::Error),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("local storage error: {0}")]
    LocalStore(#[from] std::io::Error),

    #[error("no family code configured")]
    NotLinked,

    #[error("no cloud backend configured")]
    NoBackend,

    #[error("unknown family code: {0}")]
    UnknownFamilyCode(String),

    #[error("could not find a free family code after {0} attempts")]
    CodeGeneration(u32),
}

/// Result type alias for the sync layer.
pub type Result<T> = std::result::Result<T, SyncError>;
