use thiserror::Error;

/// Errors surfaced by the engine.
///
/// Domain-rule violations (bad range, wrong owner, missing body part) are
/// never errors: the offending intent is silently dropped. Only collaborator
/// failures — snapshot decode, persistence I/O, bad configuration — reach
/// this type, and they abort the whole tick.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Snapshot decode error: {0}")]
    SnapshotDecode(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
