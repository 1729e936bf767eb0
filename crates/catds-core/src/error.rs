use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An operation that needs a ROM ran with nothing loaded.
    #[error("no ROM loaded")]
    NotLoaded,
    #[error("ROM not found: {path}")]
    RomNotFound { path: PathBuf },
    #[error("invalid ROM image: {reason}")]
    InvalidRom { reason: String },
    /// The engine failed while executing a frame.
    #[error("emulation fault: {0}")]
    Fault(String),
    /// A state blob could not be decoded.
    #[error("invalid state data: {0}")]
    InvalidState(String),
    #[error("state belongs to a different ROM")]
    RomMismatch,
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
