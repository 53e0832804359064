use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // UID errors
    #[error("Invalid UID length: expected {min}-{max} bytes, got {actual}")]
    InvalidUidLength {
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("Invalid UID format: {0}")]
    InvalidUidFormat(String),

    // State machine errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
