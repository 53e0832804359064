//! Error types for peripheral operations.
//!
//! Covers the failure modes of the card reader, the feedback surfaces and the
//! host link.

/// Result alias for peripheral operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors raised by peripheral devices.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device was disconnected or its channel closed.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Transport-level failure on a link.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Device returned data that cannot be interpreted.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Device could not be opened or configured.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// A card was present but its UID could not be read.
    #[error("Card read error: {message}")]
    CardReadError { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "hardware-serial")]
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl HardwareError {
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    pub fn card_read(message: impl Into<String>) -> Self {
        Self::CardReadError {
            message: message.into(),
        }
    }

    /// Returns `true` for a failed UID read, which aborts a scan cycle silently.
    pub fn is_card_read(&self) -> bool {
        matches!(self, Self::CardReadError { .. })
    }
}

impl From<tollgate_core::Error> for HardwareError {
    fn from(error: tollgate_core::Error) -> Self {
        Self::invalid_data(error.to_string())
    }
}
