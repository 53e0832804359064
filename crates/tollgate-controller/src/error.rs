//! Controller error type.

use tollgate_hardware::HardwareError;

/// Result alias for controller operations.
pub type Result<T> = std::result::Result<T, ControllerError>;

/// Errors surfaced by one iteration of the control loop.
///
/// None of them is fatal: the run loop logs them and keeps iterating.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Core(#[from] tollgate_core::Error),

    #[error(transparent)]
    Hardware(#[from] HardwareError),
}
