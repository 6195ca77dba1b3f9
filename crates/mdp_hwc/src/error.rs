//! Composer error types

use thiserror::Error;

use mdp_overlay::DeviceError;

/// Composer errors
#[derive(Debug, Error)]
pub enum HwcError {
    #[error("Composer is shut down")]
    DeviceClosed,

    #[error("Device error: {0}")]
    Device(#[from] DeviceError),
}

/// Result type for composer operations
pub type HwcResult<T> = Result<T, HwcError>;
