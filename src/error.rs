//! Crate error type.
//!
//! Every fallible operation on [`Context`](crate::Context) returns
//! [`Result<T>`]. A failed poll means "no new data this frame"; none of these
//! errors is fatal to the context.

use crate::config::ConfigError;
use crate::device::DeviceHandle;
use crate::mapping::MappingParseError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("context is not initialized")]
    NotInitialized,

    #[error("context is already initialized")]
    AlreadyInitialized,

    /// Out-of-range handle or empty slot.
    #[error("invalid device handle {0}")]
    InvalidHandle(u8),

    /// The device is tracked but no catalog entry matched its identifier.
    #[error("device {0} has no mapping")]
    Unmapped(DeviceHandle),

    /// The backend reported the device gone; its slot has been cleared.
    #[error("device {0} disconnected")]
    Disconnected(DeviceHandle),

    /// The device could not be read this frame even after a retry. It stays registered.
    #[error("device {0} is temporarily unavailable")]
    Transient(DeviceHandle),

    #[error("operation not supported: {0}")]
    Unsupported(&'static str),

    #[error("backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Mapping(#[from] MappingParseError),
}
