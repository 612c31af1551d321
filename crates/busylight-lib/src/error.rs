//! Unified error type for the busylight-lib crate.
//!
//! [`BusylightError`] wraps the device error type and the domain-specific
//! error kinds (`Config`, `Color`, `Duration`). `From` impls allow `?` to
//! propagate across module boundaries.

use std::fmt;

use crate::device::DeviceError;

/// Unified error type for busylight-lib operations.
#[derive(Debug)]
pub enum BusylightError {
    /// Device communication error (enumeration, open, report write).
    Device(DeviceError),
    /// Standard I/O error (config persistence).
    Io(std::io::Error),
    /// Configuration validation error.
    Config(String),
    /// Color parsing error.
    Color(String),
    /// Duration parsing error.
    Duration(String),
}

impl BusylightError {
    /// Whether this error means no indicator device could be reached.
    ///
    /// This is the one condition the binaries treat as fatal.
    pub fn is_no_device(&self) -> bool {
        matches!(self, BusylightError::Device(e) if e.is_no_device())
    }
}

impl fmt::Display for BusylightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusylightError::Device(e) => write!(f, "{e}"),
            BusylightError::Io(e) => write!(f, "I/O error: {e}"),
            BusylightError::Config(e) => write!(f, "Config error: {e}"),
            BusylightError::Color(e) => write!(f, "Color error: {e}"),
            BusylightError::Duration(e) => write!(f, "Duration error: {e}"),
        }
    }
}

impl std::error::Error for BusylightError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BusylightError::Device(e) => Some(e),
            BusylightError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DeviceError> for BusylightError {
    fn from(e: DeviceError) -> Self {
        BusylightError::Device(e)
    }
}

impl From<std::io::Error> for BusylightError {
    fn from(e: std::io::Error) -> Self {
        BusylightError::Io(e)
    }
}

/// Crate-level Result alias using [`BusylightError`].
pub type Result<T> = std::result::Result<T, BusylightError>;
