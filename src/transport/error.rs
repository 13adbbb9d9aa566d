//! Transport-specific error types.
//!
//! Defines error types for the serial link, separate from application-level
//! errors to maintain clean separation of concerns.

use thiserror::Error;

/// Errors that can occur on the serial link to the radio module.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The configured serial port could not be opened.
    #[error("Serial port unavailable: {0}")]
    PortUnavailable(String),

    /// An I/O error occurred on the link.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport has been closed (or was never opened).
    #[error("Transport is closed")]
    Closed,

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl TransportError {
    /// Create a `PortUnavailable` error from a port name.
    pub fn unavailable(port_name: impl Into<String>) -> Self {
        Self::PortUnavailable(port_name.into())
    }
}
