//! Core trait for the serial link abstraction.
//!
//! Defines the `SerialLink` trait that allows the real serial port and the
//! mock implementation to be used interchangeably by the session core.

use super::error::TransportError;
use std::time::Duration;

/// Trait for raw byte I/O against the radio module's serial line.
///
/// Implementations block for at most their configured timeout on reads and
/// signal "no data this tick" by returning `Ok(0)` rather than an error.
pub trait SerialLink: Send + std::fmt::Debug {
    /// Write all bytes to the link.
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Read available bytes into the provided buffer.
    ///
    /// Returns the number of bytes read; `Ok(0)` means nothing arrived
    /// within the link's configured timeout.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, TransportError>;

    /// Get the name/path of this link.
    fn name(&self) -> &str;

    /// Set the per-read timeout for this link.
    fn set_timeout(&mut self, timeout: Duration) -> Result<(), TransportError>;
}
