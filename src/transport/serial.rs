//! Real serial port implementation of [`SerialLink`].
//!
//! Wraps the `serialport` crate behind the link trait so the session core
//! never touches the hardware API directly.

use super::error::TransportError;
use super::traits::SerialLink;
use std::io::{Read, Write};
use std::time::Duration;

/// Per-read timeout configured on the underlying port. `read_bytes` blocks
/// at most this long before reporting an empty tick.
pub const LINK_READ_TIMEOUT: Duration = Duration::from_millis(200);

/// Serial link backed by a real port from the `serialport` crate.
pub struct SerialPortLink {
    port: Box<dyn serialport::SerialPort>,
    name: String,
}

impl SerialPortLink {
    /// Open a serial port at the given baud rate, 8N1, no flow control.
    ///
    /// The RYLR modules speak 8N1 exclusively; only the baud rate varies
    /// between hardware variants.
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self, TransportError> {
        let port = serialport::new(port_name, baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .flow_control(serialport::FlowControl::None)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .timeout(LINK_READ_TIMEOUT)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => TransportError::unavailable(port_name),
                serialport::ErrorKind::Io(std::io::ErrorKind::NotFound) => {
                    TransportError::unavailable(port_name)
                }
                _ => TransportError::Serial(e),
            })?;

        Ok(Self {
            port,
            name: port_name.to_string(),
        })
    }
}

impl SerialLink for SerialPortLink {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.port.write_all(data).map_err(TransportError::Io)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, TransportError> {
        match self.port.read(buffer) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(TransportError::Io(e)),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), TransportError> {
        self.port.set_timeout(timeout).map_err(TransportError::Serial)
    }
}

impl std::fmt::Debug for SerialPortLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPortLink")
            .field("name", &self.name)
            .field("baud_rate", &self.port.baud_rate().ok())
            .finish()
    }
}
