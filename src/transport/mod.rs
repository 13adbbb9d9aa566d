//! Serial transport layer for the radio module.
//!
//! Provides the [`SerialLink`] trait with real and mock implementations,
//! and the [`Transport`] wrapper that owns one link for the session
//! lifetime: line-oriented reads with a bounded deadline, best-effort
//! writes, and an idempotent close.

pub mod error;
pub mod mock;
pub mod serial;
pub mod traits;

pub use error::TransportError;
pub use mock::MockLink;
pub use serial::SerialPortLink;
pub use traits::SerialLink;

use crate::device::DeviceProfile;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Line terminator used by the module in both directions.
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

/// Transport shared between the session's concurrent tasks.
///
/// All reads and writes go through this single mutex so a beacon or relay
/// send can never interleave mid-frame with a user-initiated send.
pub type SharedTransport = Arc<Mutex<Transport>>;

/// Owns the serial link for the lifetime of one session.
///
/// `close` is idempotent; every operation after close reports
/// [`TransportError::Closed`].
#[derive(Debug)]
pub struct Transport {
    link: Option<Box<dyn SerialLink>>,
    /// Bytes received past the last returned line. The module can emit
    /// several lines back to back; a single chunk read must not fuse them.
    carry: Vec<u8>,
}

impl Transport {
    /// Open the real serial port described by the profile.
    ///
    /// The baud rate is derived from the hardware variant and fixed for
    /// the process lifetime.
    pub fn open(profile: &DeviceProfile) -> Result<Self, TransportError> {
        let link = SerialPortLink::open(&profile.port, profile.variant.baud())?;
        Ok(Self::from_link(Box::new(link)))
    }

    /// Wrap an already-constructed link (tests inject a [`MockLink`] here).
    pub fn from_link(link: Box<dyn SerialLink>) -> Self {
        Self {
            link: Some(link),
            carry: Vec::new(),
        }
    }

    /// Wrap a transport for sharing between session tasks.
    pub fn into_shared(self) -> SharedTransport {
        Arc::new(Mutex::new(self))
    }

    /// Whether the transport currently holds an open link.
    pub fn is_open(&self) -> bool {
        self.link.is_some()
    }

    /// Write all bytes to the link. Best-effort: no implicit retry.
    pub fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let link = self.link.as_mut().ok_or(TransportError::Closed)?;
        link.write_bytes(data)
    }

    /// Read one line, accumulating bytes until `\r\n` or the deadline.
    ///
    /// Returns the first complete line including its terminator; bytes
    /// past the terminator are retained for the next call. At the
    /// deadline, whatever accumulated (possibly nothing) is returned
    /// rather than failing; callers treat an empty or partial result as
    /// "no event this tick". If the link's own bounded read yields nothing
    /// and no bytes have accumulated yet, the call returns early instead
    /// of spinning until the deadline.
    pub fn read_line(&mut self, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        let link = self.link.as_mut().ok_or(TransportError::Closed)?;
        let deadline = Instant::now() + timeout;
        let mut chunk = [0u8; 64];

        loop {
            if let Some(pos) = find_terminator(&self.carry) {
                let rest = self.carry.split_off(pos + LINE_TERMINATOR.len());
                let line = std::mem::replace(&mut self.carry, rest);
                return Ok(line);
            }

            let n = link.read_bytes(&mut chunk)?;
            if n == 0 {
                if self.carry.is_empty() || Instant::now() >= deadline {
                    return Ok(std::mem::take(&mut self.carry));
                }
                continue;
            }
            self.carry.extend_from_slice(&chunk[..n]);
            if Instant::now() >= deadline && find_terminator(&self.carry).is_none() {
                return Ok(std::mem::take(&mut self.carry));
            }
        }
    }

    /// Close the transport. Safe to call on an already-closed or
    /// never-opened transport.
    pub fn close(&mut self) {
        if let Some(link) = self.link.take() {
            tracing::debug!(link = link.name(), "transport closed");
        }
        self.carry.clear();
    }
}

/// Position of the first `\r\n` in `data`, if any.
fn find_terminator(data: &[u8]) -> Option<usize> {
    data.windows(LINE_TERMINATOR.len())
        .position(|w| w == LINE_TERMINATOR)
}
