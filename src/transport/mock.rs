//! Mock serial link for testing.
//!
//! Provides a `MockLink` that simulates the radio module's serial line
//! without hardware. Tests enqueue inbound lines and inspect everything the
//! session wrote.

use super::error::TransportError;
use super::traits::SerialLink;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Inner state of the mock link, protected by a mutex for interior mutability.
#[derive(Debug, Default)]
struct MockLinkState {
    /// Bytes to be returned by read operations.
    read_queue: VecDeque<u8>,
    /// Log of all writes, one entry per `write_bytes` call.
    write_log: Vec<Vec<u8>>,
    /// Responses delivered to the read queue one per write, in order.
    scripted_responses: VecDeque<Vec<u8>>,
    /// When set, the next I/O operation fails with this error kind.
    fail_next: Option<std::io::ErrorKind>,
}

/// Mock serial link.
///
/// Cloning shares the underlying state, so a test can keep a handle while
/// the session owns the link itself.
///
/// # Example
/// ```
/// use rylr_station::transport::{MockLink, SerialLink};
///
/// let mut link = MockLink::new("MOCK0");
/// link.enqueue(b"+RCV=5,5,HELLO,-80,9\r\n");
///
/// let mut buffer = [0u8; 64];
/// let n = link.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"+RCV=5,5,HELLO,-80,9\r\n");
///
/// link.write_bytes(b"AT+SEND=0,2,hi\r\n").unwrap();
/// assert_eq!(link.writes()[0], b"AT+SEND=0,2,hi\r\n");
/// ```
#[derive(Clone)]
pub struct MockLink {
    name: String,
    state: Arc<Mutex<MockLinkState>>,
}

impl MockLink {
    /// Create a new mock link with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockLinkState::default())),
        }
    }

    /// Enqueue bytes to be returned by subsequent reads.
    pub fn enqueue(&self, data: &[u8]) {
        let mut state = self.state.lock().unwrap();
        state.read_queue.extend(data);
    }

    /// Script a response that becomes readable after the next unanswered
    /// write, mimicking the module's request/response rhythm. Responses
    /// are consumed one per write, in the order scripted.
    pub fn respond(&self, data: &[u8]) {
        let mut state = self.state.lock().unwrap();
        state.scripted_responses.push_back(data.to_vec());
    }

    /// Get a copy of everything written so far, one entry per write call.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        let state = self.state.lock().unwrap();
        state.write_log.clone()
    }

    /// Get the write log decoded as lossy UTF-8 strings.
    pub fn writes_utf8(&self) -> Vec<String> {
        self.writes()
            .iter()
            .map(|w| String::from_utf8_lossy(w).into_owned())
            .collect()
    }

    /// Clear the write log.
    pub fn clear_writes(&self) {
        let mut state = self.state.lock().unwrap();
        state.write_log.clear();
    }

    /// Make the next read or write fail with the given I/O error kind.
    pub fn fail_next(&self, kind: std::io::ErrorKind) {
        let mut state = self.state.lock().unwrap();
        state.fail_next = Some(kind);
    }

    /// Number of bytes still queued for reading.
    pub fn pending_bytes(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.read_queue.len()
    }
}

impl SerialLink for MockLink {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        if let Some(kind) = state.fail_next.take() {
            return Err(TransportError::Io(std::io::Error::new(kind, "injected failure")));
        }
        state.write_log.push(data.to_vec());
        if let Some(response) = state.scripted_responses.pop_front() {
            state.read_queue.extend(response);
        }
        Ok(())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, TransportError> {
        let mut state = self.state.lock().unwrap();
        if let Some(kind) = state.fail_next.take() {
            return Err(TransportError::Io(std::io::Error::new(kind, "injected failure")));
        }
        let mut bytes_read = 0;
        for byte in buffer.iter_mut() {
            match state.read_queue.pop_front() {
                Some(queued) => {
                    *byte = queued;
                    bytes_read += 1;
                }
                None => break,
            }
        }
        Ok(bytes_read)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_timeout(&mut self, _timeout: Duration) -> Result<(), TransportError> {
        // The mock never blocks, so there is nothing to bound.
        Ok(())
    }
}

impl std::fmt::Debug for MockLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockLink")
            .field("name", &self.name)
            .field("pending_bytes", &self.pending_bytes())
            .finish()
    }
}
