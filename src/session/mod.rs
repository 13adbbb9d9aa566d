//! Device session: one module, one transport, one lifecycle.
//!
//! The session drives the state machine
//! `Idle → Configuring → Running → ShuttingDown → Closed`. While
//! `Running`, exactly two tasks share the transport: the beacon task
//! (periodic transmission) and the poll task (continuous reception). All
//! transport access is serialized through the shared mutex, and both
//! tasks observe one session-wide cancellation token.

pub mod events;

pub use events::{LogEntry, SessionEvent};

use crate::device::{self, DeviceProfile, HandshakeError};
use crate::error::AppError;
use crate::protocol::{self, Decoded, InboundEvent, BROADCAST_ADDRESS};
use crate::relay::{DropReason, RelayDecision, RelayPolicy};
use crate::transport::{SharedTransport, Transport, TransportError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Default beacon interval.
pub const DEFAULT_BEACON_INTERVAL: Duration = Duration::from_secs(60);

/// Deployment role of this station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// Transmit `text` every `interval` while receiving.
    Beacon { text: String, interval: Duration },
    /// Send user messages, display inbound ones, ack what arrives.
    Interactive,
    /// Stateless single-hop rebroadcast tagged with `station_id`.
    Repeater { station_id: String },
}

/// Session lifecycle states. Terminal state is `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Configuring,
    Running,
    ShuttingDown,
    Closed,
}

/// Poll task tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Bounded per-tick read deadline.
    pub read_timeout: Duration,
    /// Idle delay when a tick produced nothing.
    pub idle_delay: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(250),
            idle_delay: Duration::from_millis(50),
        }
    }
}

/// Entry points for running a device session.
pub struct DeviceSession;

impl DeviceSession {
    /// Open the profile's serial port and run a session over it.
    pub async fn start(profile: DeviceProfile, role: Role) -> Result<SessionHandle, AppError> {
        let transport = Transport::open(&profile)?;
        Self::with_transport(profile, role, transport, PollSettings::default()).await
    }

    /// Run a session over an already-open transport.
    ///
    /// Tests inject a mock-backed transport here; the binary goes through
    /// [`DeviceSession::start`].
    pub async fn with_transport(
        profile: DeviceProfile,
        role: Role,
        transport: Transport,
        poll: PollSettings,
    ) -> Result<SessionHandle, AppError> {
        let transport = transport.into_shared();
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        info!(variant = %profile.variant, port = %profile.port, "configuring module");
        state_tx.send_replace(SessionState::Configuring);
        if let Err(err) = device::run_handshake(&transport, &profile).await {
            transport.lock().close();
            state_tx.send_replace(SessionState::Closed);
            return Err(handshake_failure(err));
        }

        info!(address = profile.address, "module configured, session running");
        state_tx.send_replace(SessionState::Running);

        let cancel = CancellationToken::new();
        let beacon_text = Arc::new(Mutex::new(match &role {
            Role::Beacon { text, .. } => text.clone(),
            _ => String::new(),
        }));
        let beacon_interval = match &role {
            Role::Beacon { interval, .. } => Some(*interval),
            _ => None,
        };
        let malformed = Arc::new(AtomicU64::new(0));

        let beacon = tokio::spawn(beacon_task(
            transport.clone(),
            cancel.clone(),
            beacon_interval,
            beacon_text.clone(),
            event_tx.clone(),
        ));
        let poller = tokio::spawn(poll_task(
            transport.clone(),
            cancel.clone(),
            role,
            poll,
            event_tx.clone(),
            malformed.clone(),
        ));

        // Supervisor: observe cancellation, join both tasks, close the
        // transport exactly once.
        let supervisor_transport = transport.clone();
        let supervisor_cancel = cancel.clone();
        tokio::spawn(async move {
            supervisor_cancel.cancelled().await;
            state_tx.send_replace(SessionState::ShuttingDown);
            let _ = beacon.await;
            let _ = poller.await;
            supervisor_transport.lock().close();
            state_tx.send_replace(SessionState::Closed);
            debug!("session closed");
        });

        Ok(SessionHandle {
            transport,
            cancel,
            beacon_text,
            events: event_rx,
            state: state_rx,
            malformed,
        })
    }
}

fn handshake_failure(err: HandshakeError) -> AppError {
    match err {
        HandshakeError::Transport(e) => AppError::Transport(e),
        other => AppError::Handshake(other),
    }
}

/// Presentation-layer handle to a running session.
pub struct SessionHandle {
    transport: SharedTransport,
    cancel: CancellationToken,
    beacon_text: Arc<Mutex<String>>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    state: watch::Receiver<SessionState>,
    malformed: Arc<AtomicU64>,
}

impl SessionHandle {
    /// Send a user-entered message to the broadcast address.
    ///
    /// The shared mutex serializes this with beacon and relay sends, so a
    /// user frame can never interleave mid-line with either.
    pub fn send_user_message(&self, text: &str) -> Result<(), TransportError> {
        let frame = protocol::encode_send(BROADCAST_ADDRESS, text.as_bytes());
        self.transport.lock().write(&frame)?;
        info!(len = text.len(), "user message sent");
        Ok(())
    }

    /// Replace the beacon text used from the next tick on.
    pub fn set_beacon_text(&self, text: impl Into<String>) {
        *self.beacon_text.lock() = text.into();
    }

    /// Raise the session-wide cancellation signal. One-shot; calling it
    /// again has no effect.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Receive the next event pushed by the session core.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Wait until the session reaches its terminal state.
    pub async fn closed(&mut self) {
        let _ = self
            .state
            .wait_for(|state| *state == SessionState::Closed)
            .await;
    }

    /// Number of malformed inbound lines absorbed by the poll task.
    pub fn malformed_count(&self) -> u64 {
        self.malformed.load(Ordering::Relaxed)
    }
}

/// Periodic transmission. Fires immediately, then every interval; the
/// inter-tick sleep is interruptible so shutdown is observed within one
/// tick. Roles without a schedule park on the token so the `Running`
/// topology is the same everywhere.
async fn beacon_task(
    transport: SharedTransport,
    cancel: CancellationToken,
    interval: Option<Duration>,
    text: Arc<Mutex<String>>,
    events: mpsc::UnboundedSender<SessionEvent>,
) {
    let Some(interval) = interval else {
        cancel.cancelled().await;
        return;
    };

    loop {
        if cancel.is_cancelled() {
            break;
        }

        let payload = text.lock().clone();
        let frame = protocol::encode_send(BROADCAST_ADDRESS, payload.as_bytes());
        match transport.lock().write(&frame) {
            Ok(()) => {
                debug!(len = payload.len(), "beacon sent");
                emit_log(&events, format!("Beaconing: {payload}"));
            }
            Err(err) => {
                error!(%err, "beacon write failed, shutting session down");
                emit_log(&events, format!("Beacon send failed: {err}"));
                cancel.cancel();
                break;
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

/// Continuous reception. Bounded read, decode, dispatch by role, brief
/// interruptible idle when nothing arrived. Malformed lines are counted
/// and skipped; transport failures are fatal and cancel the session.
async fn poll_task(
    transport: SharedTransport,
    cancel: CancellationToken,
    role: Role,
    settings: PollSettings,
    events: mpsc::UnboundedSender<SessionEvent>,
    malformed: Arc<AtomicU64>,
) {
    let policy = match &role {
        Role::Repeater { station_id } => Some(RelayPolicy::new(station_id.clone())),
        _ => None,
    };

    loop {
        if cancel.is_cancelled() {
            break;
        }

        let read = transport.lock().read_line(settings.read_timeout);
        match read {
            Ok(line) if line.is_empty() => {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(settings.idle_delay) => {}
                }
            }
            Ok(line) => match protocol::decode_event(&line) {
                Decoded::Event(event) => {
                    handle_event(&transport, &role, policy.as_ref(), &events, event);
                }
                Decoded::NotAnEvent(raw) => {
                    if !raw.trim().is_empty() {
                        debug!(line = %raw, "module response");
                        emit_log(&events, format!("Received: {raw}"));
                    }
                }
                Decoded::Malformed(raw) => {
                    malformed.fetch_add(1, Ordering::Relaxed);
                    warn!(line = %raw, "malformed receive notification");
                    emit_log(&events, format!("Malformed line skipped: {raw}"));
                }
            },
            Err(err) => {
                error!(%err, "transport read failed, shutting session down");
                emit_log(&events, format!("Transport failed: {err}"));
                cancel.cancel();
                break;
            }
        }
    }
}

/// Dispatch one decoded event to the active role handler.
fn handle_event(
    transport: &SharedTransport,
    role: &Role,
    policy: Option<&RelayPolicy>,
    events: &mpsc::UnboundedSender<SessionEvent>,
    event: InboundEvent,
) {
    let _ = events.send(SessionEvent::Inbound(event.clone()));

    match role {
        Role::Beacon { .. } => {}
        Role::Interactive => {
            if !is_ack(&event.payload) {
                let reply = format!("ACK {}", event.sender);
                let frame = protocol::encode_send(BROADCAST_ADDRESS, reply.as_bytes());
                match transport.lock().write(&frame) {
                    Ok(()) => emit_log(events, format!("Acknowledged station {}", event.sender)),
                    Err(err) => {
                        warn!(%err, sender = event.sender, "ack send failed");
                        emit_log(events, format!("Ack to {} failed: {err}", event.sender));
                    }
                }
            }
        }
        Role::Repeater { .. } => {
            if let Some(policy) = policy {
                match policy.evaluate(&event) {
                    RelayDecision::Rebroadcast(frame) => match transport.lock().write(&frame.encode()) {
                        Ok(()) => emit_log(
                            events,
                            format!("Repeated message from {}", event.sender),
                        ),
                        Err(err) => {
                            warn!(%err, sender = event.sender, "relay send failed");
                            emit_log(events, format!("Relay failed: {err}"));
                        }
                    },
                    RelayDecision::Drop { reason } => {
                        let reason = match reason {
                            DropReason::RepeatMarker => "repeat marker",
                            DropReason::AlreadyRelayed => "already relayed here",
                        };
                        debug!(sender = event.sender, reason, "relay suppressed");
                        emit_log(events, format!("Ignoring repeated message ({reason})"));
                    }
                }
            }
            let _ = events.send(SessionEvent::Processed);
        }
    }
}

/// First payload token is the acknowledgment keyword. Two interactive
/// stations must not ack each other's acks forever.
fn is_ack(payload: &[u8]) -> bool {
    String::from_utf8_lossy(payload)
        .split_whitespace()
        .next()
        .is_some_and(|token| token == "ACK")
}

fn emit_log(events: &mpsc::UnboundedSender<SessionEvent>, text: String) {
    let _ = events.send(SessionEvent::Log(LogEntry::now(text)));
}
