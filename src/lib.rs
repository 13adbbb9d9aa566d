//! RYLR Station Library
//!
//! Core functionality for operating REYAX RYLR993/RYLR998 LoRa modules
//! over their serial AT-command protocol, in three deployment roles:
//! periodic beacon, interactive messenger, and stateless repeater.
//!
//! # Modules
//!
//! - `config`: TOML configuration with environment overrides
//! - `device`: device profile and variant configuration handshake
//! - `error`: unified error handling
//! - `protocol`: AT command encoding and receive-notification decoding
//! - `relay`: repeater rebroadcast policy
//! - `session`: session scheduler, state machine, and public handle
//! - `transport`: serial link abstraction with real and mock backends

pub mod config;
pub mod device;
pub mod error;
pub mod protocol;
pub mod relay;
pub mod session;
pub mod transport;

// Re-export commonly used types for convenience
pub use config::{Config, ConfigError};
pub use device::{DeviceProfile, HandshakeError, RadioParams, Variant};
pub use error::{AppError, AppResult};
pub use protocol::{Decoded, InboundEvent, OutboundFrame};
pub use relay::{RelayDecision, RelayPolicy};
pub use session::{
    DeviceSession, LogEntry, PollSettings, Role, SessionEvent, SessionHandle, SessionState,
};
pub use transport::{MockLink, SerialLink, Transport, TransportError};
