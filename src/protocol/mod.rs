//! Wire protocol for the RYLR module family.
//!
//! Command encoding and receive-notification decoding for the
//! line-oriented AT protocol described in the module datasheets.

pub mod codec;
pub mod command;

pub use codec::{decode_event, encode_send, Decoded, InboundEvent, OutboundFrame};
pub use command::{Command, BROADCAST_ADDRESS};
