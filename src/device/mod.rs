//! Device profile and configuration handshake for the RYLR module family.

pub mod handshake;
pub mod profile;

pub use handshake::{run as run_handshake, steps as handshake_steps, HandshakeError, HandshakeStep};
pub use profile::{
    DeviceProfile, InvalidVariant, RadioParams, Variant, DEFAULT_FREQUENCY_HZ,
    DEFAULT_NODE_ADDRESS, DEFAULT_POWER_DBM, DEFAULT_REPEATER_ADDRESS,
};
