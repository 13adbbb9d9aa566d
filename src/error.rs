//! Unified application error type.
//!
//! Fatal errors unwind through this type to the presentation boundary.
//! Non-fatal conditions (malformed inbound lines, read timeouts) never
//! become errors at all; the poll task absorbs them.

use crate::config::ConfigError;
use crate::device::{HandshakeError, InvalidVariant};
use crate::transport::TransportError;
use thiserror::Error;

/// A specialized `Result` for fatal session-level failures.
pub type AppResult<T> = Result<T, AppError>;

/// Fatal errors surfaced to the presentation layer.
#[derive(Debug, Error)]
pub enum AppError {
    /// An unsupported hardware variant was named before any hardware was
    /// touched.
    #[error(transparent)]
    InvalidVariant(#[from] InvalidVariant),

    /// The serial link failed (port unavailable, I/O error, closed).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The module rejected or ignored a configuration handshake step.
    #[error(transparent)]
    Handshake(#[from] HandshakeError),

    /// Configuration could not be loaded or validated.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
