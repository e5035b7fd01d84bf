//! Errors surfaced by the UDP transport adapter.

use std::io;

use thiserror::Error;

use crate::chunk::{ConfigurationError, EncodingError, SplitError};

/// Failures while sending payloads or running a receive loop.
///
/// Individual bad datagrams are not errors at this level: the receiver logs
/// and drops them.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The payload could not be split into frames.
    #[error("failed to split payload: {0}")]
    Split(#[from] SplitError),
    /// A typed message could not be serialised.
    #[error("failed to encode message: {0}")]
    Message(#[from] bincode::error::EncodeError),
    /// A JSON payload could not be serialised.
    #[error("failed to encode JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    /// The socket or sink failed.
    #[error("datagram transport failed: {0}")]
    Io(#[from] io::Error),
    /// The consumer of reassembled messages went away.
    #[error("delivery channel closed")]
    DeliveryClosed,
}

impl From<ConfigurationError> for TransportError {
    fn from(value: ConfigurationError) -> Self { Self::Split(value.into()) }
}

impl From<EncodingError> for TransportError {
    fn from(value: EncodingError) -> Self { Self::Split(value.into()) }
}
