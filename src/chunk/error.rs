//! Error types emitted by the chunking layer.
//!
//! Outbound failures ([`ConfigurationError`], [`EncodingError`]) are caller
//! mistakes and surface synchronously. Inbound failures ([`DecodeError`],
//! [`ReassemblyError`]) describe a single bad datagram or message; receive
//! loops log them and keep listening.

use std::num::NonZeroUsize;

use thiserror::Error;

use super::{ChunkIndex, MessageId};

/// The requested chunk budget or payload cannot be expressed on the wire.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The budget leaves no room for payload bytes after the frame overhead.
    #[error("chunk budget of {budget} bytes must exceed the {overhead} byte frame overhead")]
    BudgetTooSmall { budget: u32, overhead: usize },
    /// The payload length does not fit the signed 32-bit length field.
    #[error("payload of {len} bytes exceeds the wire limit of {limit} bytes")]
    PayloadTooLarge { len: usize, limit: usize },
    /// The payload needs more chunks than the signed 32-bit count allows.
    #[error("payload needs {chunks} chunks, more than the wire limit of {limit}")]
    TooManyChunks { chunks: usize, limit: usize },
}

/// A frame or its provenance cannot be serialised.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    /// The source address is neither IPv4 nor IPv6 text.
    #[error("invalid source address {address:?}: expected IPv4 or IPv6 text")]
    InvalidAddress { address: String },
    /// A length or count exceeds its signed 32-bit wire field.
    #[error("{field} value {value} does not fit the signed 32-bit wire field")]
    FieldOverflow { field: &'static str, value: u64 },
}

/// Errors produced by [`split`](crate::chunk::split).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SplitError {
    /// The budget or payload size is unusable.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// The provenance could not be encoded.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// A frame violates its own structural invariants.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// `total_chunks` was zero.
    #[error("a message must consist of at least one chunk")]
    NoChunks,
    /// `chunk_index` is not below `total_chunks`.
    #[error("chunk index {index} out of range for {total} chunks")]
    IndexOutOfRange { index: ChunkIndex, total: u32 },
    /// A single chunk claims more bytes than the whole message.
    #[error("chunk payload of {len} bytes exceeds total payload length {total}")]
    PayloadExceedsTotal { len: usize, total: u32 },
}

/// Reasons a received buffer is not a valid frame.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer does not start with the `0xCAFE` marker.
    #[error("missing 0xCAFE magic marker")]
    InvalidMagic { found: Option<u16> },
    /// The buffer ends before the length its header implies.
    #[error("truncated frame: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },
    /// The payload does not hash to the checksum carried by the frame.
    #[error("checksum mismatch: frame carries {expected:#x}, payload hashes to {actual:#010x}")]
    ChecksumMismatch { expected: i64, actual: u32 },
    /// The address family byte is neither 4 nor 6.
    #[error("unsupported ip version {0}")]
    UnsupportedIpVersion(u8),
    /// A length or count field is negative.
    #[error("invalid {field} field: {value}")]
    InvalidField { field: &'static str, value: i64 },
    /// The header fields contradict each other.
    #[error("inconsistent frame header: {0}")]
    InvalidFrame(#[from] FrameError),
}

impl DecodeError {
    /// Short, stable label for logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidMagic { .. } => "invalid_magic",
            Self::Truncated { .. } => "truncated",
            Self::ChecksumMismatch { .. } => "checksum_mismatch",
            Self::UnsupportedIpVersion(_) => "unsupported_ip_version",
            Self::InvalidField { .. } | Self::InvalidFrame(_) => "invalid_header",
        }
    }
}

/// Errors produced by [`Reassembler`](crate::chunk::Reassembler).
///
/// Every variant drops the partial message it refers to.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ReassemblyError {
    /// A frame disagrees with earlier frames about the chunk count.
    #[error("message {message_id}: expected {expected} chunks, frame declares {found}")]
    TotalChunksMismatch {
        message_id: MessageId,
        expected: u32,
        found: u32,
    },
    /// A frame disagrees with earlier frames about the payload length.
    #[error("message {message_id}: expected {expected} payload bytes, frame declares {found}")]
    TotalLengthMismatch {
        message_id: MessageId,
        expected: u32,
        found: u32,
    },
    /// The declared payload exceeds the configured cap.
    #[error("message {message_id}: {attempted} bytes exceeds the {limit} byte limit")]
    MessageTooLarge {
        message_id: MessageId,
        attempted: usize,
        limit: NonZeroUsize,
    },
    /// The chunks did not add up to the declared payload length.
    #[error("message {message_id}: chunks hold {assembled} bytes, header declares {expected}")]
    LengthMismatch {
        message_id: MessageId,
        expected: u32,
        assembled: usize,
    },
}

impl ReassemblyError {
    /// Identifier of the message that was dropped.
    #[must_use]
    pub const fn message_id(&self) -> MessageId {
        match self {
            Self::TotalChunksMismatch { message_id, .. }
            | Self::TotalLengthMismatch { message_id, .. }
            | Self::MessageTooLarge { message_id, .. }
            | Self::LengthMismatch { message_id, .. } => *message_id,
        }
    }
}
