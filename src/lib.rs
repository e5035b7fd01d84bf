#![doc(html_root_url = "https://docs.rs/chunkwire/latest")]
//! Public API for the `chunkwire` library.
//!
//! This crate splits arbitrary payloads into self-describing binary frames
//! that fit a datagram budget, and reassembles them on the receiving side
//! regardless of arrival order. Each frame carries a `0xCAFE` marker, the
//! message identifier, chunk position, original payload length, the
//! original sender's address and port, and a CRC-32 of its payload.
//!
//! The [`chunk`] module is transport-agnostic and performs no I/O. The
//! [`transport`] module connects it to tokio UDP sockets.

pub mod byte_order;
pub mod checksum;
pub mod chunk;
pub mod message;
pub mod metrics;
pub mod transport;

pub use chunk::{
    ChunkBatch,
    ChunkIndex,
    DecodeError,
    Frame,
    MessageId,
    Provenance,
    ReassembledMessage,
    Reassembler,
    ReassemblyConfig,
    ReassemblyError,
    ReassemblyOutcome,
    SplitError,
    Splitter,
    decode_frame,
    encode_frame,
    split,
};
pub use message::Message;
pub use metrics::Direction;
pub use transport::{ChunkSender, DatagramReceiver, Delivery, TransportError};
