//! Datagram chunking protocol.
//!
//! This module collects the domain types of the chunking layer: frames and
//! their identifiers, the binary wire codec, the outbound splitter and the
//! inbound reassembler. Each sub-module focuses on a single concept while the
//! re-exports below form one cohesive API.

pub mod address;
pub mod config;
pub mod error;
pub mod frame;
pub mod id;
pub mod index;
pub mod reassembler;
pub mod shared;
pub mod splitter;
pub mod wire;

pub use address::{AddressFamily, Provenance, SourceAddress};
pub use config::{ChunkingConfig, ReassemblyConfig};
pub use error::{
    ConfigurationError,
    DecodeError,
    EncodingError,
    FrameError,
    ReassemblyError,
    SplitError,
};
pub use frame::Frame;
pub use id::MessageId;
pub use index::ChunkIndex;
pub use reassembler::{Progress, ReassembledMessage, ReassemblyOutcome, Reassembler};
pub use shared::SharedReassembler;
pub use splitter::{ChunkBatch, Splitter, encode_all, split};
pub use wire::{
    CHECKSUM_LEN,
    FRAME_MAGIC,
    decode_frame,
    decode_frame_bytes,
    encode_frame,
    frame_overhead,
    is_chunk_frame,
    max_payload_per_frame,
    metadata_len,
};
