use bytes::Bytes;

use super::{ChunkIndex, FrameError, MessageId, Provenance};

/// One on-wire chunk of a logical message.
///
/// A frame is immutable once built: [`Frame::new`] checks the structural
/// invariants (`total_chunks >= 1`, `chunk_index < total_chunks`, and a chunk
/// never claiming more bytes than the whole message) and every field is
/// exposed read-only. The checksum is not stored; the wire codec derives it
/// from the payload when encoding and verifies it when decoding.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use chunkwire::chunk::{ChunkIndex, Frame, MessageId, Provenance};
///
/// let provenance = Provenance::parse("192.168.1.100", 41234).expect("valid address");
/// let frame = Frame::new(
///     MessageId::new(7),
///     ChunkIndex::new(1),
///     3,
///     2500,
///     provenance,
///     Bytes::from_static(b"chunk"),
/// )
/// .expect("valid frame");
/// assert_eq!(frame.chunk_index().get(), 1);
/// assert!(!frame.is_last());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    message_id: MessageId,
    chunk_index: ChunkIndex,
    total_chunks: u32,
    total_payload_length: u32,
    provenance: Provenance,
    payload: Bytes,
}

impl Frame {
    /// Build a frame, validating its structural invariants.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError`] when `total_chunks` is zero, when
    /// `chunk_index` is not below `total_chunks`, or when `payload` is longer
    /// than `total_payload_length`.
    pub fn new(
        message_id: MessageId,
        chunk_index: ChunkIndex,
        total_chunks: u32,
        total_payload_length: u32,
        provenance: Provenance,
        payload: impl Into<Bytes>,
    ) -> Result<Self, FrameError> {
        let payload = payload.into();
        if total_chunks == 0 {
            return Err(FrameError::NoChunks);
        }
        if chunk_index.get() >= total_chunks {
            return Err(FrameError::IndexOutOfRange {
                index: chunk_index,
                total: total_chunks,
            });
        }
        if payload.len() > total_payload_length as usize {
            return Err(FrameError::PayloadExceedsTotal {
                len: payload.len(),
                total: total_payload_length,
            });
        }
        Ok(Self {
            message_id,
            chunk_index,
            total_chunks,
            total_payload_length,
            provenance,
            payload,
        })
    }

    /// Assemble a frame whose invariants the caller already guarantees.
    pub(crate) fn from_parts(
        message_id: MessageId,
        chunk_index: ChunkIndex,
        total_chunks: u32,
        total_payload_length: u32,
        provenance: Provenance,
        payload: Bytes,
    ) -> Self {
        debug_assert!(chunk_index.get() < total_chunks, "chunk index out of range");
        debug_assert!(
            payload.len() <= total_payload_length as usize,
            "chunk larger than message"
        );
        Self {
            message_id,
            chunk_index,
            total_chunks,
            total_payload_length,
            provenance,
            payload,
        }
    }

    /// Identifier shared by every chunk of the message.
    #[must_use]
    pub const fn message_id(&self) -> MessageId { self.message_id }

    /// Zero-based position of this chunk.
    #[must_use]
    pub const fn chunk_index(&self) -> ChunkIndex { self.chunk_index }

    /// Number of chunks composing the message.
    #[must_use]
    pub const fn total_chunks(&self) -> u32 { self.total_chunks }

    /// Length of the original, unsplit payload.
    #[must_use]
    pub const fn total_payload_length(&self) -> u32 { self.total_payload_length }

    /// Original sender of the message.
    #[must_use]
    pub const fn provenance(&self) -> Provenance { self.provenance }

    /// This chunk's slice of the payload.
    #[must_use]
    pub fn payload(&self) -> &[u8] { &self.payload }

    /// Whether this is the final chunk by position.
    #[must_use]
    pub const fn is_last(&self) -> bool { self.chunk_index.get() + 1 == self.total_chunks }

    /// Consume the frame, returning its payload without copying.
    #[must_use]
    pub fn into_payload(self) -> Bytes { self.payload }
}
