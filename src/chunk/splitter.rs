//! Outbound helper that splits payloads into budget-sized frames.
//!
//! [`split`] is the one-shot entry point taking textual provenance.
//! [`Splitter`] keeps a validated [`ChunkingConfig`] and provenance for a
//! sender and hands out fresh [`MessageId`] values so callers can chunk
//! payloads without tracking identifiers themselves.

use std::{
    num::NonZeroUsize,
    sync::atomic::{AtomicI64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use bytes::Bytes;

use super::{
    ChunkIndex,
    ChunkingConfig,
    ConfigurationError,
    EncodingError,
    Frame,
    MessageId,
    Provenance,
    SplitError,
    encode_frame,
};

/// Largest value the signed 32-bit length and count fields can carry.
const WIRE_LIMIT: usize = i32::MAX as usize;

/// Split `payload` into frames that each encode to at most `chunk_budget`
/// bytes.
///
/// Frames come back in ascending chunk order and every frame records the
/// full payload length. An empty payload still yields exactly one empty
/// frame.
///
/// # Errors
///
/// Returns [`SplitError::Encoding`] when `source_address` is not an IP
/// literal and [`SplitError::Configuration`] when the budget cannot carry
/// any payload or the payload exceeds the wire limits.
///
/// # Examples
///
/// ```
/// use chunkwire::chunk::{MessageId, split};
///
/// let frames = split(vec![b'A'; 2500], 1024, MessageId::new(1), "192.168.1.100", 41234)
///     .expect("split payload");
/// assert_eq!(frames.len(), 3);
/// assert!(frames.iter().all(|frame| frame.total_payload_length() == 2500));
/// ```
pub fn split(
    payload: impl Into<Bytes>,
    chunk_budget: u32,
    message_id: MessageId,
    source_address: &str,
    source_port: u16,
) -> Result<Vec<Frame>, SplitError> {
    let provenance = Provenance::parse(source_address, source_port)?;
    let config = ChunkingConfig::for_chunk_budget(chunk_budget, provenance.address().family())?;
    let frames = build_frames(
        config.max_payload_per_frame(),
        message_id,
        provenance,
        payload.into(),
    )?;
    Ok(frames)
}

/// Encode every frame of a batch, preserving order.
///
/// # Errors
///
/// Returns the first [`EncodingError`] raised by [`encode_frame`].
pub fn encode_all<'a>(
    frames: impl IntoIterator<Item = &'a Frame>,
) -> Result<Vec<Bytes>, EncodingError> {
    frames.into_iter().map(encode_frame).collect()
}

fn build_frames(
    max: NonZeroUsize,
    message_id: MessageId,
    provenance: Provenance,
    payload: Bytes,
) -> Result<Vec<Frame>, ConfigurationError> {
    let total = payload.len();
    let total_length = u32::try_from(total)
        .ok()
        .filter(|len| *len as usize <= WIRE_LIMIT)
        .ok_or(ConfigurationError::PayloadTooLarge {
            len: total,
            limit: WIRE_LIMIT,
        })?;

    if payload.is_empty() {
        return Ok(vec![Frame::from_parts(
            message_id,
            ChunkIndex::zero(),
            1,
            0,
            provenance,
            payload,
        )]);
    }

    let max = max.get();
    let chunk_count = total.div_ceil(max);
    let total_chunks = u32::try_from(chunk_count)
        .ok()
        .filter(|count| *count as usize <= WIRE_LIMIT)
        .ok_or(ConfigurationError::TooManyChunks {
            chunks: chunk_count,
            limit: WIRE_LIMIT,
        })?;

    let mut frames = Vec::with_capacity(chunk_count);
    for (position, offset) in (0..total).step_by(max).enumerate() {
        let end = (offset + max).min(total);
        let index = ChunkIndex::try_from(position).map_err(|_| ConfigurationError::TooManyChunks {
            chunks: chunk_count,
            limit: WIRE_LIMIT,
        })?;
        frames.push(Frame::from_parts(
            message_id,
            index,
            total_chunks,
            total_length,
            provenance,
            payload.slice(offset..end),
        ));
    }
    Ok(frames)
}

/// Splits payloads for one sender, generating message identifiers.
#[derive(Debug)]
pub struct Splitter {
    config: ChunkingConfig,
    provenance: Provenance,
    next_message_id: AtomicI64,
}

impl Splitter {
    /// Create a splitter whose identifiers start at the current Unix time in
    /// milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::BudgetTooSmall`] when `chunk_budget`
    /// cannot carry payload for the provenance's address family.
    pub fn new(chunk_budget: u32, provenance: Provenance) -> Result<Self, ConfigurationError> {
        Self::with_starting_id(chunk_budget, provenance, clock_seed())
    }

    /// Create a splitter whose identifiers start at `start_at`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::BudgetTooSmall`] when `chunk_budget`
    /// cannot carry payload for the provenance's address family.
    pub fn with_starting_id(
        chunk_budget: u32,
        provenance: Provenance,
        start_at: MessageId,
    ) -> Result<Self, ConfigurationError> {
        let config = ChunkingConfig::for_chunk_budget(chunk_budget, provenance.address().family())?;
        Ok(Self {
            config,
            provenance,
            next_message_id: AtomicI64::new(start_at.get()),
        })
    }

    /// Return the validated chunking configuration.
    #[must_use]
    pub const fn config(&self) -> ChunkingConfig { self.config }

    /// Return the provenance stamped on every frame.
    #[must_use]
    pub const fn provenance(&self) -> Provenance { self.provenance }

    /// Generate and return the next [`MessageId`].
    ///
    /// The counter wraps at `i64::MAX`; identifiers only need to be unique
    /// across messages in flight at the same time.
    #[must_use]
    pub fn next_message_id(&self) -> MessageId {
        MessageId::new(self.next_message_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Split `payload` under a freshly generated identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] when the payload exceeds the wire
    /// limits.
    pub fn split(&self, payload: impl Into<Bytes>) -> Result<ChunkBatch, ConfigurationError> {
        self.split_with_id(self.next_message_id(), payload)
    }

    /// Split `payload` under an explicit identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] when the payload exceeds the wire
    /// limits.
    pub fn split_with_id(
        &self,
        message_id: MessageId,
        payload: impl Into<Bytes>,
    ) -> Result<ChunkBatch, ConfigurationError> {
        let frames = build_frames(
            self.config.max_payload_per_frame(),
            message_id,
            self.provenance,
            payload.into(),
        )?;
        Ok(ChunkBatch::new(message_id, frames))
    }
}

fn clock_seed() -> MessageId {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default();
    MessageId::new(millis)
}

/// Frames produced for a single message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkBatch {
    message_id: MessageId,
    frames: Vec<Frame>,
}

impl ChunkBatch {
    fn new(message_id: MessageId, frames: Vec<Frame>) -> Self {
        debug_assert!(!frames.is_empty(), "chunk batches must not be empty");
        Self { message_id, frames }
    }

    /// Return the identifier shared by all frames.
    #[must_use]
    pub const fn message_id(&self) -> MessageId { self.message_id }

    /// Return the frames in chunk order.
    #[must_use]
    pub fn frames(&self) -> &[Frame] { self.frames.as_slice() }

    /// Number of frames in the batch.
    #[expect(
        clippy::len_without_is_empty,
        reason = "batches are guaranteed non-empty"
    )]
    #[must_use]
    pub fn len(&self) -> usize { self.frames.len() }

    /// Whether the payload needed more than one frame.
    #[must_use]
    pub fn is_chunked(&self) -> bool { self.len() > 1 }

    /// Encode every frame for transport.
    ///
    /// # Errors
    ///
    /// Returns the first [`EncodingError`] raised by [`encode_frame`].
    pub fn encode(&self) -> Result<Vec<Bytes>, EncodingError> { encode_all(&self.frames) }

    /// Consume the batch, returning the frames.
    #[must_use]
    pub fn into_frames(self) -> Vec<Frame> { self.frames }
}

impl IntoIterator for ChunkBatch {
    type Item = Frame;
    type IntoIter = std::vec::IntoIter<Frame>;

    fn into_iter(self) -> Self::IntoIter { self.frames.into_iter() }
}
