//! Inbound helper that stitches frames back into complete payloads.
//!
//! [`Reassembler`] mirrors the outbound [`Splitter`](crate::chunk::Splitter)
//! by collecting frames keyed by [`MessageId`]. Frames may arrive in any
//! order; each message's chunks are held by index so a repeated index is
//! dropped instead of being counted twice. A message is delivered exactly
//! once, in the step that receives its last missing chunk, and its entry is
//! removed in that same step. Incomplete messages are evicted once they
//! outlive the configured timeout so lost datagrams cannot grow the map
//! without bound. The helper performs no I/O and is transport-agnostic.

use std::{
    collections::{BTreeMap, HashMap, hash_map::Entry},
    num::NonZeroUsize,
    time::Instant,
};

use bytes::{Bytes, BytesMut};
use log::debug;
use serde::de::DeserializeOwned;

use super::{
    ChunkIndex,
    ConfigurationError,
    Frame,
    MessageId,
    Provenance,
    ReassemblyConfig,
    ReassemblyError,
};
use crate::message::Message;

#[derive(Debug)]
struct PartialMessage {
    total_chunks: u32,
    total_payload_length: u32,
    provenance: Provenance,
    chunks: BTreeMap<ChunkIndex, Bytes>,
    buffered: usize,
    started_at: Instant,
}

impl PartialMessage {
    fn new(frame: Frame, started_at: Instant) -> Self {
        let total_chunks = frame.total_chunks();
        let total_payload_length = frame.total_payload_length();
        let provenance = frame.provenance();
        let index = frame.chunk_index();
        let payload = frame.into_payload();
        Self {
            total_chunks,
            total_payload_length,
            provenance,
            buffered: payload.len(),
            chunks: BTreeMap::from([(index, payload)]),
            started_at,
        }
    }

    fn check(&self, frame: &Frame) -> Result<(), ReassemblyError> {
        if frame.total_chunks() != self.total_chunks {
            return Err(ReassemblyError::TotalChunksMismatch {
                message_id: frame.message_id(),
                expected: self.total_chunks,
                found: frame.total_chunks(),
            });
        }
        if frame.total_payload_length() != self.total_payload_length {
            return Err(ReassemblyError::TotalLengthMismatch {
                message_id: frame.message_id(),
                expected: self.total_payload_length,
                found: frame.total_payload_length(),
            });
        }
        Ok(())
    }

    /// Store the frame's payload, returning `false` for a repeated index.
    ///
    /// The buffered bytes never exceed the declared payload length, which the
    /// first frame already held to the size cap.
    fn insert(&mut self, frame: Frame) -> Result<bool, ReassemblyError> {
        let index = frame.chunk_index();
        if self.chunks.contains_key(&index) {
            return Ok(false);
        }
        let assembled = self.buffered + frame.payload().len();
        if assembled > self.total_payload_length as usize {
            return Err(ReassemblyError::LengthMismatch {
                message_id: frame.message_id(),
                expected: self.total_payload_length,
                assembled,
            });
        }
        self.buffered = assembled;
        self.chunks.insert(index, frame.into_payload());
        Ok(true)
    }

    fn received(&self) -> u32 { u32::try_from(self.chunks.len()).unwrap_or(u32::MAX) }

    fn is_complete(&self) -> bool { self.received() == self.total_chunks }

    fn started_at(&self) -> Instant { self.started_at }

    fn progress(&self) -> Progress {
        Progress {
            received: self.received(),
            total: self.total_chunks,
            complete: self.is_complete(),
        }
    }

    /// Concatenate the chunks in index order.
    fn into_payload(self) -> Bytes {
        if self.chunks.len() == 1 {
            return self.chunks.into_values().next().unwrap_or_default();
        }
        let mut buffer = BytesMut::with_capacity(self.buffered);
        for chunk in self.chunks.into_values() {
            buffer.extend_from_slice(&chunk);
        }
        buffer.freeze()
    }
}

/// Container for a fully reassembled payload and its provenance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReassembledMessage {
    message_id: MessageId,
    provenance: Provenance,
    payload: Bytes,
}

impl ReassembledMessage {
    /// Construct a new [`ReassembledMessage`].
    #[must_use]
    pub fn new(message_id: MessageId, provenance: Provenance, payload: impl Into<Bytes>) -> Self {
        Self {
            message_id,
            provenance,
            payload: payload.into(),
        }
    }

    /// Identifier shared by the frames that formed this message.
    #[must_use]
    pub const fn message_id(&self) -> MessageId { self.message_id }

    /// Original sender, copied from the constituent frames.
    #[must_use]
    pub const fn provenance(&self) -> Provenance { self.provenance }

    /// Borrow the reassembled payload.
    #[must_use]
    pub fn payload(&self) -> &[u8] { &self.payload }

    /// Consume the message, returning the payload bytes.
    #[must_use]
    pub fn into_payload(self) -> Bytes { self.payload }

    /// Represent the message as a single self-contained frame.
    ///
    /// The frame has chunk index `0` and a chunk count of `1`, so encoding it
    /// relays the whole payload as one datagram when it fits.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::PayloadTooLarge`] when the payload does
    /// not fit the signed 32-bit length field.
    pub fn into_frame(self) -> Result<Frame, ConfigurationError> {
        let len = self.payload.len();
        let total = u32::try_from(len)
            .ok()
            .filter(|total| i32::try_from(*total).is_ok())
            .ok_or(ConfigurationError::PayloadTooLarge {
                len,
                limit: i32::MAX as usize,
            })?;
        Ok(Frame::from_parts(
            self.message_id,
            ChunkIndex::zero(),
            1,
            total,
            self.provenance,
            self.payload,
        ))
    }

    /// Decode the payload into a strongly typed bincode message.
    ///
    /// # Errors
    ///
    /// Returns any [`bincode::error::DecodeError`] raised while deserialising,
    /// including when bytes remain after the message.
    pub fn decode<M: Message>(&self) -> Result<M, bincode::error::DecodeError> {
        M::decode_payload(self.payload())
    }

    /// Interpret the payload as JSON.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] when the payload is not valid JSON for
    /// `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(self.payload())
    }
}

/// Result of feeding one frame into a [`Reassembler`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReassemblyOutcome {
    /// The message still expects more chunks.
    Pending,
    /// The frame completed the message.
    Complete(ReassembledMessage),
}

impl ReassemblyOutcome {
    /// Whether the outcome carries a completed message.
    #[must_use]
    pub const fn is_complete(&self) -> bool { matches!(self, Self::Complete(_)) }

    /// Return the completed message, if any.
    #[must_use]
    pub fn into_message(self) -> Option<ReassembledMessage> {
        match self {
            Self::Pending => None,
            Self::Complete(message) => Some(message),
        }
    }
}

/// Snapshot of how far a message has been received.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    /// Distinct chunks held so far.
    pub received: u32,
    /// Chunks the message consists of, or `0` when the message is unknown.
    pub total: u32,
    /// Whether every chunk is present.
    pub complete: bool,
}

/// Stateful frame reassembler with timeout-based eviction.
#[derive(Debug)]
pub struct Reassembler {
    config: ReassemblyConfig,
    buffers: HashMap<MessageId, PartialMessage>,
}

impl Reassembler {
    /// Create a reassembler bounded by `config`.
    #[must_use]
    pub fn new(config: ReassemblyConfig) -> Self {
        Self {
            config,
            buffers: HashMap::new(),
        }
    }

    /// Return the active configuration.
    #[must_use]
    pub const fn config(&self) -> &ReassemblyConfig { &self.config }

    /// Process a frame using the current time.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError`] when the frame contradicts earlier frames
    /// of its message or exceeds the configured size cap. The partial message
    /// is dropped in either case.
    pub fn accept(&mut self, frame: Frame) -> Result<ReassemblyOutcome, ReassemblyError> {
        self.accept_at(frame, Instant::now())
    }

    /// Process a frame using an explicit clock reading.
    ///
    /// Expired messages are purged before the frame is considered. A frame
    /// repeating an index that is already held is dropped (the first arrival
    /// wins) and reported as [`ReassemblyOutcome::Pending`].
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError`] when the frame contradicts earlier frames
    /// of its message, exceeds the configured size cap, or would push the
    /// buffered bytes past the declared payload length. The partial message
    /// is dropped in each case.
    pub fn accept_at(
        &mut self,
        frame: Frame,
        now: Instant,
    ) -> Result<ReassemblyOutcome, ReassemblyError> {
        self.purge_expired_at(now);

        let message_id = frame.message_id();
        match self.buffers.entry(message_id) {
            Entry::Occupied(mut occupied) => {
                if let Err(err) = occupied.get().check(&frame) {
                    occupied.remove();
                    return Err(err);
                }

                let index = frame.chunk_index();
                let inserted = match occupied.get_mut().insert(frame) {
                    Ok(inserted) => inserted,
                    Err(err) => {
                        occupied.remove();
                        return Err(err);
                    }
                };
                if !inserted {
                    debug!("dropping duplicate chunk: message_id={message_id}, index={index}");
                    return Ok(ReassemblyOutcome::Pending);
                }

                let progress = occupied.get().progress();
                debug!(
                    "received chunk {}/{} for message {message_id}",
                    progress.received, progress.total
                );
                if progress.complete {
                    let partial = occupied.remove();
                    return Self::finish(message_id, partial).map(ReassemblyOutcome::Complete);
                }
                Ok(ReassemblyOutcome::Pending)
            }
            Entry::Vacant(vacant) => {
                Self::assert_within_limit(
                    self.config.max_message_size,
                    message_id,
                    frame.total_payload_length() as usize,
                )?;

                let partial = PartialMessage::new(frame, now);
                if partial.is_complete() {
                    return Self::finish(message_id, partial).map(ReassemblyOutcome::Complete);
                }
                debug!(
                    "started reassembly of message {message_id}: 1/{} chunks",
                    partial.total_chunks
                );
                vacant.insert(partial);
                Ok(ReassemblyOutcome::Pending)
            }
        }
    }

    /// Report how many chunks of `message_id` are held.
    ///
    /// Unknown or already completed messages report zero of zero.
    #[must_use]
    pub fn progress(&self, message_id: MessageId) -> Progress {
        self.buffers
            .get(&message_id)
            .map(PartialMessage::progress)
            .unwrap_or_default()
    }

    /// Abandon a partially received message.
    ///
    /// Returns `true` if the message was buffered.
    pub fn discard(&mut self, message_id: MessageId) -> bool {
        self.buffers.remove(&message_id).is_some()
    }

    /// Abandon every partially received message, returning how many were
    /// dropped.
    pub fn discard_all(&mut self) -> usize {
        let dropped = self.buffers.len();
        self.buffers.clear();
        dropped
    }

    /// Remove any partial messages that exceeded the configured timeout.
    ///
    /// Returns the identifiers of messages that were evicted.
    pub fn purge_expired(&mut self) -> Vec<MessageId> { self.purge_expired_at(Instant::now()) }

    /// Remove any partial messages that exceeded the configured timeout using
    /// an explicit clock reading.
    ///
    /// Returns the identifiers of messages that were evicted.
    pub fn purge_expired_at(&mut self, now: Instant) -> Vec<MessageId> {
        let mut evicted = Vec::new();
        let timeout = self.config.timeout;

        self.buffers.retain(|message_id, partial| {
            let expired = now.saturating_duration_since(partial.started_at()) >= timeout;
            if expired {
                debug!(
                    "evicting stale message {message_id}: {}/{} chunks received",
                    partial.received(),
                    partial.total_chunks
                );
                evicted.push(*message_id);
            }
            !expired
        });

        evicted
    }

    /// Number of partial messages currently buffered.
    #[must_use]
    pub fn buffered_len(&self) -> usize { self.buffers.len() }

    /// Payload bytes held across all partial messages.
    #[must_use]
    pub fn buffered_bytes(&self) -> usize { self.buffers.values().map(|p| p.buffered).sum() }

    fn assert_within_limit(
        limit: NonZeroUsize,
        message_id: MessageId,
        attempted: usize,
    ) -> Result<(), ReassemblyError> {
        if attempted > limit.get() {
            return Err(ReassemblyError::MessageTooLarge {
                message_id,
                attempted,
                limit,
            });
        }
        Ok(())
    }

    fn finish(
        message_id: MessageId,
        partial: PartialMessage,
    ) -> Result<ReassembledMessage, ReassemblyError> {
        let expected = partial.total_payload_length;
        if partial.buffered != expected as usize {
            return Err(ReassemblyError::LengthMismatch {
                message_id,
                expected,
                assembled: partial.buffered,
            });
        }
        let provenance = partial.provenance;
        debug!("reassembled message {message_id}: {expected} bytes from {provenance}");
        Ok(ReassembledMessage::new(
            message_id,
            provenance,
            partial.into_payload(),
        ))
    }
}

impl Default for Reassembler {
    fn default() -> Self { Self::new(ReassemblyConfig::default()) }
}
