use bytes::Bytes;
use log::debug;
use serde::Serialize;

use super::{DatagramSink, TransportError};
use crate::{
    chunk::{ChunkBatch, MessageId, Splitter},
    message::Message,
    metrics::{self, Direction},
};

/// Splits outbound payloads and hands each encoded frame to a sink.
///
/// Frames are sent in ascending chunk order. The sender awaits every
/// datagram before moving on, so a failing sink stops the message part way
/// through; the receiver will evict the partial message once it times out.
#[derive(Debug)]
pub struct ChunkSender<S> {
    splitter: Splitter,
    sink: S,
}

impl<S: DatagramSink> ChunkSender<S> {
    /// Create a sender from a configured splitter and a sink.
    #[must_use]
    pub fn new(splitter: Splitter, sink: S) -> Self { Self { splitter, sink } }

    /// Borrow the splitter used for outbound payloads.
    #[must_use]
    pub const fn splitter(&self) -> &Splitter { &self.splitter }

    /// Borrow the underlying sink.
    #[must_use]
    pub const fn sink(&self) -> &S { &self.sink }

    /// Split and transmit `payload`, returning the identifier it was sent
    /// under.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the payload cannot be split or encoded
    /// or the sink rejects a datagram.
    pub async fn send(&self, payload: impl Into<Bytes>) -> Result<MessageId, TransportError> {
        let batch = self.splitter.split(payload)?;
        self.send_batch(&batch).await?;
        Ok(batch.message_id())
    }

    /// Transmit an already split batch.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if a frame cannot be encoded or the sink
    /// rejects a datagram.
    pub async fn send_batch(&self, batch: &ChunkBatch) -> Result<(), TransportError> {
        let datagrams = batch.encode()?;
        let total = datagrams.len();
        for (position, datagram) in datagrams.into_iter().enumerate() {
            self.sink.send_datagram(datagram).await?;
            metrics::inc_frames(Direction::Outbound);
            debug!(
                "sent chunk {}/{total} of message {}",
                position + 1,
                batch.message_id()
            );
        }
        Ok(())
    }

    /// Serialise `message` with bincode and transmit it.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Message`] when serialisation fails, or any
    /// error from [`send`](Self::send).
    pub async fn send_message<M: Message + Sync>(
        &self,
        message: &M,
    ) -> Result<MessageId, TransportError> {
        self.send(message.encode_payload()?).await
    }

    /// Serialise `value` as JSON and transmit it.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Json`] when serialisation fails, or any
    /// error from [`send`](Self::send).
    pub async fn send_json<T: Serialize + Sync + ?Sized>(
        &self,
        value: &T,
    ) -> Result<MessageId, TransportError> {
        let bytes = serde_json::to_vec(value)?;
        self.send(bytes).await
    }
}
