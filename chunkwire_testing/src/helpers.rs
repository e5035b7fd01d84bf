use std::{io, net::SocketAddr, sync::Arc};

use bytes::Bytes;
use chunkwire::{
    chunk::{Frame, MessageId, Provenance, encode_frame, split},
    transport::UdpSink,
};
use tokio::net::UdpSocket;

/// Source address stamped on frames built by these helpers.
pub const TEST_SOURCE: &str = "192.168.1.100";
/// Source port stamped on frames built by these helpers.
pub const TEST_PORT: u16 = 41234;

/// Provenance matching [`TEST_SOURCE`] and [`TEST_PORT`].
#[must_use]
pub fn test_provenance() -> Provenance {
    Provenance::parse(TEST_SOURCE, TEST_PORT).expect("test source is a valid IPv4 literal")
}

/// Deterministic payload of `len` bytes cycling through `0..=250`.
#[must_use]
pub fn patterned_payload(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| u8::try_from(i % 251).expect("value below 251"))
        .collect()
}

/// Split `payload` with the test provenance, panicking on error.
#[must_use]
pub fn split_frames(payload: &[u8], chunk_budget: u32, message_id: i64) -> Vec<Frame> {
    split(
        payload.to_vec(),
        chunk_budget,
        MessageId::new(message_id),
        TEST_SOURCE,
        TEST_PORT,
    )
    .expect("split test payload")
}

/// Split and encode `payload`, returning the datagrams in chunk order.
#[must_use]
pub fn encoded_frames(payload: &[u8], chunk_budget: u32, message_id: i64) -> Vec<Bytes> {
    split_frames(payload, chunk_budget, message_id)
        .iter()
        .map(|frame| encode_frame(frame).expect("encode test frame"))
        .collect()
}

/// Reorder `items` by `order`, a permutation of their indices.
///
/// Out-of-range indices are skipped and repeated ones yield duplicates,
/// which lets tests model loss and redelivery.
#[must_use]
pub fn reorder<T: Clone>(items: &[T], order: &[usize]) -> Vec<T> {
    order.iter().filter_map(|&i| items.get(i).cloned()).collect()
}

/// A receiving socket and a sink pointed at it, both on loopback.
pub struct LoopbackPair {
    /// Socket the receiver reads from.
    pub receiver: Arc<UdpSocket>,
    /// Sink sending to [`receiver`](Self::receiver).
    pub sink: UdpSink,
}

impl LoopbackPair {
    /// Bind both ends to ephemeral loopback ports.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] if either socket cannot be bound.
    pub async fn bind() -> io::Result<Self> {
        let loopback: SocketAddr = ([127, 0, 0, 1], 0).into();
        let receiver = Arc::new(UdpSocket::bind(loopback).await?);
        let sink = UdpSink::bind(loopback, receiver.local_addr()?).await?;
        Ok(Self { receiver, sink })
    }
}
