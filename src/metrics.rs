//! Metric helpers for `chunkwire`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! the helpers compile to no-ops so call sites need no conditional code.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Name of the counter tracking frames sent or received.
pub const FRAMES_TOTAL: &str = "chunkwire_frames_total";
/// Name of the counter tracking datagrams rejected by the decoder.
pub const DECODE_ERRORS_TOTAL: &str = "chunkwire_decode_errors_total";
/// Name of the counter tracking messages dropped by the reassembler.
pub const REASSEMBLY_ERRORS_TOTAL: &str = "chunkwire_reassembly_errors_total";
/// Name of the counter tracking completed messages.
pub const MESSAGES_REASSEMBLED: &str = "chunkwire_messages_reassembled_total";
/// Name of the counter tracking stale messages evicted before completion.
pub const REASSEMBLY_EVICTIONS: &str = "chunkwire_reassembly_evictions_total";
/// Name of the gauge tracking partially received messages.
pub const REASSEMBLY_BUFFERED: &str = "chunkwire_reassembly_buffered";

/// Direction of frame processing.
#[derive(Clone, Copy, Debug)]
pub enum Direction {
    /// Frames decoded from received datagrams.
    Inbound,
    /// Frames encoded and handed to a sink.
    Outbound,
}

impl Direction {
    #[cfg_attr(not(feature = "metrics"), expect(dead_code, reason = "labels feed metrics only"))]
    fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Record a processed frame for the given direction.
pub fn inc_frames(direction: Direction) {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_TOTAL, "direction" => direction.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = direction;
}

/// Record a datagram rejected by the decoder, labelled by failure kind.
pub fn inc_decode_errors(kind: &'static str) {
    #[cfg(feature = "metrics")]
    counter!(DECODE_ERRORS_TOTAL, "kind" => kind).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = kind;
}

/// Record a message dropped because its frames were inconsistent.
pub fn inc_reassembly_errors() {
    #[cfg(feature = "metrics")]
    counter!(REASSEMBLY_ERRORS_TOTAL).increment(1);
}

/// Record a completed message.
pub fn inc_messages_reassembled() {
    #[cfg(feature = "metrics")]
    counter!(MESSAGES_REASSEMBLED).increment(1);
}

/// Record messages evicted by an expiry sweep.
pub fn add_evictions(count: usize) {
    #[cfg(feature = "metrics")]
    counter!(REASSEMBLY_EVICTIONS).increment(count as u64);
    #[cfg(not(feature = "metrics"))]
    let _ = count;
}

/// Publish the number of partially received messages.
#[cfg_attr(
    feature = "metrics",
    expect(clippy::cast_precision_loss, reason = "gauge values are approximate")
)]
pub fn set_buffered(count: usize) {
    #[cfg(feature = "metrics")]
    gauge!(REASSEMBLY_BUFFERED).set(count as f64);
    #[cfg(not(feature = "metrics"))]
    let _ = count;
}
