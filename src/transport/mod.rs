//! UDP transport adapter for the chunking layer.
//!
//! The chunking core is pure: it turns payloads into frames and frames back
//! into payloads. This module wires it to sockets. [`ChunkSender`] pushes
//! encoded frames through a [`DatagramSink`], [`DatagramReceiver`] feeds
//! received datagrams into a reassembler and forwards completed messages,
//! and [`heartbeat_loop`] emits periodic liveness payloads.

mod error;
pub mod heartbeat;
mod receiver;
mod sender;
mod sink;

pub use error::TransportError;
pub use heartbeat::{Heartbeat, heartbeat_loop};
pub use receiver::{DatagramReceiver, Delivery, MAX_DATAGRAM_LEN};
pub use sender::ChunkSender;
pub use sink::{ChannelSink, DatagramSink, UdpSink};
