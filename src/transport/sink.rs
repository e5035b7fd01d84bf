//! Destinations for encoded frames.
//!
//! The chunking core never touches sockets; it hands each encoded frame to a
//! [`DatagramSink`] supplied by the caller.

use std::{io, net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::{net::UdpSocket, sync::mpsc};

/// Transport-send function for encoded frames.
#[async_trait]
pub trait DatagramSink: Send + Sync {
    /// Transmit one datagram.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] when the datagram cannot be handed to the
    /// transport.
    async fn send_datagram(&self, datagram: Bytes) -> io::Result<()>;
}

/// Sends datagrams to a fixed peer over a shared UDP socket.
#[derive(Clone, Debug)]
pub struct UdpSink {
    socket: Arc<UdpSocket>,
    target: SocketAddr,
}

impl UdpSink {
    /// Wrap an existing socket.
    #[must_use]
    pub fn new(socket: Arc<UdpSocket>, target: SocketAddr) -> Self { Self { socket, target } }

    /// Bind a fresh socket at `local` that sends to `target`.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] if the socket cannot be bound.
    pub async fn bind(local: SocketAddr, target: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(local).await?;
        Ok(Self::new(Arc::new(socket), target))
    }

    /// Address the socket is bound to.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] if the socket address cannot be read.
    pub fn local_addr(&self) -> io::Result<SocketAddr> { self.socket.local_addr() }

    /// Peer receiving the datagrams.
    #[must_use]
    pub const fn target(&self) -> SocketAddr { self.target }
}

#[async_trait]
impl DatagramSink for UdpSink {
    async fn send_datagram(&self, datagram: Bytes) -> io::Result<()> {
        let sent = self.socket.send_to(&datagram, self.target).await?;
        if sent != datagram.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("sent {sent} of {} datagram bytes", datagram.len()),
            ));
        }
        Ok(())
    }
}

/// Queues datagrams on an in-process channel.
///
/// Useful for relaying frames to another task and for tests that inspect
/// the exact bytes a sender produced.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Bytes>,
}

impl ChannelSink {
    /// Create a sink and the receiver that observes its datagrams.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Bytes>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl DatagramSink for ChannelSink {
    async fn send_datagram(&self, datagram: Bytes) -> io::Result<()> {
        self.tx
            .send(datagram)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "datagram channel closed"))
    }
}
