use std::{
    net::SocketAddr,
    time::{Duration, Instant},
};

use bytes::Bytes;
use log::{debug, warn};
use tokio::{
    net::UdpSocket,
    sync::mpsc,
    time::{MissedTickBehavior, interval, sleep},
};
use tokio_util::sync::CancellationToken;

use super::TransportError;
use crate::{
    chunk::{
        MessageId,
        ReassembledMessage,
        Reassembler,
        ReassemblyConfig,
        ReassemblyOutcome,
        decode_frame_bytes,
        is_chunk_frame,
    },
    metrics::{self, Direction},
};

/// Largest datagram a UDP socket can hand over.
pub const MAX_DATAGRAM_LEN: usize = 65_535;

/// Pause after a failed socket receive before polling again.
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// A payload ready for the application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// A message reassembled from chunk frames.
    Message {
        /// The reassembled payload and its provenance.
        message: ReassembledMessage,
        /// Transport peer that delivered the final chunk.
        peer: SocketAddr,
    },
    /// A datagram without the frame magic, passed through untouched.
    Legacy {
        /// Raw datagram contents.
        payload: Bytes,
        /// Transport peer that sent the datagram.
        peer: SocketAddr,
    },
}

impl Delivery {
    /// Payload bytes of either delivery kind.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        match self {
            Self::Message { message, .. } => message.payload(),
            Self::Legacy { payload, .. } => payload,
        }
    }

    /// Transport peer the datagram came from.
    #[must_use]
    pub const fn peer(&self) -> SocketAddr {
        match self {
            Self::Message { peer, .. } | Self::Legacy { peer, .. } => *peer,
        }
    }
}

/// Turns received datagrams into deliveries.
///
/// Datagrams starting with the frame magic are decoded and reassembled.
/// Anything else is handed on as [`Delivery::Legacy`]. Datagrams that fail
/// to decode and messages whose frames disagree are logged and dropped;
/// they never stop the receive loop.
#[derive(Debug, Default)]
pub struct DatagramReceiver {
    reassembler: Reassembler,
}

impl DatagramReceiver {
    /// Create a receiver bounded by `config`.
    #[must_use]
    pub fn new(config: ReassemblyConfig) -> Self {
        Self {
            reassembler: Reassembler::new(config),
        }
    }

    /// Borrow the reassembly state.
    #[must_use]
    pub const fn reassembler(&self) -> &Reassembler { &self.reassembler }

    /// Mutably borrow the reassembly state, e.g. to discard a message.
    pub fn reassembler_mut(&mut self) -> &mut Reassembler { &mut self.reassembler }

    /// Process one datagram using the current time.
    pub fn handle_datagram(&mut self, datagram: Bytes, peer: SocketAddr) -> Option<Delivery> {
        self.handle_datagram_at(datagram, peer, Instant::now())
    }

    /// Process one datagram using an explicit clock reading.
    ///
    /// Messages that outlived the timeout at `now` are evicted and reported
    /// before the datagram is considered.
    pub fn handle_datagram_at(
        &mut self,
        datagram: Bytes,
        peer: SocketAddr,
        now: Instant,
    ) -> Option<Delivery> {
        if !is_chunk_frame(&datagram) {
            debug!("passing through {} byte datagram from {peer}", datagram.len());
            return Some(Delivery::Legacy {
                payload: datagram,
                peer,
            });
        }

        let frame = match decode_frame_bytes(datagram) {
            Ok(frame) => frame,
            Err(err) => {
                warn!("dropping datagram from {peer}: {err}");
                metrics::inc_decode_errors(err.kind());
                return None;
            }
        };
        metrics::inc_frames(Direction::Inbound);

        self.purge_expired_at(now);
        let outcome = self.reassembler.accept_at(frame, now);
        metrics::set_buffered(self.reassembler.buffered_len());
        match outcome {
            Ok(ReassemblyOutcome::Complete(message)) => {
                metrics::inc_messages_reassembled();
                Some(Delivery::Message { message, peer })
            }
            Ok(ReassemblyOutcome::Pending) => None,
            Err(err) => {
                warn!("dropping message {} from {peer}: {err}", err.message_id());
                metrics::inc_reassembly_errors();
                None
            }
        }
    }

    /// Evict messages that outlived the timeout.
    pub fn purge_expired(&mut self) -> Vec<MessageId> { self.purge_expired_at(Instant::now()) }

    /// Evict messages that outlived the timeout, using an explicit clock
    /// reading.
    pub fn purge_expired_at(&mut self, now: Instant) -> Vec<MessageId> {
        let evicted = self.reassembler.purge_expired_at(now);
        if !evicted.is_empty() {
            warn!("evicted {} incomplete message(s): {evicted:?}", evicted.len());
            metrics::add_evictions(evicted.len());
            metrics::set_buffered(self.reassembler.buffered_len());
        }
        evicted
    }

    /// Receive datagrams from `socket` until `shutdown` fires.
    ///
    /// Completed messages and pass-through datagrams are forwarded on
    /// `deliveries`. Expired messages are swept every
    /// [`purge_interval`](ReassemblyConfig::purge_interval) even when no
    /// traffic arrives.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::DeliveryClosed`] when the consumer drops its
    /// end of `deliveries`. Socket receive errors are logged and retried after
    /// a short pause. Cancellation is honoured while waiting for a slow
    /// consumer to make room on `deliveries`.
    pub async fn run(
        mut self,
        socket: &UdpSocket,
        deliveries: mpsc::Sender<Delivery>,
        shutdown: CancellationToken,
    ) -> Result<(), TransportError> {
        if let Ok(local_addr) = socket.local_addr() {
            tracing::info!(%local_addr, "receiver started");
        }
        let mut buf = vec![0_u8; MAX_DATAGRAM_LEN];
        let mut sweep = interval(self.reassembler.config().purge_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut recv_failures = 0_u64;

        loop {
            tokio::select! {
                biased;

                () = shutdown.cancelled() => break,

                _ = sweep.tick() => {
                    self.purge_expired();
                }

                received = socket.recv_from(&mut buf) => {
                    let (len, peer) = match received {
                        Ok(received) => {
                            if recv_failures > 0 {
                                debug!("datagram receive recovered after {recv_failures} failure(s)");
                                recv_failures = 0;
                            }
                            received
                        }
                        Err(err) => {
                            if recv_failures == 0 {
                                warn!("datagram receive failed: {err}");
                            } else {
                                debug!("datagram receive failed again: {err}");
                            }
                            recv_failures += 1;
                            let stopped = tokio::select! {
                                biased;
                                () = shutdown.cancelled() => true,
                                () = sleep(RECV_ERROR_BACKOFF) => false,
                            };
                            if stopped {
                                break;
                            }
                            continue;
                        }
                    };
                    let datagram = Bytes::copy_from_slice(buf.get(..len).unwrap_or_default());
                    let Some(delivery) = self.handle_datagram(datagram, peer) else {
                        continue;
                    };
                    let sent = tokio::select! {
                        biased;
                        () = shutdown.cancelled() => None,
                        sent = deliveries.send(delivery) => Some(sent),
                    };
                    match sent {
                        None => break,
                        Some(Err(_)) => return Err(TransportError::DeliveryClosed),
                        Some(Ok(())) => {}
                    }
                }
            }
        }

        let abandoned = self.reassembler.discard_all();
        tracing::info!(abandoned, "receiver stopped");
        metrics::set_buffered(0);
        Ok(())
    }
}
