//! Periodic liveness datagrams.
//!
//! A heartbeat is a small JSON document,
//! `{"type":"HEARTBEAT_MESSAGES","timestamp":<unix millis>}`, sent through the
//! chunking layer like any other payload.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use super::{ChunkSender, DatagramSink, TransportError};

/// Liveness announcement carried as JSON.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "HEARTBEAT_MESSAGES")]
pub struct Heartbeat {
    timestamp: u64,
}

impl Heartbeat {
    /// Heartbeat stamped with an explicit Unix time in milliseconds.
    #[must_use]
    pub const fn at(timestamp: u64) -> Self { Self { timestamp } }

    /// Heartbeat stamped with the current time.
    #[must_use]
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or_default();
        Self::at(millis)
    }

    /// Unix time in milliseconds when the heartbeat was created.
    #[must_use]
    pub const fn timestamp(&self) -> u64 { self.timestamp }

    /// Parse a heartbeat from a payload, returning `None` for anything else.
    #[must_use]
    pub fn parse(payload: &[u8]) -> Option<Self> { serde_json::from_slice(payload).ok() }
}

/// Send a heartbeat every `period` until `shutdown` fires or `limit`
/// heartbeats have gone out.
///
/// The first heartbeat is sent immediately. Returns the number sent.
///
/// # Errors
///
/// Returns the first [`TransportError`] raised while sending.
pub async fn heartbeat_loop<S: DatagramSink>(
    sender: &ChunkSender<S>,
    period: Duration,
    limit: Option<u64>,
    shutdown: CancellationToken,
) -> Result<u64, TransportError> {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut sent = 0_u64;

    while limit.is_none_or(|limit| sent < limit) {
        tokio::select! {
            biased;

            () = shutdown.cancelled() => break,

            _ = ticker.tick() => {
                let heartbeat = Heartbeat::now();
                let message_id = sender.send_json(&heartbeat).await?;
                tracing::debug!(%message_id, timestamp = heartbeat.timestamp(), "sent heartbeat");
                sent += 1;
            }
        }
    }
    Ok(sent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heartbeat_serialises_with_type_tag() {
        let json = serde_json::to_string(&Heartbeat::at(1_700_000_000_000)).expect("serialise");
        assert_eq!(json, r#"{"type":"HEARTBEAT_MESSAGES","timestamp":1700000000000}"#);
    }

    #[test]
    fn parse_rejects_other_documents() {
        assert_eq!(
            Heartbeat::parse(br#"{"type":"HEARTBEAT_MESSAGES","timestamp":5}"#),
            Some(Heartbeat::at(5))
        );
        assert_eq!(Heartbeat::parse(br#"{"type":"OTHER","timestamp":5}"#), None);
        assert_eq!(Heartbeat::parse(b"not json"), None);
    }
}
