//! Configuration for splitting outbound payloads and reassembling inbound
//! ones.

use std::{num::NonZeroUsize, time::Duration};

use super::{AddressFamily, ConfigurationError, frame_overhead, max_payload_per_frame};

/// A chunk budget validated against the frame overhead of one address family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkingConfig {
    chunk_budget: u32,
    family: AddressFamily,
    max_payload_per_frame: NonZeroUsize,
}

impl ChunkingConfig {
    /// Budget used by the heartbeat sender and the CLI unless overridden.
    pub const DEFAULT_CHUNK_BUDGET: u32 = 1024;

    /// Validate `chunk_budget` for frames carrying `family` addresses.
    ///
    /// `chunk_budget` is the largest datagram the transport should emit. The
    /// returned configuration reports how many payload bytes fit alongside
    /// the fixed header and checksum.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::BudgetTooSmall`] when the budget cannot
    /// carry a single payload byte.
    ///
    /// # Examples
    ///
    /// ```
    /// use chunkwire::chunk::{AddressFamily, ChunkingConfig};
    ///
    /// let config = ChunkingConfig::for_chunk_budget(1024, AddressFamily::V4).expect("budget");
    /// assert_eq!(config.max_payload_per_frame().get(), 983);
    /// assert!(ChunkingConfig::for_chunk_budget(39, AddressFamily::V4).is_err());
    /// ```
    pub fn for_chunk_budget(
        chunk_budget: u32,
        family: AddressFamily,
    ) -> Result<Self, ConfigurationError> {
        let max_payload_per_frame = max_payload_per_frame(chunk_budget, family)?;
        Ok(Self {
            chunk_budget,
            family,
            max_payload_per_frame,
        })
    }

    /// Maximum encoded frame size.
    #[must_use]
    pub const fn chunk_budget(&self) -> u32 { self.chunk_budget }

    /// Address family the budget was validated for.
    #[must_use]
    pub const fn family(&self) -> AddressFamily { self.family }

    /// Payload bytes carried by each full frame.
    #[must_use]
    pub const fn max_payload_per_frame(&self) -> NonZeroUsize { self.max_payload_per_frame }

    /// Header and checksum bytes added to every frame.
    #[must_use]
    pub const fn overhead(&self) -> usize { frame_overhead(self.family) }
}

/// Settings that bound reassembly resource usage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReassemblyConfig {
    /// Hard cap on a message's declared total payload length.
    pub max_message_size: NonZeroUsize,
    /// Age after which an incomplete message is evicted.
    pub timeout: Duration,
    /// How often receive loops sweep for expired messages.
    pub purge_interval: Duration,
}

impl ReassemblyConfig {
    /// Default cap on reassembled payloads (16 MiB).
    pub const DEFAULT_MAX_MESSAGE_SIZE: NonZeroUsize = NonZeroUsize::new(16 * 1024 * 1024)
        .expect("default message size is non-zero");
    /// Default staleness threshold for incomplete messages.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    /// Default sweep period for receive loops.
    pub const DEFAULT_PURGE_INTERVAL: Duration = Duration::from_secs(5);

    /// Replace the message size cap.
    #[must_use]
    pub const fn with_max_message_size(mut self, max_message_size: NonZeroUsize) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    /// Replace the eviction timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the sweep period.
    #[must_use]
    pub const fn with_purge_interval(mut self, purge_interval: Duration) -> Self {
        self.purge_interval = purge_interval;
        self
    }
}

impl Default for ReassemblyConfig {
    fn default() -> Self {
        Self {
            max_message_size: Self::DEFAULT_MAX_MESSAGE_SIZE,
            timeout: Self::DEFAULT_TIMEOUT,
            purge_interval: Self::DEFAULT_PURGE_INTERVAL,
        }
    }
}
