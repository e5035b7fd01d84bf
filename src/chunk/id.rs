use derive_more::{Display, From, Into};

/// Identifier grouping every chunk of one logical message.
///
/// The wire carries it as a signed 64-bit integer. Uniqueness across
/// concurrently in-flight messages is the sender's responsibility; the
/// [`Splitter`](crate::chunk::Splitter) hands out monotonically increasing
/// values seeded from the wall clock.
///
/// # Examples
///
/// ```
/// use chunkwire::chunk::MessageId;
/// let id = MessageId::new(1_735_689_600_000);
/// assert_eq!(id.get(), 1_735_689_600_000);
/// assert_eq!(id.to_string(), "1735689600000");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into)]
#[display("{_0}")]
pub struct MessageId(i64);

impl MessageId {
    /// Create a new identifier.
    #[must_use]
    pub const fn new(value: i64) -> Self { Self(value) }

    /// Return the inner numeric identifier.
    #[must_use]
    pub const fn get(self) -> i64 { self.0 }
}
