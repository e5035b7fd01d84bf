//! Zero-based chunk positioning within logical messages.

use std::num::TryFromIntError;

use derive_more::{Display, From};

/// Zero-based ordinal describing a chunk's position within its message.
///
/// The wire field is a signed 32-bit integer, so valid indices stop at
/// `i32::MAX`; [`ChunkIndex::to_wire`] reports `None` beyond that.
///
/// # Examples
///
/// ```
/// use chunkwire::chunk::ChunkIndex;
/// let index = ChunkIndex::new(2);
/// assert_eq!(index.get(), 2);
/// assert_eq!(index.to_wire(), Some(2));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From)]
#[display("{_0}")]
pub struct ChunkIndex(u32);

impl ChunkIndex {
    /// Construct an index from a `u32` value.
    #[must_use]
    pub const fn new(value: u32) -> Self { Self(value) }

    /// Return the first chunk index.
    #[must_use]
    pub const fn zero() -> Self { Self(0) }

    /// Return the underlying numeric value.
    #[must_use]
    pub const fn get(self) -> u32 { self.0 }

    /// Convert to the signed on-wire representation.
    #[must_use]
    pub fn to_wire(self) -> Option<i32> { i32::try_from(self.0).ok() }

    /// Parse the signed on-wire representation, rejecting negative values.
    #[must_use]
    pub fn from_wire(value: i32) -> Option<Self> { u32::try_from(value).ok().map(Self) }
}

impl TryFrom<usize> for ChunkIndex {
    type Error = TryFromIntError;

    fn try_from(value: usize) -> Result<Self, Self::Error> { u32::try_from(value).map(Self) }
}

impl From<ChunkIndex> for u32 {
    fn from(value: ChunkIndex) -> Self { value.0 }
}

impl From<ChunkIndex> for usize {
    fn from(value: ChunkIndex) -> Self { value.0 as usize }
}
