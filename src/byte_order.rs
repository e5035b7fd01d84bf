//! Network byte-order access to frame header fields.
//!
//! Every integer in a chunk frame header travels big-endian. [`WireInt`]
//! covers the three widths the header uses and [`FieldCursor`] walks an
//! encoded header, reporting truncation against the whole datagram. The
//! Clippy expectations stay scoped to the two conversion points.

use std::ops::Range;

use bytes::BufMut;

use crate::chunk::DecodeError;

/// Integer that appears in a frame header.
pub trait WireInt: Copy {
    /// Encoded width in bytes.
    const WIDTH: usize;

    /// Append the value to `buf` in network byte order.
    fn put<B: BufMut>(self, buf: &mut B);

    /// Read a value from the leading [`WIDTH`](Self::WIDTH) bytes of
    /// `bytes`, or `None` when fewer are available.
    fn read(bytes: &[u8]) -> Option<Self>;
}

macro_rules! wire_int {
    ($($ty:ty),+ $(,)?) => {$(
        impl WireInt for $ty {
            const WIDTH: usize = size_of::<$ty>();

            fn put<B: BufMut>(self, buf: &mut B) {
                #[expect(
                    clippy::big_endian_bytes,
                    reason = "Frame headers are encoded in network byte order."
                )]
                let encoded = self.to_be_bytes();
                buf.put_slice(&encoded);
            }

            fn read(bytes: &[u8]) -> Option<Self> {
                let encoded: [u8; size_of::<$ty>()] = bytes.get(..Self::WIDTH)?.try_into().ok()?;
                #[expect(
                    clippy::big_endian_bytes,
                    reason = "Frame headers are encoded in network byte order."
                )]
                let value = <$ty>::from_be_bytes(encoded);
                Some(value)
            }
        }
    )+};
}

wire_int!(u16, i32, i64);

/// Forward-only cursor over an encoded frame.
///
/// # Examples
///
/// ```
/// use chunkwire::byte_order::FieldCursor;
///
/// let mut cursor = FieldCursor::new(&[0xCA, 0xFE, 0x00, 0x2A], 0);
/// assert_eq!(cursor.field::<u16>(), Ok(0xCAFE));
/// assert_eq!(cursor.offset(), 2);
/// assert!(cursor.field::<i32>().is_err());
/// ```
#[derive(Debug)]
pub struct FieldCursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> FieldCursor<'a> {
    /// Start reading `bytes` at `offset`.
    #[must_use]
    pub const fn new(bytes: &'a [u8], offset: usize) -> Self { Self { bytes, offset } }

    /// Position of the next unread byte.
    #[must_use]
    pub const fn offset(&self) -> usize { self.offset }

    /// Claim the next `len` bytes, returning their range in the buffer.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] when the buffer ends first.
    pub fn skip(&mut self, len: usize) -> Result<Range<usize>, DecodeError> {
        let end = self.offset.saturating_add(len);
        if end > self.bytes.len() {
            return Err(DecodeError::Truncated {
                needed: end,
                available: self.bytes.len(),
            });
        }
        let range = self.offset..end;
        self.offset = end;
        Ok(range)
    }

    /// Read the next `N` raw octets, e.g. an address.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] when the buffer ends first.
    pub fn octets<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let range = self.skip(N)?;
        let mut out = [0_u8; N];
        out.copy_from_slice(self.bytes.get(range).unwrap_or_default());
        Ok(out)
    }

    /// Read the next big-endian integer field.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] when the buffer ends first.
    pub fn field<T: WireInt>(&mut self) -> Result<T, DecodeError> {
        let range = self.skip(T::WIDTH)?;
        let available = self.bytes.len();
        self.bytes
            .get(range)
            .and_then(T::read)
            .ok_or(DecodeError::Truncated {
                needed: self.offset,
                available,
            })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{FieldCursor, WireInt};
    use crate::chunk::DecodeError;

    fn encoded<T: WireInt>(value: T) -> Vec<u8> {
        let mut buf = Vec::new();
        value.put(&mut buf);
        buf
    }

    #[rstest]
    #[case(2500, [0x00, 0x00, 0x09, 0xC4])]
    #[case(-1, [0xFF; 4])]
    #[case(0x0102_0304, [1, 2, 3, 4])]
    fn i32_fields_are_big_endian(#[case] value: i32, #[case] wire: [u8; 4]) {
        assert_eq!(encoded(value), wire);
        assert_eq!(i32::read(&wire), Some(value));
    }

    #[rstest]
    #[case(0xCAFE)]
    #[case(41234)]
    #[case(u16::MAX)]
    fn port_and_magic_survive(#[case] value: u16) {
        assert_eq!(u16::read(&encoded(value)), Some(value));
    }

    #[rstest]
    #[case(1_735_689_600_000)]
    #[case(-42)]
    #[case(i64::MIN)]
    fn message_ids_survive(#[case] value: i64) {
        assert_eq!(i64::read(&encoded(value)), Some(value));
    }

    #[test]
    fn short_input_reads_nothing() {
        assert_eq!(i64::read(&[0; 7]), None);
        assert_eq!(u16::read(&[]), None);
    }

    #[test]
    fn read_ignores_trailing_bytes() {
        assert_eq!(u16::read(&[0xCA, 0xFE, 0x01]), Some(0xCAFE));
    }

    #[test]
    fn cursor_reads_fields_in_sequence() {
        let mut bytes = encoded(0xCAFE_u16);
        bytes.extend(encoded(7_i64));
        bytes.extend([192, 168, 1, 100]);

        let mut cursor = FieldCursor::new(&bytes, 0);
        assert_eq!(cursor.field::<u16>(), Ok(0xCAFE));
        assert_eq!(cursor.field::<i64>(), Ok(7));
        assert_eq!(cursor.octets::<4>(), Ok([192, 168, 1, 100]));
        assert_eq!(cursor.offset(), bytes.len());
    }

    #[test]
    fn truncation_reports_whole_buffer_need() {
        let bytes = [0_u8; 12];
        let mut cursor = FieldCursor::new(&bytes, 10);
        assert_eq!(
            cursor.field::<i32>(),
            Err(DecodeError::Truncated {
                needed: 14,
                available: 12,
            })
        );
        assert_eq!(cursor.offset(), 10);
    }
}
