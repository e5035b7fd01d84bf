//! Binary layout of a chunk frame.
//!
//! Every multi-byte field is big-endian:
//!
//! | Field | Size | Type |
//! |---|---|---|
//! | magic (`0xCAFE`) | 2 | `u16` |
//! | message id | 8 | `i64` |
//! | total payload length | 4 | `i32` |
//! | payload length | 4 | `i32` |
//! | ip version (`4`/`6`) | 1 | `u8` |
//! | address | 4 or 16 | octets |
//! | source port | 2 | `u16` |
//! | chunk index | 4 | `i32` |
//! | total chunks | 4 | `i32` |
//! | checksum (CRC-32 widened) | 8 | `i64` |
//! | payload | payload length | bytes |
//!
//! Buffers that do not open with the magic marker belong to some other
//! protocol and are rejected before any further parsing.

use std::{
    net::{Ipv4Addr, Ipv6Addr},
    num::NonZeroUsize,
    ops::Range,
};

use bytes::{BufMut, Bytes, BytesMut};

use super::{
    AddressFamily,
    ChunkIndex,
    ConfigurationError,
    DecodeError,
    EncodingError,
    Frame,
    MessageId,
    Provenance,
    SourceAddress,
};
use crate::{
    byte_order::{FieldCursor, WireInt},
    checksum::crc32,
};

/// Marker opening every frame.
pub const FRAME_MAGIC: u16 = 0xCAFE;

/// Width of the widened checksum field.
pub const CHECKSUM_LEN: usize = 8;

/// Header bytes before the checksum for the given address family.
///
/// `2 + 8 + 4 + 4 + 1 + address + 2 + 4 + 4`, i.e. 33 bytes for IPv4 and 45
/// for IPv6.
#[must_use]
pub const fn metadata_len(family: AddressFamily) -> usize {
    2 + 8 + 4 + 4 + 1 + family.address_len() + 2 + 4 + 4
}

/// Fixed bytes added to every payload: metadata plus checksum.
#[must_use]
pub const fn frame_overhead(family: AddressFamily) -> usize { metadata_len(family) + CHECKSUM_LEN }

/// Largest payload slice that keeps an encoded frame within `chunk_budget`.
///
/// # Errors
///
/// Returns [`ConfigurationError::BudgetTooSmall`] when the budget cannot hold
/// the overhead plus at least one payload byte.
pub fn max_payload_per_frame(
    chunk_budget: u32,
    family: AddressFamily,
) -> Result<NonZeroUsize, ConfigurationError> {
    let overhead = frame_overhead(family);
    (chunk_budget as usize)
        .checked_sub(overhead)
        .and_then(NonZeroUsize::new)
        .ok_or(ConfigurationError::BudgetTooSmall {
            budget: chunk_budget,
            overhead,
        })
}

/// Report whether `bytes` opens with the frame marker.
///
/// Hosts use this to route non-frame datagrams to a fallback handler.
#[must_use]
pub fn is_chunk_frame(bytes: &[u8]) -> bool { read_magic(bytes) == Some(FRAME_MAGIC) }

/// Encode `frame` into its wire representation.
///
/// # Errors
///
/// Returns [`EncodingError::FieldOverflow`] when a length or count does not
/// fit its signed 32-bit field.
///
/// # Examples
///
/// ```
/// use chunkwire::chunk::{ChunkIndex, Frame, MessageId, Provenance, decode_frame, encode_frame};
///
/// let frame = Frame::new(
///     MessageId::new(1),
///     ChunkIndex::zero(),
///     1,
///     5,
///     Provenance::parse("127.0.0.1", 41234).expect("address"),
///     &b"hello"[..],
/// )
/// .expect("frame");
/// let bytes = encode_frame(&frame).expect("encode");
/// assert_eq!(bytes.len(), 33 + 8 + 5);
/// assert_eq!(decode_frame(&bytes).expect("decode"), frame);
/// ```
pub fn encode_frame(frame: &Frame) -> Result<Bytes, EncodingError> {
    let payload = frame.payload();
    let total_payload_length = wire_i32(
        "total payload length",
        u64::from(frame.total_payload_length()),
    )?;
    let payload_len = wire_i32("payload length", payload.len() as u64)?;
    let chunk_index = frame
        .chunk_index()
        .to_wire()
        .ok_or(EncodingError::FieldOverflow {
            field: "chunk index",
            value: u64::from(frame.chunk_index().get()),
        })?;
    let total_chunks = wire_i32("total chunks", u64::from(frame.total_chunks()))?;
    let provenance = frame.provenance();
    let family = provenance.address().family();

    let mut buf = BytesMut::with_capacity(frame_overhead(family) + payload.len());
    FRAME_MAGIC.put(&mut buf);
    frame.message_id().get().put(&mut buf);
    total_payload_length.put(&mut buf);
    payload_len.put(&mut buf);
    buf.put_u8(family.version());
    match provenance.address() {
        SourceAddress::V4(addr) => buf.put_slice(&addr.octets()),
        SourceAddress::V6(addr) => buf.put_slice(&addr.octets()),
    }
    provenance.port().put(&mut buf);
    chunk_index.put(&mut buf);
    total_chunks.put(&mut buf);
    i64::from(crc32(payload)).put(&mut buf);
    buf.put_slice(payload);
    Ok(buf.freeze())
}

/// Decode a frame from a borrowed buffer, copying the payload.
///
/// Trailing bytes beyond the declared payload length are ignored.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidMagic`] when the marker is absent,
/// [`DecodeError::Truncated`] when the buffer is shorter than its header
/// implies, [`DecodeError::ChecksumMismatch`] when the payload is corrupt,
/// and [`DecodeError::UnsupportedIpVersion`], [`DecodeError::InvalidField`] or
/// [`DecodeError::InvalidFrame`] for malformed headers.
pub fn decode_frame(bytes: &[u8]) -> Result<Frame, DecodeError> {
    let (header, range) = parse(bytes)?;
    let payload = bytes.get(range).map(Bytes::copy_from_slice).unwrap_or_default();
    header.into_frame(payload)
}

/// Decode a frame from an owned buffer, slicing the payload without copying.
///
/// # Errors
///
/// Fails under the same conditions as [`decode_frame`].
pub fn decode_frame_bytes(bytes: Bytes) -> Result<Frame, DecodeError> {
    let (header, range) = parse(&bytes)?;
    let payload = bytes.slice(range);
    header.into_frame(payload)
}

fn wire_i32(field: &'static str, value: u64) -> Result<i32, EncodingError> {
    i32::try_from(value).map_err(|_| EncodingError::FieldOverflow { field, value })
}

fn read_magic(bytes: &[u8]) -> Option<u16> { u16::read(bytes) }

/// Header fields read before the payload.
struct Header {
    message_id: MessageId,
    total_payload_length: u32,
    provenance: Provenance,
    chunk_index: ChunkIndex,
    total_chunks: u32,
}

impl Header {
    fn into_frame(self, payload: Bytes) -> Result<Frame, DecodeError> {
        Frame::new(
            self.message_id,
            self.chunk_index,
            self.total_chunks,
            self.total_payload_length,
            self.provenance,
            payload,
        )
        .map_err(DecodeError::from)
    }
}

/// Validate the header and checksum, returning the payload byte range.
fn parse(bytes: &[u8]) -> Result<(Header, Range<usize>), DecodeError> {
    let magic = read_magic(bytes);
    if magic != Some(FRAME_MAGIC) {
        return Err(DecodeError::InvalidMagic { found: magic });
    }

    let mut reader = FieldCursor::new(bytes, 2);
    let message_id = MessageId::new(reader.field()?);
    let total_payload_length = non_negative("total payload length", reader.field()?)?;
    let payload_len = non_negative("payload length", reader.field()?)?;

    let [version] = reader.octets()?;
    let family =
        AddressFamily::from_version(version).ok_or(DecodeError::UnsupportedIpVersion(version))?;
    let address = match family {
        AddressFamily::V4 => SourceAddress::V4(Ipv4Addr::from(reader.octets::<4>()?)),
        AddressFamily::V6 => SourceAddress::V6(Ipv6Addr::from(reader.octets::<16>()?)),
    };
    let port: u16 = reader.field()?;

    let raw_index: i32 = reader.field()?;
    let chunk_index = ChunkIndex::from_wire(raw_index).ok_or(DecodeError::InvalidField {
        field: "chunk index",
        value: i64::from(raw_index),
    })?;
    let total_chunks = non_negative("total chunks", reader.field()?)?;
    let expected: i64 = reader.field()?;

    let range = reader.skip(payload_len as usize)?;
    let actual = crc32(bytes.get(range.clone()).unwrap_or_default());
    if i64::from(actual) != expected {
        return Err(DecodeError::ChecksumMismatch { expected, actual });
    }

    let header = Header {
        message_id,
        total_payload_length,
        provenance: Provenance::new(address, port),
        chunk_index,
        total_chunks,
    };
    Ok((header, range))
}

fn non_negative(field: &'static str, value: i32) -> Result<u32, DecodeError> {
    u32::try_from(value).map_err(|_| DecodeError::InvalidField {
        field,
        value: i64::from(value),
    })
}
