//! Typed payloads carried through the chunking layer.
//!
//! Frames treat payloads as opaque bytes. [`Message`] lets callers send and
//! receive bincode-encoded values instead. Integers inside the payload are
//! written big-endian, matching the frame header, and a reassembled payload
//! must hold exactly one message. JSON payloads go through `serde_json` via
//! [`ChunkSender::send_json`](crate::transport::ChunkSender::send_json) and
//! [`ReassembledMessage::json`](crate::chunk::ReassembledMessage::json).

use bincode::{
    BorrowDecode,
    Encode,
    borrow_decode_from_slice,
    config::{self, Config},
    encode_to_vec,
    error::{DecodeError, EncodeError},
};
use bytes::Bytes;

/// Application value that travels as a chunked payload.
///
/// Implemented for every type deriving [`Encode`] and [`BorrowDecode`].
///
/// # Examples
///
/// ```
/// use bincode::{BorrowDecode, Encode};
/// use chunkwire::message::Message;
///
/// #[derive(Debug, PartialEq, Encode, BorrowDecode)]
/// struct Reading {
///     sensor: u16,
///     value: i32,
/// }
///
/// let payload = Reading { sensor: 3, value: -40 }.encode_payload().expect("encode");
/// let decoded = Reading::decode_payload(&payload).expect("decode");
/// assert_eq!(decoded, Reading { sensor: 3, value: -40 });
/// ```
pub trait Message: Encode + for<'de> BorrowDecode<'de, ()> {
    /// Encode the value as a payload ready for splitting.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] if serialization fails.
    fn encode_payload(&self) -> Result<Bytes, EncodeError> {
        encode_to_vec(self, payload_config()).map(Bytes::from)
    }

    /// Decode a complete payload.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if deserialization fails or bytes remain
    /// after the value.
    fn decode_payload(payload: &[u8]) -> Result<Self, DecodeError> {
        let (message, consumed) = borrow_decode_from_slice(payload, payload_config())?;
        if consumed != payload.len() {
            return Err(DecodeError::Other("trailing bytes after message"));
        }
        Ok(message)
    }
}

impl<T> Message for T where for<'de> T: Encode + BorrowDecode<'de, ()> {}

fn payload_config() -> impl Config { config::standard().with_big_endian() }

#[cfg(test)]
mod tests {
    use bincode::{BorrowDecode, Encode, error::DecodeError};

    use super::Message;

    #[derive(Debug, PartialEq, Encode, BorrowDecode)]
    struct Sample {
        id: u32,
        label: String,
    }

    #[test]
    fn payload_round_trips() {
        let sample = Sample {
            id: 7,
            label: "pump".into(),
        };
        let payload = sample.encode_payload().expect("encode");
        assert_eq!(Sample::decode_payload(&payload).expect("decode"), sample);
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut payload = Sample {
            id: 1,
            label: String::new(),
        }
        .encode_payload()
        .expect("encode")
        .to_vec();
        payload.push(0);
        assert!(matches!(
            Sample::decode_payload(&payload),
            Err(DecodeError::Other(_))
        ));
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let payload = Sample {
            id: 1,
            label: "long label".into(),
        }
        .encode_payload()
        .expect("encode");
        assert!(Sample::decode_payload(&payload[..payload.len() - 1]).is_err());
    }

    #[test]
    fn integers_are_big_endian() {
        let payload = u16::MAX.encode_payload().expect("encode");
        let small = 0x0102_u16.encode_payload().expect("encode");
        // varint marker for u16 followed by the value, high byte first
        assert_eq!(payload.len(), 3);
        assert_eq!(&small[1..], &[0x01, 0x02]);
    }
}
