//! Tests for the binary frame codec.

use bytes::Bytes;
use proptest::prelude::*;
use rstest::rstest;

use super::{PORT, SOURCE, frames_for, patterned};
use crate::{
    byte_order::WireInt,
    checksum::crc32,
    chunk::{
        AddressFamily,
        ChunkIndex,
        ConfigurationError,
        DecodeError,
        Frame,
        FrameError,
        MessageId,
        Provenance,
        decode_frame,
        decode_frame_bytes,
        encode_frame,
        frame_overhead,
        is_chunk_frame,
        max_payload_per_frame,
        metadata_len,
    },
};

/// Offset of the ip version byte.
const VERSION_OFFSET: usize = 18;

fn network<T: WireInt>(value: T) -> Vec<u8> {
    let mut buf = Vec::new();
    value.put(&mut buf);
    buf
}

fn frame(payload: &[u8], address: &str) -> Frame {
    let len = u32::try_from(payload.len()).expect("small payload");
    Frame::new(
        MessageId::new(0x0102_0304_0506_0708),
        ChunkIndex::zero(),
        1,
        len,
        Provenance::parse(address, PORT).expect("valid address"),
        payload.to_vec(),
    )
    .expect("valid frame")
}

#[test]
fn metadata_lengths_match_layout() {
    assert_eq!(metadata_len(AddressFamily::V4), 33);
    assert_eq!(metadata_len(AddressFamily::V6), 45);
    assert_eq!(frame_overhead(AddressFamily::V4), 41);
    assert_eq!(frame_overhead(AddressFamily::V6), 53);
}

#[rstest]
#[case(1024, AddressFamily::V4, 983)]
#[case(1024, AddressFamily::V6, 971)]
#[case(42, AddressFamily::V4, 1)]
#[case(54, AddressFamily::V6, 1)]
fn max_payload_subtracts_overhead(
    #[case] budget: u32,
    #[case] family: AddressFamily,
    #[case] expected: usize,
) {
    let max = max_payload_per_frame(budget, family).expect("usable budget");
    assert_eq!(max.get(), expected);
}

#[rstest]
#[case(41, AddressFamily::V4)]
#[case(10, AddressFamily::V4)]
#[case(53, AddressFamily::V6)]
#[case(0, AddressFamily::V6)]
fn budget_without_payload_room_is_rejected(#[case] budget: u32, #[case] family: AddressFamily) {
    let err = max_payload_per_frame(budget, family).expect_err("budget too small");
    assert_eq!(
        err,
        ConfigurationError::BudgetTooSmall {
            budget,
            overhead: frame_overhead(family),
        }
    );
}

#[test]
fn encodes_ipv4_layout_big_endian() {
    let bytes = encode_frame(&frame(b"hi", "192.168.1.100")).expect("encode");
    let checksum = network(i64::from(crc32(b"hi")));
    let mut expected = vec![0xCA, 0xFE, 1, 2, 3, 4, 5, 6, 7, 8];
    expected.extend_from_slice(&[0, 0, 0, 2]);
    expected.extend_from_slice(&[0, 0, 0, 2]);
    expected.extend_from_slice(&[4, 192, 168, 1, 100]);
    expected.extend_from_slice(&network(PORT));
    expected.extend_from_slice(&[0, 0, 0, 0]);
    expected.extend_from_slice(&[0, 0, 0, 1]);
    expected.extend_from_slice(&checksum);
    expected.extend_from_slice(b"hi");
    assert_eq!(bytes.as_ref(), expected.as_slice());
}

#[rstest]
#[case("192.168.1.100", 33)]
#[case("2001:db8::1", 45)]
fn round_trips_both_families(#[case] address: &str, #[case] metadata: usize) {
    let original = frame(b"payload bytes", address);
    let bytes = encode_frame(&original).expect("encode");
    assert_eq!(bytes.len(), metadata + 8 + 13);
    assert_eq!(bytes[VERSION_OFFSET], original.provenance().address().family().version());

    let decoded = decode_frame(&bytes).expect("decode");
    assert_eq!(decoded, original);
    assert_eq!(decoded.provenance().address().to_string(), address);
}

#[test]
fn zero_copy_decode_matches_copying_decode() {
    let bytes = encode_frame(&frame(b"abc", SOURCE)).expect("encode");
    let copied = decode_frame(&bytes).expect("decode");
    let sliced = decode_frame_bytes(bytes).expect("decode");
    assert_eq!(copied, sliced);
}

#[test]
fn empty_payload_round_trips() {
    let original = frame(b"", SOURCE);
    let bytes = encode_frame(&original).expect("encode");
    assert_eq!(bytes.len(), 41);
    assert_eq!(decode_frame(&bytes).expect("decode"), original);
}

#[test]
fn trailing_bytes_are_ignored() {
    let original = frame(b"abc", SOURCE);
    let mut bytes = encode_frame(&original).expect("encode").to_vec();
    bytes.extend_from_slice(b"garbage");
    assert_eq!(decode_frame(&bytes).expect("decode"), original);
}

#[rstest]
#[case(&[][..], None)]
#[case(&[0xCA][..], None)]
#[case(&[0xFE, 0xCA, 0, 0][..], Some(0xFECA))]
#[case(&br#"{"type":"HEARTBEAT_MESSAGES"}"#[..], Some(0x7B22))]
fn rejects_missing_magic(#[case] bytes: &[u8], #[case] found: Option<u16>) {
    assert!(!is_chunk_frame(bytes));
    assert_eq!(decode_frame(bytes), Err(DecodeError::InvalidMagic { found }));
}

#[test]
fn every_truncation_is_reported() {
    let bytes = encode_frame(&frame(b"0123456789", SOURCE)).expect("encode");
    for len in 2..bytes.len() {
        let err = decode_frame(&bytes[..len]).expect_err("truncated frame");
        assert!(
            matches!(err, DecodeError::Truncated { available, .. } if available == len),
            "length {len} produced {err:?}"
        );
    }
}

#[test]
fn unsupported_ip_version_is_rejected() {
    let mut bytes = encode_frame(&frame(b"abc", SOURCE)).expect("encode").to_vec();
    bytes[VERSION_OFFSET] = 5;
    assert_eq!(decode_frame(&bytes), Err(DecodeError::UnsupportedIpVersion(5)));
}

#[rstest]
#[case(10, "total payload length")]
#[case(14, "payload length")]
#[case(25, "chunk index")]
#[case(29, "total chunks")]
fn negative_fields_are_rejected(#[case] offset: usize, #[case] field: &str) {
    let mut bytes = encode_frame(&frame(b"abc", SOURCE)).expect("encode").to_vec();
    bytes[offset..offset + 4].copy_from_slice(&network(-1_i32));
    let err = decode_frame(&bytes).expect_err("negative field");
    assert!(
        matches!(err, DecodeError::InvalidField { field: f, value: -1 } if f == field),
        "unexpected error {err:?}"
    );
}

#[test]
fn inconsistent_header_is_rejected() {
    let mut bytes = encode_frame(&frame(b"abc", SOURCE)).expect("encode").to_vec();
    // chunk index 1 of 1
    bytes[25..29].copy_from_slice(&network(1_i32));
    assert_eq!(
        decode_frame(&bytes),
        Err(DecodeError::InvalidFrame(FrameError::IndexOutOfRange {
            index: ChunkIndex::new(1),
            total: 1,
        }))
    );
}

#[test]
fn checksum_field_is_widened_crc() {
    let bytes = encode_frame(&frame(b"123456789", SOURCE)).expect("encode");
    assert_eq!(i64::read(&bytes[33..41]), Some(0xCBF4_3926));
}

#[test]
fn split_frames_fit_budget_and_decode() {
    for encoded in frames_for(&patterned(2500), 1024, 9)
        .iter()
        .map(|frame| encode_frame(frame).expect("encode"))
    {
        assert!(encoded.len() <= 1024);
        decode_frame(&encoded).expect("decode");
    }
}

proptest! {
    #[test]
    fn any_single_bit_flip_in_payload_is_detected(
        payload in proptest::collection::vec(any::<u8>(), 1..256),
        seed in any::<usize>(),
        bit in 0_u8..8,
    ) {
        let bytes = encode_frame(&frame(&payload, SOURCE)).expect("encode");
        let mut corrupted = bytes.to_vec();
        let position = 41 + seed % payload.len();
        corrupted[position] ^= 1 << bit;
        let err = decode_frame(&corrupted).expect_err("corruption detected");
        let is_checksum_mismatch = matches!(err, DecodeError::ChecksumMismatch { .. });
        prop_assert!(is_checksum_mismatch);
    }

    #[test]
    fn any_change_to_magic_is_detected(first in any::<u8>(), second in any::<u8>()) {
        prop_assume!([first, second] != [0xCA, 0xFE]);
        let mut bytes = encode_frame(&frame(b"abc", SOURCE)).expect("encode").to_vec();
        bytes[0] = first;
        bytes[1] = second;
        prop_assert_eq!(
            decode_frame(&bytes),
            Err(DecodeError::InvalidMagic { found: u16::read(&[first, second]) })
        );
    }

    #[test]
    fn decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..128)) {
        let _ = decode_frame(&bytes);
        let _ = decode_frame_bytes(Bytes::from(bytes));
    }
}
