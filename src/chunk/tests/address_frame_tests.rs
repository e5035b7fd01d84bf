//! Tests for provenance parsing and frame construction.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use bytes::Bytes;
use rstest::rstest;

use super::{PORT, SOURCE};
use crate::chunk::{
    AddressFamily,
    ChunkIndex,
    EncodingError,
    Frame,
    FrameError,
    MessageId,
    Provenance,
    SourceAddress,
};

#[rstest]
#[case("192.168.1.100", AddressFamily::V4)]
#[case(" 10.0.0.1 ", AddressFamily::V4)]
#[case("2001:db8::1", AddressFamily::V6)]
#[case("::1", AddressFamily::V6)]
fn parses_address_family(#[case] text: &str, #[case] family: AddressFamily) {
    let address: SourceAddress = text.parse().expect("valid literal");
    assert_eq!(address.family(), family);
}

#[rstest]
#[case("")]
#[case("localhost")]
#[case("256.1.1.1")]
#[case("192.168.1")]
#[case("2001:db8:::1")]
fn rejects_non_literal_addresses(#[case] text: &str) {
    let err = text.parse::<SourceAddress>().expect_err("invalid literal");
    assert!(matches!(err, EncodingError::InvalidAddress { address } if address == text));
}

#[test]
fn address_family_wire_properties() {
    assert_eq!(AddressFamily::V4.version(), 4);
    assert_eq!(AddressFamily::V6.version(), 6);
    assert_eq!(AddressFamily::V4.address_len(), 4);
    assert_eq!(AddressFamily::V6.address_len(), 16);
    assert_eq!(AddressFamily::from_version(6), Some(AddressFamily::V6));
    assert_eq!(AddressFamily::from_version(5), None);
}

#[test]
fn provenance_round_trips_socket_addr() {
    let provenance = Provenance::parse(SOURCE, PORT).expect("valid provenance");
    let socket: SocketAddr = provenance.socket_addr();
    assert_eq!(socket.to_string(), "192.168.1.100:41234");
    assert_eq!(Provenance::from(socket), provenance);
    assert_eq!(provenance.to_string(), "192.168.1.100:41234");

    let v6 = Provenance::new(SourceAddress::from(Ipv6Addr::LOCALHOST), 9);
    assert_eq!(v6.to_string(), "[::1]:9");
    assert_eq!(
        Provenance::new(SourceAddress::from(Ipv4Addr::LOCALHOST), 9).address().ip(),
        Ipv4Addr::LOCALHOST
    );
}

fn provenance() -> Provenance { Provenance::parse(SOURCE, PORT).expect("valid provenance") }

#[test]
fn frame_rejects_zero_chunks() {
    let err = Frame::new(MessageId::new(1), ChunkIndex::zero(), 0, 0, provenance(), Bytes::new())
        .expect_err("zero chunks");
    assert_eq!(err, FrameError::NoChunks);
}

#[rstest]
#[case(3, 3)]
#[case(4, 3)]
#[case(1, 1)]
fn frame_rejects_index_out_of_range(#[case] index: u32, #[case] total: u32) {
    let err = Frame::new(MessageId::new(1), ChunkIndex::new(index), total, 10, provenance(), Bytes::new())
        .expect_err("index out of range");
    assert_eq!(
        err,
        FrameError::IndexOutOfRange {
            index: ChunkIndex::new(index),
            total,
        }
    );
}

#[test]
fn frame_rejects_payload_longer_than_message() {
    let err = Frame::new(MessageId::new(1), ChunkIndex::zero(), 1, 2, provenance(), vec![0_u8; 3])
        .expect_err("payload exceeds total");
    assert_eq!(err, FrameError::PayloadExceedsTotal { len: 3, total: 2 });
}

#[test]
fn last_frame_is_detected_by_position() {
    let first = Frame::new(MessageId::new(1), ChunkIndex::zero(), 2, 4, provenance(), vec![1, 2])
        .expect("valid frame");
    let last = Frame::new(MessageId::new(1), ChunkIndex::new(1), 2, 4, provenance(), vec![3, 4])
        .expect("valid frame");
    assert!(!first.is_last());
    assert!(last.is_last());
    assert_eq!(last.into_payload().as_ref(), &[3, 4]);
}

#[test]
fn chunk_index_wire_conversion() {
    assert_eq!(ChunkIndex::from_wire(-1), None);
    assert_eq!(ChunkIndex::from_wire(7), Some(ChunkIndex::new(7)));
    assert_eq!(ChunkIndex::new(u32::MAX).to_wire(), None);
    assert_eq!(ChunkIndex::try_from(5_usize).map(u32::from), Ok(5));
}
