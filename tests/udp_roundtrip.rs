//! End-to-end tests sending chunked payloads over loopback UDP.

use std::time::Duration;

use chunkwire::{
    chunk::{MessageId, Provenance, ReassemblyConfig, Splitter},
    transport::{ChunkSender, DatagramReceiver, DatagramSink, Delivery, Heartbeat, heartbeat_loop},
};
use chunkwire_testing::{LoopbackPair, encoded_frames, patterned_payload, reorder};
use rstest::rstest;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

async fn next_delivery(rx: &mut mpsc::Receiver<Delivery>) -> Delivery {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("delivery within timeout")
        .expect("receiver still running")
}

fn spawn_receiver(
    pair: &LoopbackPair,
) -> (
    mpsc::Receiver<Delivery>,
    CancellationToken,
    tokio::task::JoinHandle<Result<(), chunkwire::TransportError>>,
) {
    let (tx, rx) = mpsc::channel(16);
    let shutdown = CancellationToken::new();
    let socket = pair.receiver.clone();
    let token = shutdown.clone();
    let handle = tokio::spawn(async move {
        DatagramReceiver::new(ReassemblyConfig::default())
            .run(&socket, tx, token)
            .await
    });
    (rx, shutdown, handle)
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(2500)]
#[case(40_000)]
#[tokio::test]
async fn payloads_survive_loopback(#[case] len: usize) {
    let pair = LoopbackPair::bind().await.expect("bind loopback pair");
    let (mut rx, shutdown, handle) = spawn_receiver(&pair);

    let origin = pair.sink.local_addr().expect("sender address");
    let splitter = Splitter::new(1024, Provenance::from(origin)).expect("splitter");
    let sender = ChunkSender::new(splitter, pair.sink.clone());
    let payload = patterned_payload(len);
    let message_id = sender.send(payload.clone()).await.expect("send");

    match next_delivery(&mut rx).await {
        Delivery::Message { message, .. } => {
            assert_eq!(message.message_id(), message_id);
            assert_eq!(message.payload(), payload.as_slice());
            assert_eq!(message.provenance().socket_addr(), origin);
        }
        Delivery::Legacy { .. } => panic!("expected a reassembled message"),
    }

    shutdown.cancel();
    handle.await.expect("join").expect("receiver result");
}

#[tokio::test]
async fn reordered_and_duplicated_datagrams_deliver_once() {
    let pair = LoopbackPair::bind().await.expect("bind loopback pair");
    let (mut rx, shutdown, handle) = spawn_receiver(&pair);

    let payload = patterned_payload(2500);
    let datagrams = encoded_frames(&payload, 1024, 77);
    for datagram in reorder(&datagrams, &[2, 2, 0, 1, 0]) {
        pair.sink.send_datagram(datagram).await.expect("send datagram");
    }
    pair.sink
        .send_datagram(bytes::Bytes::from_static(b"marker"))
        .await
        .expect("send marker");

    let Delivery::Message { message, .. } = next_delivery(&mut rx).await else {
        panic!("expected the reassembled message first");
    };
    assert_eq!(message.message_id(), MessageId::new(77));
    assert_eq!(message.payload(), payload.as_slice());
    assert_eq!(message.provenance().to_string(), "192.168.1.100:41234");

    // A redelivered chunk 0 after completion starts a new partial entry, so
    // the next delivery is the marker rather than a second copy.
    let Delivery::Legacy { payload, .. } = next_delivery(&mut rx).await else {
        panic!("expected the pass-through marker");
    };
    assert_eq!(payload.as_ref(), b"marker");

    shutdown.cancel();
    handle.await.expect("join").expect("receiver result");
}

#[tokio::test]
async fn heartbeats_reach_listener() {
    let pair = LoopbackPair::bind().await.expect("bind loopback pair");
    let (mut rx, shutdown, handle) = spawn_receiver(&pair);

    let origin = pair.sink.local_addr().expect("sender address");
    let splitter = Splitter::new(1024, Provenance::from(origin)).expect("splitter");
    let sender = ChunkSender::new(splitter, pair.sink.clone());
    let sent = heartbeat_loop(
        &sender,
        Duration::from_millis(10),
        Some(2),
        CancellationToken::new(),
    )
    .await
    .expect("heartbeats");
    assert_eq!(sent, 2);

    for _ in 0..2 {
        let delivery = next_delivery(&mut rx).await;
        assert!(Heartbeat::parse(delivery.payload()).is_some());
    }

    shutdown.cancel();
    handle.await.expect("join").expect("receiver result");
}
