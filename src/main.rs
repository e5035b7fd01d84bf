//! `chunkwire` command line tool.
//!
//! Sends payloads as chunked datagrams, listens for and reassembles them, or
//! emits periodic heartbeats.

mod cli;

use std::{error::Error, fs, num::NonZeroUsize, time::Duration};

use chunkwire::{
    chunk::{ChunkingConfig, Provenance, ReassemblyConfig, Splitter},
    transport::{ChunkSender, DatagramReceiver, Delivery, Heartbeat, UdpSink, heartbeat_loop},
};
use clap::Parser;
use cli::{Cli, Command, HeartbeatArgs, ListenArgs, OutboundArgs, SendArgs};
use log::{info, warn};
use tokio::{net::UdpSocket, sync::mpsc};
use tokio_util::sync::CancellationToken;

type BoxError = Box<dyn Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt::init();

    match Cli::parse().command {
        Command::Send(args) => send(args).await,
        Command::Listen(args) => listen(args).await,
        Command::Heartbeat(args) => heartbeat(args).await,
    }
}

async fn connect(outbound: &OutboundArgs) -> Result<ChunkSender<UdpSink>, BoxError> {
    let sink = UdpSink::bind(outbound.bind, outbound.target).await?;
    let provenance = Provenance::from(sink.local_addr()?);
    let splitter = Splitter::new(outbound.budget, provenance)?;
    info!(
        "sending from {provenance} to {} with {} byte frames",
        outbound.target, outbound.budget
    );
    Ok(ChunkSender::new(splitter, sink))
}

async fn send(args: SendArgs) -> Result<(), BoxError> {
    let payload = match (args.message, args.file) {
        (Some(message), _) => message.into_bytes(),
        (None, Some(path)) => fs::read(path)?,
        (None, None) => return Err("either --message or --file is required".into()),
    };
    let sender = connect(&args.outbound).await?;
    let len = payload.len();
    let message_id = sender.send(payload).await?;
    info!("sent message {message_id} ({len} bytes)");
    Ok(())
}

async fn listen(args: ListenArgs) -> Result<(), BoxError> {
    let max_message_size =
        NonZeroUsize::new(args.max_message_size).ok_or("--max-message-size must be non-zero")?;
    let config = ReassemblyConfig::default()
        .with_timeout(Duration::from_secs(args.timeout_secs))
        .with_max_message_size(max_message_size);

    let socket = UdpSocket::bind(args.bind).await?;
    info!("listening on {}", socket.local_addr()?);

    let (tx, mut rx) = mpsc::channel(64);
    let printer = tokio::spawn(async move {
        while let Some(delivery) = rx.recv().await {
            print_delivery(&delivery);
        }
    });

    DatagramReceiver::new(config)
        .run(&socket, tx, cancel_on_ctrl_c())
        .await?;
    printer.await?;
    Ok(())
}

async fn heartbeat(args: HeartbeatArgs) -> Result<(), BoxError> {
    let outbound = OutboundArgs {
        target: args.target,
        bind: args.bind,
        budget: ChunkingConfig::DEFAULT_CHUNK_BUDGET,
    };
    let sender = connect(&outbound).await?;
    let period = Duration::from_millis(args.interval_ms.max(1));
    let sent = heartbeat_loop(&sender, period, args.count, cancel_on_ctrl_c()).await?;
    info!("sent {sent} heartbeat(s)");
    Ok(())
}

fn print_delivery(delivery: &Delivery) {
    match delivery {
        Delivery::Message { message, peer } => {
            if let Some(heartbeat) = Heartbeat::parse(message.payload()) {
                println!(
                    "{} heartbeat at {} (via {peer})",
                    message.provenance(),
                    heartbeat.timestamp()
                );
            } else {
                println!(
                    "{} message {} ({} bytes, via {peer}): {}",
                    message.provenance(),
                    message.message_id(),
                    message.payload().len(),
                    String::from_utf8_lossy(message.payload())
                );
            }
        }
        Delivery::Legacy { payload, peer } => {
            println!(
                "{peer} unframed datagram ({} bytes): {}",
                payload.len(),
                String::from_utf8_lossy(payload)
            );
        }
    }
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {err}");
            return;
        }
        info!("shutting down");
        trigger.cancel();
    });
    token
}
