//! Command line interface for the `chunkwire` binary.
//!
//! The definitions are plain clap types so `build.rs` can include this file
//! to render the man page.

use std::{net::SocketAddr, path::PathBuf};

use clap::{Args, Parser, Subcommand};

/// Port the listener binds to unless told otherwise.
pub const DEFAULT_LISTEN_PORT: u16 = 41234;
/// Port heartbeats are sent to unless told otherwise.
pub const DEFAULT_HEARTBEAT_PORT: u16 = 41235;

/// Command line arguments for the `chunkwire` binary.
#[derive(Debug, Parser)]
#[command(
    name = "chunkwire",
    version,
    about = "Send and receive chunked UDP datagrams"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Split a payload into frames and send it.
    Send(SendArgs),
    /// Reassemble incoming frames and print each completed message.
    Listen(ListenArgs),
    /// Send periodic heartbeat messages.
    Heartbeat(HeartbeatArgs),
}

/// Options shared by commands that transmit.
#[derive(Debug, Args)]
pub struct OutboundArgs {
    /// Address to send datagrams to.
    #[arg(short, long)]
    pub target: SocketAddr,
    /// Local address to send from.
    #[arg(short, long, default_value = "0.0.0.0:0")]
    pub bind: SocketAddr,
    /// Largest encoded frame, in bytes.
    #[arg(long, default_value_t = 1024)]
    pub budget: u32,
}

#[derive(Debug, Args)]
pub struct SendArgs {
    #[command(flatten)]
    pub outbound: OutboundArgs,
    /// Text to send.
    #[arg(short, long, conflicts_with = "file", required_unless_present = "file")]
    pub message: Option<String>,
    /// File whose contents are sent.
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ListenArgs {
    /// Address to receive datagrams on.
    #[arg(short, long, default_value_t = SocketAddr::from(([0, 0, 0, 0], DEFAULT_LISTEN_PORT)))]
    pub bind: SocketAddr,
    /// Seconds an incomplete message is kept before eviction.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
    /// Largest message accepted for reassembly, in bytes.
    #[arg(long, default_value_t = 16 * 1024 * 1024)]
    pub max_message_size: usize,
}

#[derive(Debug, Args)]
pub struct HeartbeatArgs {
    /// Address to send datagrams to.
    #[arg(
        short,
        long,
        default_value_t = SocketAddr::from(([127, 0, 0, 1], DEFAULT_HEARTBEAT_PORT))
    )]
    pub target: SocketAddr,
    /// Local address to send from.
    #[arg(short, long, default_value = "0.0.0.0:0")]
    pub bind: SocketAddr,
    /// Milliseconds between heartbeats.
    #[arg(long, default_value_t = 1000)]
    pub interval_ms: u64,
    /// Stop after this many heartbeats.
    #[arg(long)]
    pub count: Option<u64>,
}
