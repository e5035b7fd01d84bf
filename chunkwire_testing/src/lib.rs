//! Test utilities for `chunkwire`.
//!
//! Helpers here build frames with a fixed provenance, shuffle datagrams,
//! bind loopback socket pairs, and capture logs and metrics without tests
//! trampling each other's global state.
//!
//! ```rust
//! use chunkwire_testing::{encoded_frames, patterned_payload, reorder};
//!
//! let datagrams = encoded_frames(&patterned_payload(2500), 1024, 7);
//! let shuffled = reorder(&datagrams, &[2, 0, 1]);
//! assert_eq!(shuffled.len(), 3);
//! ```

pub mod helpers;
pub mod logging;
pub mod metrics;

pub use helpers::{
    LoopbackPair,
    TEST_PORT,
    TEST_SOURCE,
    encoded_frames,
    patterned_payload,
    reorder,
    split_frames,
    test_provenance,
};
pub use logging::{LoggerHandle, logger};
pub use metrics::{counter_value, debugging_recorder_setup};
