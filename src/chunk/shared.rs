//! Reassembler shared between several decoding workers.
//!
//! A single receive path can own a [`Reassembler`] outright. When decoding
//! is spread across tasks or threads, every lookup-append-delete sequence on
//! the per-message map has to happen as one critical section;
//! [`SharedReassembler`] holds the map behind a mutex and exposes the same
//! operations, each taking the lock once.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Instant,
};

use super::{
    Frame,
    MessageId,
    Progress,
    ReassemblyConfig,
    ReassemblyError,
    ReassemblyOutcome,
    Reassembler,
};

/// Cloneable handle to a mutex-guarded [`Reassembler`].
#[derive(Clone, Debug, Default)]
pub struct SharedReassembler {
    inner: Arc<Mutex<Reassembler>>,
}

impl SharedReassembler {
    /// Create a shared reassembler bounded by `config`.
    #[must_use]
    pub fn new(config: ReassemblyConfig) -> Self { Self::from(Reassembler::new(config)) }

    // A panic while the lock was held cannot leave the map half-updated:
    // every mutation is a single map operation.
    fn lock(&self) -> MutexGuard<'_, Reassembler> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// See [`Reassembler::accept`].
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError`] under the same conditions as
    /// [`Reassembler::accept`].
    pub fn accept(&self, frame: Frame) -> Result<ReassemblyOutcome, ReassemblyError> {
        self.lock().accept(frame)
    }

    /// See [`Reassembler::accept_at`].
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError`] under the same conditions as
    /// [`Reassembler::accept_at`].
    pub fn accept_at(
        &self,
        frame: Frame,
        now: Instant,
    ) -> Result<ReassemblyOutcome, ReassemblyError> {
        self.lock().accept_at(frame, now)
    }

    /// See [`Reassembler::progress`].
    #[must_use]
    pub fn progress(&self, message_id: MessageId) -> Progress { self.lock().progress(message_id) }

    /// See [`Reassembler::discard`].
    pub fn discard(&self, message_id: MessageId) -> bool { self.lock().discard(message_id) }

    /// See [`Reassembler::discard_all`].
    pub fn discard_all(&self) -> usize { self.lock().discard_all() }

    /// See [`Reassembler::purge_expired`].
    pub fn purge_expired(&self) -> Vec<MessageId> { self.lock().purge_expired() }

    /// See [`Reassembler::purge_expired_at`].
    pub fn purge_expired_at(&self, now: Instant) -> Vec<MessageId> {
        self.lock().purge_expired_at(now)
    }

    /// See [`Reassembler::buffered_len`].
    #[must_use]
    pub fn buffered_len(&self) -> usize { self.lock().buffered_len() }
}

impl From<Reassembler> for SharedReassembler {
    fn from(value: Reassembler) -> Self {
        Self {
            inner: Arc::new(Mutex::new(value)),
        }
    }
}
