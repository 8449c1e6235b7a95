//! Bounded trap buffer.

use crate::session::ReceivedTrap;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Default buffer capacity. Sized so a receiver can ride out several
/// minutes of a trap storm before dropping anything.
pub const DEFAULT_CAPACITY: usize = 524_288;

/// A bounded FIFO of received traps.
///
/// The listener task pushes, consumers drain. When full, new arrivals
/// are rejected rather than evicting older entries, so the oldest
/// traps (usually the start of an incident) survive a storm.
///
/// A plain mutex over a deque: both sides hold the lock only long
/// enough to move entries, and the consumer side must work from
/// synchronous code.
pub struct TrapBuffer {
    capacity: usize,
    queue: Mutex<VecDeque<ReceivedTrap>>,
}

impl TrapBuffer {
    /// Create a buffer with the given capacity. A capacity of zero
    /// rejects everything.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            // Arrival rate is unknown; grow on demand rather than
            // reserving half a megabyte of slots up front.
            queue: Mutex::new(VecDeque::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a trap. On a full buffer the trap is handed back to the
    /// caller, who owns the drop decision and its diagnostics.
    pub fn offer(&self, trap: ReceivedTrap) -> Result<(), ReceivedTrap> {
        let mut queue = self.lock();
        if queue.len() >= self.capacity {
            return Err(trap);
        }
        queue.push_back(trap);
        Ok(())
    }

    /// Remove and return everything currently buffered, oldest first.
    pub fn drain(&self) -> Vec<ReceivedTrap> {
        let mut queue = self.lock();
        queue.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<ReceivedTrap>> {
        // Neither side can panic while holding the lock; a poisoned
        // mutex here would mean a bug elsewhere, so keep going with
        // the data we have.
        match self.queue.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl std::fmt::Debug for TrapBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrapBuffer")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}
