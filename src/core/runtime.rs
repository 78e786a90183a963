//! Deferred work for the toplevel manager.
//!
//! Everything here runs on the compositor's single event-loop thread. The
//! compositor drives the queue by calling [`Manager::dispatch_idle`] once per
//! scheduler tick, after it has finished dispatching client requests and
//! running its own layout pass.
//!
//! [`Manager::dispatch_idle`]: crate::core::toplevel::Manager::dispatch_idle

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

// ============================================================================
// Idle Queue
// ============================================================================

/// A FIFO of keys waiting for the next idle tick.
///
/// Each key is queued at most once: scheduling a key that is already pending
/// is a no-op, which is what coalesces bursts of changes into one flush.
#[derive(Debug)]
pub struct IdleQueue<K> {
    order: VecDeque<K>,
    pending: HashSet<K>,
}

impl<K: Copy + Eq + Hash> IdleQueue<K> {
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
            pending: HashSet::new(),
        }
    }

    /// Queue `key` for the next tick.
    ///
    /// Returns `false` if it was already pending.
    pub fn schedule(&mut self, key: K) -> bool {
        if !self.pending.insert(key) {
            return false;
        }
        self.order.push_back(key);
        true
    }

    /// Drop `key` from the queue without running it.
    pub fn cancel(&mut self, key: K) -> bool {
        if !self.pending.remove(&key) {
            return false;
        }
        self.order.retain(|k| *k != key);
        true
    }

    /// Take every pending key in scheduling order.
    ///
    /// Keys scheduled while the caller processes the returned batch land in
    /// the next tick.
    pub fn take_all(&mut self) -> Vec<K> {
        self.pending.clear();
        self.order.drain(..).collect()
    }

    pub fn is_pending(&self, key: K) -> bool {
        self.pending.contains(&key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.pending.clear();
    }
}

impl<K: Copy + Eq + Hash> Default for IdleQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
