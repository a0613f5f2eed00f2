//! Expiring counter store backing the rate limiters.
//!
//! # Responsibilities
//! - Atomic increment-and-get with a per-key TTL
//! - Fixed windows: the TTL is set when a window opens and never refreshed
//!
//! # Design Decisions
//! - The pipeline depends only on the `CounterStore` trait, so the in-memory
//!   map can be swapped for a distributed store in a multi-instance
//!   deployment without touching the limiters.
//! - Increment and expiry check happen under one shard lock; two concurrent
//!   hits on the same key can never observe the same count.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;

/// Snapshot of a counter after an increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCount {
    /// Count including the increment that produced this snapshot.
    pub count: u64,

    /// Epoch seconds at which the window expires and the count resets.
    pub resets_at: u64,
}

/// Shared expiring key/value counter interface.
pub trait CounterStore: Send + Sync {
    /// Atomically increment `key` within its current window and return the
    /// new count. Opens a fresh window with `ttl` when the key is absent or
    /// its window has expired; an increment inside a live window must NOT
    /// extend the TTL.
    fn increment(&self, key: &str, ttl: Duration) -> WindowCount;
}

struct Entry {
    count: u64,
    expires_at: Instant,
    resets_at: u64,
}

impl Entry {
    fn open(now: Instant, ttl: Duration) -> Self {
        let resets_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
            + ttl.as_secs();
        Self {
            count: 0,
            expires_at: now + ttl,
            resets_at,
        }
    }
}

/// In-process counter store over a sharded concurrent map.
#[derive(Default)]
pub struct InMemoryCounterStore {
    entries: DashMap<String, Entry>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterStore for InMemoryCounterStore {
    fn increment(&self, key: &str, ttl: Duration) -> WindowCount {
        let now = Instant::now();
        // The entry guard holds the shard lock for the whole read-modify-write.
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::open(now, ttl));

        if entry.expires_at <= now {
            *entry = Entry::open(now, ttl);
        }
        entry.count += 1;

        WindowCount {
            count: entry.count,
            resets_at: entry.resets_at,
        }
    }
}
