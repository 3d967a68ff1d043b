// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded, TTL-based read cache for decrypted thread message pages.
//!
//! Entries are keyed by `(thread id, page size)` so different pagination
//! requests never alias. Expiry is checked lazily under a read lock; the
//! write path purges expired entries first and, if still over capacity,
//! evicts the single globally-oldest entry by insertion instant. Any write
//! to a thread must be followed by [`MessageCache::invalidate_thread`] so
//! readers never observe stale pages.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use tracing::debug;

use relaio_core::types::{MessageView, ThreadId};

#[derive(Debug)]
struct Entry {
    messages: Vec<MessageView>,
    inserted_at: Instant,
}

/// Thread-keyed message page cache with TTL and capacity bounds.
///
/// One coarse `RwLock` domain: reads are concurrent, writes (including
/// invalidation) are exclusive. Correctness -- never serving an entry
/// after its invalidation -- takes precedence over fine-grained
/// throughput here.
pub struct MessageCache {
    entries: RwLock<HashMap<(ThreadId, usize), Entry>>,
    capacity: usize,
    ttl: Duration,
}

impl MessageCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity,
            ttl,
        }
    }

    /// Fetch a cached page, treating expired entries as absent.
    ///
    /// Expired entries are not removed here (that would need a write
    /// lock); physical removal happens on the next `set`.
    pub fn get(&self, thread_id: &ThreadId, page_size: usize) -> Option<Vec<MessageView>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get(&(thread_id.clone(), page_size))?;
        if entry.inserted_at.elapsed() > self.ttl {
            return None;
        }
        Some(entry.messages.clone())
    }

    /// Insert a page, enforcing both bounds.
    ///
    /// At capacity the expired entries are purged first; if the map is
    /// still full, the globally-oldest entry is evicted.
    pub fn set(&self, thread_id: &ThreadId, page_size: usize, messages: Vec<MessageView>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());

        if entries.len() >= self.capacity {
            let ttl = self.ttl;
            entries.retain(|_, entry| entry.inserted_at.elapsed() <= ttl);
        }

        if entries.len() >= self.capacity
            && let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(key, _)| key.clone())
        {
            debug!(thread_id = %oldest.0, page_size = oldest.1, "evicting oldest cache entry");
            entries.remove(&oldest);
        }

        entries.insert(
            (thread_id.clone(), page_size),
            Entry {
                messages,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop every cached page of one thread, across all page sizes.
    pub fn invalidate_thread(&self, thread_id: &ThreadId) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.retain(|(tid, _), _| tid != thread_id);
    }

    /// Drop everything.
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }

    /// Number of live entries (expired ones included until purged).
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
