// Sliding-window flood detection state.
//
// One `RateWindow` per (guild, author) pair, held in a `SpamStateTable`.
// This is the only long-lived mutable state in the crate, so both pieces
// are careful about memory: windows prune themselves on every record, the
// ring is capped at the threshold, and idle partitions can be swept.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Ring of recent message timestamps for one author in one guild.
#[derive(Debug, Default)]
pub struct RateWindow {
    hits: VecDeque<DateTime<Utc>>,
}

impl RateWindow {
    /// Record a message at `now` and return how many messages remain inside
    /// the window.
    ///
    /// The window boundary is exclusive: a hit exactly at `now - window` has
    /// expired and is not counted. The ring never holds more than `cap`
    /// entries; counting past the flood threshold is pointless, so older
    /// hits beyond the cap are dropped from the front.
    pub fn record(&mut self, now: DateTime<Utc>, window: Duration, cap: usize) -> usize {
        self.hits.push_back(now);

        let cutoff = now - window;
        while self.hits.front().map_or(false, |t| *t <= cutoff) {
            self.hits.pop_front();
        }
        while self.hits.len() > cap {
            self.hits.pop_front();
        }

        self.hits.len()
    }

    /// Whether this window holds no hit newer than `now - window`.
    pub fn is_idle(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.hits.back().map_or(true, |t| *t <= now - window)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.hits.len()
    }
}

/// Partitioned spam state for all guilds and authors.
///
/// Each partition is keyed by (guild_id, author_id); the `DashMap` entry
/// guard makes the record + prune + count of one partition a single atomic
/// unit, so two concurrent messages from the same author cannot both read a
/// stale count.
#[derive(Debug, Default)]
pub struct SpamStateTable {
    windows: DashMap<(u64, u64), RateWindow>,
}

impl SpamStateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message and return the in-window count for the author.
    /// The partition is created lazily on the author's first message.
    pub fn record(
        &self,
        guild_id: u64,
        author_id: u64,
        now: DateTime<Utc>,
        window_secs: u64,
        spam_max: u32,
    ) -> usize {
        let window = Duration::seconds(window_secs as i64);
        // The threshold check is `count > spam_max`, so spam_max + 1 entries
        // is all the ring ever needs to retain.
        let cap = spam_max as usize + 1;

        let mut entry = self.windows.entry((guild_id, author_id)).or_default();
        entry.record(now, window, cap)
    }

    /// Drop an author's window entirely. Called after punishing a flood so
    /// the backlog does not re-trigger on every subsequent message.
    pub fn reset(&self, guild_id: u64, author_id: u64) {
        self.windows.remove(&(guild_id, author_id));
    }

    /// Remove every partition with no hit in the last `window_secs` seconds.
    /// Returns how many partitions were reclaimed. Intended to be run as a
    /// periodic low-priority sweep with a generous window multiple.
    pub fn purge_idle(&self, now: DateTime<Utc>, window_secs: u64) -> usize {
        let window = Duration::seconds(window_secs as i64);
        // Counted inside the predicate: the table keeps taking inserts from
        // event processing while the sweep runs, so a before/after length
        // difference is not a removal count.
        let removed = AtomicUsize::new(0);
        self.windows.retain(|_, w| {
            if w.is_idle(now, window) {
                removed.fetch_add(1, Ordering::Relaxed);
                false
            } else {
                true
            }
        });
        removed.into_inner()
    }

    /// Number of live (guild, author) partitions.
    pub fn partitions(&self) -> usize {
        self.windows.len()
    }
}
