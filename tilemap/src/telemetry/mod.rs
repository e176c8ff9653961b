//! Fetch telemetry.
//!
//! Workers record events on a shared [`FetchStats`] using lock-free atomic
//! counters; the consumer reads a point-in-time [`FetchStatsSnapshot`].
//!
//! ```text
//! Workers ─────► FetchStats ─────► FetchStatsSnapshot ─────► logs, CLI
//!               (atomic counters)  (plain copy)
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Lock-free counters for the tile fetcher.
///
/// All operations use `Relaxed` ordering; the counters are independent
/// measurements.
#[derive(Debug)]
pub struct FetchStats {
    start_time: Instant,
    requests_enqueued: AtomicU64,
    attempts: AtomicU64,
    retries: AtomicU64,
    tiles_ready: AtomicU64,
    tiles_failed: AtomicU64,
    bytes_downloaded: AtomicU64,
}

impl FetchStats {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            requests_enqueued: AtomicU64::new(0),
            attempts: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            tiles_ready: AtomicU64::new(0),
            tiles_failed: AtomicU64::new(0),
            bytes_downloaded: AtomicU64::new(0),
        }
    }

    /// Record a request entering the fetch queue.
    pub fn request_enqueued(&self) {
        self.requests_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one HTTP attempt. `retry` is true for every attempt after the
    /// first for the same request.
    pub fn attempt_started(&self, retry: bool) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        if retry {
            self.retries.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a tile downloaded and decoded.
    pub fn tile_ready(&self, bytes: usize) {
        self.tiles_ready.fetch_add(1, Ordering::Relaxed);
        self.bytes_downloaded
            .fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Record a tile that exhausted its attempts.
    pub fn tile_failed(&self) {
        self.tiles_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of all counters.
    pub fn snapshot(&self) -> FetchStatsSnapshot {
        FetchStatsSnapshot {
            uptime: self.start_time.elapsed(),
            requests_enqueued: self.requests_enqueued.load(Ordering::Relaxed),
            attempts: self.attempts.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            tiles_ready: self.tiles_ready.load(Ordering::Relaxed),
            tiles_failed: self.tiles_failed.load(Ordering::Relaxed),
            bytes_downloaded: self.bytes_downloaded.load(Ordering::Relaxed),
        }
    }
}

impl Default for FetchStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`FetchStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStatsSnapshot {
    pub uptime: Duration,
    pub requests_enqueued: u64,
    pub attempts: u64,
    pub retries: u64,
    pub tiles_ready: u64,
    pub tiles_failed: u64,
    pub bytes_downloaded: u64,
}

impl FetchStatsSnapshot {
    /// Requests that have neither succeeded nor failed yet.
    pub fn in_flight(&self) -> u64 {
        self.requests_enqueued
            .saturating_sub(self.tiles_ready + self.tiles_failed)
    }
}

impl fmt::Display for FetchStatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} requested, {} ready, {} failed, {} attempts ({} retries), {} bytes in {:.1}s",
            self.requests_enqueued,
            self.tiles_ready,
            self.tiles_failed,
            self.attempts,
            self.retries,
            self.bytes_downloaded,
            self.uptime.as_secs_f64()
        )
    }
}
