//! Background tile fetcher.
//!
//! A fixed pool of worker threads downloads missing tiles without blocking
//! the consumer that owns the [`TileCache`].
//!
//! # Architecture
//!
//! ```text
//!  consumer thread                         worker threads (W)
//! ┌────────────────┐   FetchRequest   ┌──────────────────────┐
//! │ enqueue()      │ ───► FIFO ─────► │ GET ► classify ► disk│
//! │                │                  │ retry up to R times  │
//! │ drain()        │ ◄── channel ◄─── │ FetchCompletion      │
//! └───────┬────────┘                  └──────────────────────┘
//!         ▼
//!    TileCache (promote / mark_failed)
//! ```
//!
//! Workers never touch the cache. Completions are immutable records that the
//! consumer applies in [`TileFetcher::drain`], so all cache mutation happens
//! on one thread.
//!
//! # Example
//!
//! ```ignore
//! let mut fetcher = TileFetcher::start_with_reqwest(&FetcherConfig::default(), disk)?;
//! if cache.get(&key).needs_fetch {
//!     let request = FetchRequest::resolve(key, &registry, &selector).unwrap();
//!     fetcher.enqueue(&mut cache, request);
//! }
//! // later, on the consumer's tick
//! let report = fetcher.drain(&mut cache);
//! ```

mod error;
pub(crate) mod http;
mod policy;
mod queue;
mod request;
mod worker;

pub use error::FetchError;
pub use http::{HttpClient, HttpResponse, ReqwestClient, DEFAULT_TIMEOUT_SECS};
pub use policy::{classify, RetryPolicy, DEFAULT_MAX_ATTEMPTS};
pub use queue::{FetchQueue, QueuedRequest};
pub use request::{FetchCompletion, FetchOutcome, FetchRequest};

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::cache::{DiskLayout, TileCache};
use crate::layer::{FetchLimits, DEFAULT_CONNECTIONS_PER_WORKER, DEFAULT_WORKERS};
use crate::telemetry::{FetchStats, FetchStatsSnapshot};
use worker::Worker;

/// Fetcher settings.
#[derive(Debug, Clone, PartialEq)]
pub struct FetcherConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Idle connections each worker's client keeps per host.
    pub connections_per_worker: usize,
    /// Attempts per tile.
    pub retry: RetryPolicy,
    /// Timeout of a single HTTP request.
    pub timeout: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            connections_per_worker: DEFAULT_CONNECTIONS_PER_WORKER,
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl FetcherConfig {
    /// Settings taking concurrency from a layer's limits.
    pub fn from_limits(limits: FetchLimits) -> Self {
        Self {
            workers: limits.workers,
            connections_per_worker: limits.connections_per_worker,
            ..Self::default()
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_connections_per_worker(mut self, connections: usize) -> Self {
        self.connections_per_worker = connections;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// State changes applied by one [`TileFetcher::drain`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Tiles that became `Ready`.
    pub ready: usize,
    /// Tiles that became `Failed`.
    pub failed: usize,
}

impl DrainReport {
    /// Whether any tile changed state, i.e. a redraw is due.
    pub fn changed(&self) -> bool {
        self.ready + self.failed > 0
    }
}

/// Pool of fetch workers plus the consumer's end of the completion channel.
pub struct TileFetcher {
    queue: Arc<FetchQueue>,
    completions: UnboundedReceiver<FetchCompletion>,
    handles: Vec<JoinHandle<()>>,
    stats: Arc<FetchStats>,
    shutdown: CancellationToken,
    outstanding: usize,
}

impl TileFetcher {
    /// Spawns the worker pool.
    ///
    /// # Arguments
    ///
    /// * `config` - Pool size and retry policy
    /// * `disk` - Where fetched tiles are persisted
    /// * `make_client` - Builds the HTTP client of worker `i`
    ///
    /// # Returns
    ///
    /// The running fetcher, or the first client construction or thread
    /// spawn error. Workers already started are stopped again on error.
    pub fn start<C, F>(
        config: &FetcherConfig,
        disk: Arc<DiskLayout>,
        mut make_client: F,
    ) -> Result<Self, FetchError>
    where
        C: HttpClient + 'static,
        F: FnMut(usize) -> Result<C, FetchError>,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        let workers = config.workers.max(1);

        let mut fetcher = Self {
            queue: Arc::new(FetchQueue::new()),
            completions: receiver,
            handles: Vec::with_capacity(workers),
            stats: Arc::new(FetchStats::new()),
            shutdown: CancellationToken::new(),
            outstanding: 0,
        };

        for id in 0..workers {
            let worker = Worker {
                id,
                client: make_client(id)?,
                queue: Arc::clone(&fetcher.queue),
                completions: sender.clone(),
                disk: Arc::clone(&disk),
                retry: config.retry,
                stats: Arc::clone(&fetcher.stats),
                shutdown: fetcher.shutdown.clone(),
            };
            let handle = std::thread::Builder::new()
                .name(format!("tile-fetch-{}", id))
                .spawn(move || worker.run())?;
            fetcher.handles.push(handle);
        }

        info!(
            workers,
            connections_per_worker = config.connections_per_worker,
            max_attempts = config.retry.max_attempts(),
            "Tile fetcher started"
        );
        Ok(fetcher)
    }

    /// Spawns the worker pool with one [`ReqwestClient`] per worker.
    pub fn start_with_reqwest(
        config: &FetcherConfig,
        disk: Arc<DiskLayout>,
    ) -> Result<Self, FetchError> {
        let connections = config.connections_per_worker;
        let timeout = config.timeout;
        Self::start(config, disk, |_| ReqwestClient::new(connections, timeout))
    }

    /// Submits a tile for download. Never blocks on the network.
    ///
    /// The tile is marked `Loading`; the caller keeps showing the
    /// placeholder. Returns `false` without queueing anything when the tile
    /// is not `Pending` in `cache` or the fetcher has shut down.
    pub fn enqueue(&mut self, cache: &mut TileCache, request: FetchRequest) -> bool {
        if self.queue.is_closed() {
            debug!(tile = %request.key, "Fetcher is shut down, request dropped");
            return false;
        }
        if !cache.mark_loading(&request.key) {
            trace!(tile = %request.key, "Tile not pending, request dropped");
            return false;
        }

        trace!(tile = %request.key, url = %request.url, "Queueing fetch");
        if !self.queue.push(request) {
            return false;
        }
        self.outstanding += 1;
        self.stats.request_enqueued();
        true
    }

    /// Applies every available completion to `cache`.
    ///
    /// Must be called from the thread that owns the cache. Never blocks.
    pub fn drain(&mut self, cache: &mut TileCache) -> DrainReport {
        let mut report = DrainReport::default();

        while let Ok(completion) = self.completions.try_recv() {
            self.outstanding = self.outstanding.saturating_sub(1);
            trace!(tile = %completion.key, attempts = completion.outcome.attempts(), "Applying completion");
            let FetchCompletion { key, outcome } = completion;
            match outcome {
                FetchOutcome::Ready { image, attempts } => {
                    if cache.promote_after(&key, image, attempts) {
                        report.ready += 1;
                    }
                }
                FetchOutcome::Failed { .. } => {
                    if cache.mark_failed(&key) {
                        report.failed += 1;
                    }
                }
            }
        }

        if report.changed() {
            debug!(
                ready = report.ready,
                failed = report.failed,
                outstanding = self.outstanding,
                "Applied fetch completions"
            );
        }
        report
    }

    /// Requests enqueued whose completion has not been drained yet.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Requests still waiting for a worker.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn stats(&self) -> FetchStatsSnapshot {
        self.stats.snapshot()
    }

    /// Whether [`shutdown`](Self::shutdown) has run.
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Stops the pool and waits for the workers to exit.
    ///
    /// Queued requests are abandoned and pending retries are skipped; a
    /// request already on the wire finishes first. Completions sent before
    /// the workers exited can still be drained. Idempotent.
    pub fn shutdown(&mut self) {
        if self.shutdown.is_cancelled() && self.handles.is_empty() {
            return;
        }

        self.shutdown.cancel();
        let abandoned = self.queue.close();
        self.outstanding = self.outstanding.saturating_sub(abandoned);

        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                warn!("Fetch worker panicked");
            }
        }

        info!(abandoned, stats = %self.stats.snapshot(), "Tile fetcher stopped");
    }
}

impl Drop for TileFetcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}
