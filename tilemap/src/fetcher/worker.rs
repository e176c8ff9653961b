//! Fetch worker loop.
//!
//! Each worker owns one HTTP client and runs on its own thread:
//!
//! ```text
//! loop {
//!     pop request (blocks) ─► GET ─► classify ─┬─ ok ──► store on disk ─► send Ready
//!                              ▲               └─ err ─► attempts left? ─┐
//!                              └──────────────────────── yes ◄───────────┘
//!                                                        no ──► send Failed
//! }
//! ```

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::error::FetchError;
use super::http::HttpClient;
use super::policy::{classify, RetryPolicy};
use super::queue::FetchQueue;
use super::request::{FetchCompletion, FetchOutcome, FetchRequest};
use crate::cache::DiskLayout;
use crate::telemetry::FetchStats;
use crate::tile::TileImage;

/// Everything one worker thread needs.
pub(super) struct Worker<C> {
    pub id: usize,
    pub client: C,
    pub queue: Arc<FetchQueue>,
    pub completions: UnboundedSender<FetchCompletion>,
    pub disk: Arc<DiskLayout>,
    pub retry: RetryPolicy,
    pub stats: Arc<FetchStats>,
    pub shutdown: CancellationToken,
}

impl<C: HttpClient> Worker<C> {
    /// Processes requests until the queue is closed or the consumer is gone.
    pub fn run(self) {
        debug!(worker = self.id, "Fetch worker started");

        while let Some(queued) = self.queue.pop() {
            trace!(
                worker = self.id,
                tile = %queued.request.key,
                wait_ms = queued.wait_time().as_millis() as u64,
                "Picked up fetch request"
            );

            let completion = self.fetch(queued.request);
            if self.completions.send(completion).is_err() {
                debug!(worker = self.id, "Completion receiver dropped");
                break;
            }
        }

        debug!(worker = self.id, "Fetch worker stopped");
    }

    /// Runs every attempt for one request and reports the outcome.
    fn fetch(&self, request: FetchRequest) -> FetchCompletion {
        let mut attempt = 0;

        let reason = loop {
            attempt += 1;
            self.stats.attempt_started(attempt > 1);

            let error = match self.attempt(&request) {
                Ok((image, bytes)) => {
                    self.stats.tile_ready(bytes);
                    debug!(tile = %request.key, attempt, bytes, "Tile fetched");
                    return FetchCompletion {
                        key: request.key,
                        outcome: FetchOutcome::Ready {
                            image,
                            attempts: attempt,
                        },
                    };
                }
                Err(e) => e,
            };
            debug!(tile = %request.key, attempt, error = %error, "Fetch attempt failed");

            if !self.retry.should_retry(attempt) {
                break error.to_string();
            }
            if self.shutdown.is_cancelled() {
                debug!(tile = %request.key, "Retry abandoned, fetcher shutting down");
                break error.to_string();
            }
        };

        self.stats.tile_failed();
        warn!(tile = %request.key, attempts = attempt, %reason, "Giving up on tile");

        FetchCompletion {
            key: request.key,
            outcome: FetchOutcome::Failed {
                attempts: attempt,
                reason,
            },
        }
    }

    /// One GET, classified; a good body is persisted before it is reported.
    fn attempt(&self, request: &FetchRequest) -> Result<(TileImage, usize), FetchError> {
        let response = self.client.get(&request.url)?;
        let image = classify(&request.url, &response)?;

        // The decoded image is still usable when the write fails.
        if let Err(e) = self.disk.store(&request.key, &response.body) {
            warn!(tile = %request.key, error = %e, "Failed to write tile to disk cache");
        }

        Ok((Arc::new(image), response.body.len()))
    }
}
