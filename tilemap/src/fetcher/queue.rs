//! Shared FIFO of fetch requests.
//!
//! The consumer pushes, every worker pops. Requests leave in the order they
//! were submitted. Closing the queue wakes all blocked workers; requests still
//! queued at that point are abandoned.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::request::FetchRequest;

// =============================================================================
// Queued Request
// =============================================================================

/// A request waiting for a worker.
#[derive(Debug)]
pub struct QueuedRequest {
    pub request: FetchRequest,

    /// When the request was enqueued (for wait time logging).
    pub enqueued_at: Instant,
}

impl QueuedRequest {
    fn new(request: FetchRequest) -> Self {
        Self {
            request,
            enqueued_at: Instant::now(),
        }
    }

    /// Returns how long this request has been waiting in the queue.
    pub fn wait_time(&self) -> Duration {
        self.enqueued_at.elapsed()
    }
}

// =============================================================================
// Fetch Queue
// =============================================================================

#[derive(Debug, Default)]
struct QueueState {
    items: VecDeque<QueuedRequest>,
    closed: bool,
}

/// Blocking multi-consumer FIFO.
#[derive(Debug, Default)]
pub struct FetchQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl FetchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a request and wakes one waiting worker.
    ///
    /// Returns `false` if the queue has been closed.
    pub fn push(&self, request: FetchRequest) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }
        state.items.push_back(QueuedRequest::new(request));
        drop(state);
        self.available.notify_one();
        true
    }

    /// Takes the oldest request, blocking while the queue is empty.
    ///
    /// Returns `None` once the queue is closed.
    pub fn pop(&self) -> Option<QueuedRequest> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }
            self.available.wait(&mut state);
        }
    }

    /// Closes the queue, dropping queued requests and waking every worker.
    ///
    /// Returns how many requests were abandoned.
    pub fn close(&self) -> usize {
        let mut state = self.state.lock();
        state.closed = true;
        let abandoned = state.items.len();
        state.items.clear();
        drop(state);
        self.available.notify_all();
        abandoned
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Number of requests waiting for a worker.
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
