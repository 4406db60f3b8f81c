//! Worker thread handle
//!
//! Sends requests to the worker, receives its responses and joins the thread
//! on drop.

use std::sync::mpsc::{Receiver, RecvTimeoutError, SyncSender, TryRecvError, TrySendError};
use std::thread::JoinHandle;
use std::time::Duration;

use shared::{WorkerRequest, WorkerResponse};
use tracing::{debug, warn};

/// Handle to the worker thread
///
/// Returned from `WorkerThread::spawn()`.
pub struct WorkerHandle {
    /// Requests to the worker (Option to allow explicit drop before join)
    pub(super) tx: Option<SyncSender<WorkerRequest>>,

    /// Responses from the worker
    pub(super) rx: Receiver<WorkerResponse>,

    pub(super) handle: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Queue a request without blocking. Returns false if it was dropped.
    pub fn send(&self, request: WorkerRequest) -> bool {
        let Some(ref tx) = self.tx else {
            warn!("worker sender already dropped");
            return false;
        };
        match tx.try_send(request) {
            Ok(()) => true,
            Err(TrySendError::Full(request)) => {
                debug!("worker queue full, dropping '{}'", request.name());
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("worker thread disconnected");
                false
            }
        }
    }

    /// Next response if one is waiting
    pub fn try_recv(&self) -> Option<WorkerResponse> {
        match self.rx.try_recv() {
            Ok(response) => Some(response),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                debug!("worker response channel closed");
                None
            }
        }
    }

    /// Next response, waiting up to `timeout`
    pub fn recv_timeout(&self, timeout: Duration) -> Option<WorkerResponse> {
        match self.rx.recv_timeout(timeout) {
            Ok(response) => Some(response),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                debug!("worker response channel closed");
                None
            }
        }
    }

    /// Check if the worker thread is still running
    pub fn is_alive(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        // Drop the sender first so the worker's recv() returns and the loop
        // exits; joining before that would deadlock.
        drop(self.tx.take());

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("worker thread panicked during shutdown");
            }
        }
    }
}
