//! Host-side admission control
//!
//! One request in flight at a time. Requests arriving while the worker is
//! busy or still starting are dropped, never queued, so pointer-driven
//! request storms degrade to skipped updates.

use std::time::{Duration, Instant};

use shared::{ShapeName, WorkerRequest, WorkerResponse};
use tracing::{debug, trace, warn};

use super::handle::WorkerHandle;

/// Outcome of submitting a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    /// Another request is in flight
    Busy,
    /// No `startupCallback` yet, or the worker is gone
    NotReady,
}

pub struct Dispatcher {
    worker: WorkerHandle,
    ready: bool,
    in_flight: Option<ShapeName>,
}

impl Dispatcher {
    pub fn new(worker: WorkerHandle) -> Self {
        Self {
            worker,
            ready: false,
            in_flight: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Name of the request awaiting its response
    pub fn in_flight(&self) -> Option<&str> {
        self.in_flight.as_deref()
    }

    fn admission(&self) -> Admission {
        if !self.ready {
            Admission::NotReady
        } else if self.in_flight.is_some() {
            Admission::Busy
        } else {
            Admission::Accepted
        }
    }

    fn submit(&mut self, request: WorkerRequest) -> Admission {
        let name = request.name().to_string();
        if !self.worker.send(request) {
            self.ready = false;
            return Admission::NotReady;
        }
        self.in_flight = Some(name);
        Admission::Accepted
    }

    /// Sends `request` if the worker is ready and idle
    pub fn execute(&mut self, request: WorkerRequest) -> Admission {
        match self.admission() {
            Admission::Accepted => self.submit(request),
            rejected => {
                debug!("dropping '{}': worker {:?}", request.name(), rejected);
                rejected
            }
        }
    }

    /// Fire-and-forget variant for low-priority queries: silently does
    /// nothing unless the worker is idle.
    pub fn execute_if_idle(&mut self, request: WorkerRequest) -> bool {
        if self.admission() != Admission::Accepted {
            trace!("skipping '{}' while worker is not idle", request.name());
            return false;
        }
        self.submit(request) == Admission::Accepted
    }

    /// Folds one response into the admission state. Returns it unless it
    /// answers something other than the in-flight request.
    fn accept(&mut self, response: WorkerResponse) -> Option<WorkerResponse> {
        match &response {
            WorkerResponse::StartupCallback => {
                self.ready = true;
            }
            WorkerResponse::Execute(execute) => {
                if self.in_flight.as_deref() != Some(execute.name.as_str()) {
                    debug!(
                        "ignoring response for '{}' (in flight: {:?})",
                        execute.name, self.in_flight
                    );
                    return None;
                }
                self.in_flight = None;
            }
            WorkerResponse::Error(message) => {
                warn!("worker error: {}", message);
            }
        }
        Some(response)
    }

    /// Responses that have already arrived
    pub fn poll(&mut self) -> Vec<WorkerResponse> {
        let mut out = Vec::new();
        while let Some(response) = self.worker.try_recv() {
            out.extend(self.accept(response));
        }
        out
    }

    /// Blocks until the worker is ready and idle, or `timeout` elapses
    pub fn wait(&mut self, timeout: Duration) -> Vec<WorkerResponse> {
        let deadline = Instant::now() + timeout;
        let mut out = self.poll();
        while !self.ready || self.in_flight.is_some() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            match self.worker.recv_timeout(deadline - now) {
                Some(response) => out.extend(self.accept(response)),
                None => break,
            }
        }
        out
    }
}
