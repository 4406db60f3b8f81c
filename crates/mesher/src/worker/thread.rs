//! Worker thread implementation

use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use shared::{WorkerRequest, WorkerResponse};
use tracing::{debug, info};

use super::handle::WorkerHandle;
use crate::build::KernelSession;
use crate::kernel::Modeler;
use crate::settings::MesherSettings;

/// Requests that may wait in the queue; admission control keeps it at one
const REQUEST_CAPACITY: usize = 4;

/// Worker thread state
pub struct WorkerThread<K: Modeler> {
    rx: Receiver<WorkerRequest>,
    tx: Sender<WorkerResponse>,
    session: KernelSession<K>,
}

impl<K: Modeler + 'static> WorkerThread<K> {
    /// Spawn the worker thread
    ///
    /// `factory` runs on the worker thread, so the kernel itself need not be
    /// `Send`. The worker announces itself with `startupCallback` once the
    /// kernel is built.
    pub fn spawn<F>(factory: F, settings: MesherSettings) -> io::Result<WorkerHandle>
    where
        F: FnOnce() -> K + Send + 'static,
    {
        let (request_tx, request_rx) = mpsc::sync_channel::<WorkerRequest>(REQUEST_CAPACITY);
        let (response_tx, response_rx) = mpsc::channel::<WorkerResponse>();

        let handle = thread::Builder::new().name("kernel-worker".into()).spawn(move || {
            let mut worker = WorkerThread {
                rx: request_rx,
                tx: response_tx,
                session: KernelSession::new(factory(), settings),
            };
            worker.run();
        })?;

        Ok(WorkerHandle {
            tx: Some(request_tx),
            rx: response_rx,
            handle: Some(handle),
        })
    }

    fn run(&mut self) {
        info!("kernel worker started");
        if self.tx.send(self.session.startup()).is_err() {
            return;
        }

        while let Ok(request) = self.rx.recv() {
            for response in self.session.handle(request) {
                if self.tx.send(response).is_err() {
                    debug!("kernel worker exiting (host dropped the receiver)");
                    return;
                }
            }
        }

        debug!("kernel worker exiting (channel disconnected)");
    }
}
