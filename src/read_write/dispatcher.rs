use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam::channel::{self, Receiver, Sender};

use crate::read_write::ReadWriteCoordinator;
use crate::{BUG_MESSAGE, Lock, WriteBody};

/// The worker half of a scheduled-write lock: one thread that takes queued
/// write bodies and runs each one while holding the coordinator's write
/// side.
///
/// Exclusivity therefore spans the whole body, not just the submit call,
/// and bodies run in submission order under the same writer-preference
/// policy as direct writers.
pub(crate) struct WriteDispatcher {
    backlog: Sender<WriteBody>,
    worker: Option<JoinHandle<()>>,
}

impl WriteDispatcher {
    /// Spawns the worker thread serving `coordinator`.
    pub(crate) fn spawn(coordinator: Arc<ReadWriteCoordinator>) -> Self {
        let (backlog, queue) = channel::unbounded();
        let worker = std::thread::Builder::new()
            .name("lockkit-writes".to_string())
            .spawn(move || Self::run(&coordinator, &queue))
            .expect("failed to spawn the scheduled-write worker thread");

        Self {
            backlog,
            worker: Some(worker),
        }
    }

    /// Queues `body`; it runs once every earlier body has finished.
    pub(crate) fn submit(&self, body: WriteBody) {
        // the worker is joined only after this sender is dropped, so the
        // queue cannot be disconnected here
        self.backlog.send(body).expect(BUG_MESSAGE);
    }

    fn run(coordinator: &ReadWriteCoordinator, queue: &Receiver<WriteBody>) {
        while let Ok(body) = queue.recv() {
            // this thread never takes read holds, so admission cannot be
            // refused as an upgrade
            coordinator.acquire_write().expect(BUG_MESSAGE);

            let outcome = panic::catch_unwind(AssertUnwindSafe(body));

            coordinator.release_write().expect(BUG_MESSAGE);

            if cfg!(debug_assertions) && outcome.is_err() {
                eprintln!("lockkit: a scheduled write body panicked; its effects may be partial");
            }
        }
    }
}

impl Drop for WriteDispatcher {
    fn drop(&mut self) {
        // Dropping the sender disconnects the queue; the worker drains the
        // bodies already submitted and then exits.
        let (disconnected, _) = channel::bounded(0);
        drop(mem::replace(&mut self.backlog, disconnected));

        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
