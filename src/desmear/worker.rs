//! Run a session on a background thread.
//!
//! The worker owns the session while it runs, sends a [`SessionSnapshot`]
//! after every completed iteration, and hands the session back on
//! [`WorkerHandle::join`]. Cancellation is cooperative: the flag is checked
//! between iterations.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

use log::debug;

use crate::desmear::{DesmearSession, SessionSnapshot, StopReason};
use crate::error::DesmearError;

/// What a finished worker returns: the session (in its last consistent state)
/// and how the run ended.
pub struct WorkerOutcome {
    pub session: DesmearSession,
    pub result: Result<StopReason, DesmearError>,
}

pub struct WorkerHandle {
    snapshots: Receiver<SessionSnapshot>,
    cancel: Arc<AtomicBool>,
    thread: JoinHandle<WorkerOutcome>,
}

impl WorkerHandle {
    /// Snapshots in iteration order.
    pub fn snapshots(&self) -> &Receiver<SessionSnapshot> {
        &self.snapshots
    }

    /// Ask the worker to stop before its next iteration.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the worker and take the session back.
    pub fn join(self) -> Result<WorkerOutcome, DesmearError> {
        self.thread.join().map_err(|_| DesmearError::WorkerPanicked)
    }
}

/// Continue `session` on a new thread until its budget is used up, `cancel`
/// is raised, or the snapshot receiver is dropped.
pub fn spawn_worker(mut session: DesmearSession, cancel: Arc<AtomicBool>) -> WorkerHandle {
    let (tx, rx) = mpsc::channel();
    let flag = Arc::clone(&cancel);

    let thread = thread::spawn(move || {
        let result = session.run_cancellable(|s| tx.send(s.snapshot()).is_err(), &flag);
        debug!("worker finished after {} iterations: {result:?}", session.iteration_count());
        WorkerOutcome { session, result }
    });

    WorkerHandle {
        snapshots: rx,
        cancel,
        thread,
    }
}
