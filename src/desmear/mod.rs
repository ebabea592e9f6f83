//! Iterative desmearing: session state machine, feedback weighting,
//! uncertainty propagation, and the background worker.

pub mod session;
pub mod uncertainty;
pub mod weighting;
pub mod worker;

pub use session::{DesmearSession, SessionSnapshot, StopReason};
pub use uncertainty::propagate_uncertainty;
pub use weighting::{feedback_weights, refine};
pub use worker::{WorkerHandle, WorkerOutcome, spawn_worker};
