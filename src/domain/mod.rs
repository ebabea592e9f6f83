//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the measured input (`ScatteringCurve`)
//! - run configuration (`DesmearParams`, `IterationBudget`, `FeedbackWeighting`, ...)
//! - serializable run outputs (`RunReport`, `CurveColumns`, `ExtrapolationSummary`)

pub mod params;
pub mod types;

pub use params::*;
pub use types::*;
