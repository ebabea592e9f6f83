//! Reporting utilities: terminal summaries of a desmearing run.

pub mod format;

pub use format::*;
