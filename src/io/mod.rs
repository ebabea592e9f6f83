//! Input/output helpers.
//!
//! - three-column curve files (`qrs`)
//! - `.inp` command input files (`command`)
//! - JSON run reports (`report`)
//! - CSV result exports (`export`)

pub mod command;
pub mod export;
pub mod qrs;
pub mod report;

pub use command::*;
pub use export::*;
pub use qrs::*;
pub use report::*;
