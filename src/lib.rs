//! `slit-desmear` library crate.
//!
//! Iterative desmearing (Lake/Jemian) of slit-length-smeared small-angle
//! scattering curves. The binary (`desmear`) is a thin wrapper around this
//! library so that:
//!
//! - the numerical core is testable without spawning processes
//! - the same session type drives the CLI, the prompt-driven mode and the TUI
//!
//! The core, leaves first: [`extrap`] (tail models), [`smear`] (lookup and
//! forward smearing operator), [`desmear`] (the iterative session).

pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod desmear;
pub mod domain;
pub mod error;
pub mod extrap;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;
pub mod smear;
pub mod tui;
