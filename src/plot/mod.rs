//! Terminal plots.

pub mod ascii;

pub use ascii::{render_loglog_plot, render_residual_plot};
