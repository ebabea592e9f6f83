//! Mathematical utilities: register-based linear regression, interpolation,
//! and trapezoid-rule integration.

pub mod interp;
pub mod regression;

pub use interp::*;
pub use regression::*;
