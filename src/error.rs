//! Error types.
//!
//! Two layers:
//!
//! - [`DesmearError`]: typed errors raised by the numerical core and the file
//!   adapters. These carry the offending value (path, q, name) in the message.
//! - [`AppError`]: what the binary reports. It pairs a message with a process
//!   exit code and is produced from a `DesmearError` at the front-end boundary.

use std::path::PathBuf;

/// Broad classification of a [`DesmearError`], used to pick an exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad parameters, unknown selectors, unreadable files.
    Input,
    /// The data cannot support the requested operation.
    Data,
    /// A failure inside a smearing pass or an iteration.
    Computation,
}

/// Errors raised by the desmearing core and the file adapters.
#[derive(Debug, thiserror::Error)]
pub enum DesmearError {
    /// Curve file missing or unreadable.
    #[error("cannot read curve file '{path}': {reason}")]
    DataFile { path: PathBuf, reason: String },

    /// A data line that is not three floating point numbers.
    #[error("malformed data in '{path}' line {line}: '{content}'")]
    MalformedLine {
        path: PathBuf,
        line: usize,
        content: String,
    },

    /// Output file could not be created or written.
    #[error("cannot write '{path}': {reason}")]
    WriteFile { path: PathBuf, reason: String },

    /// Problems with a `.inp` command input file.
    #[error("command input file '{path}': {reason}")]
    CommandFile { path: PathBuf, reason: String },

    /// Too few samples for the requested operation.
    #[error("insufficient data for {context}: need at least {needed} points, found {found}")]
    InsufficientData {
        context: &'static str,
        needed: usize,
        found: usize,
    },

    /// `sFinal` is not strictly inside the measured q range.
    #[error("sFinal={s_final} is outside the data range ({q_min}, {q_max})")]
    SFinalOutOfRange { s_final: f64, q_min: f64, q_max: f64 },

    /// Lookup requested below the first datum, where the forward problem is undefined.
    #[error("cannot interpolate or extrapolate at u={u} below q[0]={q_min}")]
    LookupBelowRange { u: f64, q_min: f64 },

    #[error("unknown extrapolation '{name}', expected one of: {known}")]
    UnknownExtrapolation { name: String, known: String },

    #[error("unknown feedback weighting '{name}', expected one of: {known}")]
    UnknownWeighting { name: String, known: String },

    /// Structural violation of the curve or parameter invariants.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A refinement produced NaN or infinity (e.g. `S[i] == 0` with `fast` weighting).
    #[error("non-finite value in {stage} at index {index}")]
    NonFinite { stage: &'static str, index: usize },

    /// The background worker thread panicked.
    #[error("desmearing worker thread panicked")]
    WorkerPanicked,

    /// Any failure during a forward smearing pass.
    #[error("smearing failed: {source}")]
    Smearing {
        #[source]
        source: Box<DesmearError>,
    },
}

impl DesmearError {
    /// Wrap an error raised inside a smearing pass, keeping the cause.
    pub fn smearing(source: DesmearError) -> Self {
        match source {
            // Avoid nesting when a smear call is itself wrapped again upstream.
            already @ DesmearError::Smearing { .. } => already,
            other => DesmearError::Smearing {
                source: Box::new(other),
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DesmearError::DataFile { .. }
            | DesmearError::MalformedLine { .. }
            | DesmearError::CommandFile { .. }
            | DesmearError::WriteFile { .. }
            | DesmearError::UnknownExtrapolation { .. }
            | DesmearError::UnknownWeighting { .. }
            | DesmearError::InvalidInput(_) => ErrorKind::Input,
            DesmearError::InsufficientData { .. }
            | DesmearError::SFinalOutOfRange { .. }
            | DesmearError::LookupBelowRange { .. } => ErrorKind::Data,
            DesmearError::Smearing { .. }
            | DesmearError::NonFinite { .. }
            | DesmearError::WorkerPanicked => ErrorKind::Computation,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<DesmearError> for AppError {
    fn from(err: DesmearError) -> Self {
        let exit_code = match err.kind() {
            ErrorKind::Input => 2,
            ErrorKind::Data => 3,
            ErrorKind::Computation => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
