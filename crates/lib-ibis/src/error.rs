//! Error types for IBIS parsing.

use thiserror::Error;

/// Hard parse failures: conditions after which the line-processing loop
/// cannot continue. Everything recoverable goes through the
/// [`Reporter`](crate::reporter::Reporter) instead.
#[derive(Debug, Error)]
pub enum IbisError {
    /// I/O error reading the file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A line exceeded the maximum line length. The line buffer invariant
    /// is violated, so parsing stops.
    #[error("line {line} exceeds the maximum line length of {max} bytes")]
    LineTooLong { line: usize, max: usize },

    /// The buffer ended before an `END` keyword was seen.
    #[error("end of file reached before [End]")]
    MissingEnd,
}
