//! Error types for KIBIS translation and deck synthesis.

use lib_ibis::ModelType;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KibisError {
    /// I/O error writing or reading a simulation deck.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The model's type cannot back the requested subcircuit kind.
    #[error("model '{model}' cannot be used as a {wanted}: Model_type is {found:?}")]
    UnsupportedModelType {
        model: String,
        wanted: &'static str,
        found: ModelType,
    },

    /// Driver synthesis needs a pull network the model does not carry.
    #[error("model '{model}' has neither a [Pullup] nor a [Pulldown] table")]
    MissingPullTables { model: String },

    /// The requested accuracy level needs more matched waveform pairs than
    /// the model provides.
    #[error(
        "model '{model}' has {available} matched waveform pair(s), \
         accuracy level {level} needs {needed}"
    )]
    MissingWaveformPair {
        model: String,
        level: u8,
        available: usize,
        needed: usize,
    },

    /// The ramp fallback needs a usable `[Ramp]` record.
    #[error("model '{model}' has no usable [Ramp] dV/dt for the {corner:?} corner")]
    UnusableRamp {
        model: String,
        corner: lib_types::Corner,
    },

    /// The external simulator exited with a failure status.
    #[error("simulator '{executable}' exited with {status}")]
    SimulatorFailed {
        executable: String,
        status: ExitStatus,
    },

    /// The external simulator did not finish within the configured timeout.
    #[error("simulator timed out after {seconds} seconds")]
    SimulatorTimeout { seconds: u64 },

    /// The simulator ran but left no trace file behind.
    #[error("simulator produced no trace file at {}", path.display())]
    MissingTrace { path: PathBuf },

    /// The trace file did not follow the expected header/group layout.
    #[error("malformed simulator trace near line {line}: {reason}")]
    MalformedTrace { reason: String, line: usize },
}
