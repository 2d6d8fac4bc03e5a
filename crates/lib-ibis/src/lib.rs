//! Tolerant parser for IBIS (I/O Buffer Information Specification) files.
//!
//! The entry point is [`parse_ibis_file`], which lexes and parses an
//! in-memory buffer into an [`IbisFile`] document while streaming
//! diagnostics to a caller-supplied [`Reporter`]. Malformed statements are
//! reported and skipped rather than aborting the parse; the returned
//! [`ParseOutcome::ok`] flag says whether every line went through clean.

pub mod error;
pub mod lexer;
pub mod model;
pub mod parser;
pub mod reporter;

pub use error::IbisError;
pub use lexer::parse_double;
pub use model::{
    Component, DiffPin, Enable, Fixture, Header, IbisFile, IvEntry, IvTable, Model,
    ModelSelector, ModelSelectorEntry, ModelType, PackageModel, PackageRlc, Pin, PinLayout,
    PinMapping, Polarity, Ramp, VtEntry, VtTable,
};
pub use parser::{parse_ibis_file, ParseOutcome};
pub use reporter::{NullReporter, Reporter, Severity, TracingReporter, VecReporter};
