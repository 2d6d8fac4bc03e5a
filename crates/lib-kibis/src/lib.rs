//! KIBIS: simulation-ready model synthesis from parsed IBIS files.
//!
//! The pipeline: [`translate`] turns an [`lib_ibis::IbisFile`] into a
//! component/pin graph with resolved parasitics and model candidates;
//! [`DeckSynthesizer`] then emits SPICE driver or device subcircuits for a
//! chosen (model, pin, corner) selection, recovering the Ku/Kd mixing
//! coefficients through an external simulator bootstrap where the accuracy
//! level calls for it.

pub mod curve;
pub mod error;
pub mod runner;
pub mod spice;
pub mod translate;

pub use curve::{matched_pairs, trim_waveform, WaveformPair};
pub use error::KibisError;
pub use runner::{parse_ku_kd_trace, Simulator};
pub use spice::{
    square_wave_source, Accuracy, DeckSynthesizer, KuKdSample, SquareWave, Stimulus,
};
pub use translate::{translate, KibisComponent, KibisPin, RESERVED_PIN_MODELS};
