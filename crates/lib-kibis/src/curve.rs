//! Waveform pairing and conditioning ahead of deck synthesis.
//!
//! I-V interpolation lives with the tables themselves
//! ([`lib_ibis::IvTable::interpolated_current`]); this module handles the
//! V-t side: matching rising/falling edges measured into the same fixture
//! and removing the DC bias so edges can be superimposed.

use lib_ibis::{Model, VtTable};
use lib_types::{is_na, Corner};

/// A rising and a falling edge measured into the same fixture. Only such
/// pairs may be combined into one switching profile.
#[derive(Clone, Copy, Debug)]
pub struct WaveformPair<'a> {
    pub rising: &'a VtTable,
    pub falling: &'a VtTable,
}

/// Collect every fixture-matched pair of a model's waveforms, enumerated
/// rising-list-major, falling-list-minor.
pub fn matched_pairs(model: &Model) -> Vec<WaveformPair<'_>> {
    let mut pairs = Vec::new();
    for rising in &model.rising_waveforms {
        for falling in &model.falling_waveforms {
            if rising.fixture.matches(&falling.fixture) {
                pairs.push(WaveformPair { rising, falling });
            }
        }
    }
    pairs
}

/// Copy a waveform with its first entry's voltage subtracted from every
/// entry, per corner, so the returned curve starts at zero.
///
/// The downstream square-wave builder sums several trimmed, time-shifted
/// edges and re-adds a single DC bias at the end; without the trim the bias
/// would be counted once per edge. Corners where either operand is the NA
/// sentinel are left untouched.
pub fn trim_waveform(table: &VtTable) -> VtTable {
    let mut trimmed = table.clone();
    let Some(first) = table.entries.first() else {
        return trimmed;
    };
    let bias = first.voltage;
    for entry in &mut trimmed.entries {
        for corner in Corner::ALL {
            let b = bias.value(corner);
            let v = entry.voltage.value_mut(corner);
            if !is_na(*v) && !is_na(b) {
                *v -= b;
            }
        }
    }
    trimmed
}
