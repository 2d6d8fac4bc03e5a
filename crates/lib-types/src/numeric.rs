//! Corner-valued numeric types.
//!
//! IBIS specifies most electrical quantities as a Typ/Min/Max triple across
//! process corners, and uses the literal `NA` where a corner value is not
//! applicable. `NA` is kept distinguishable from an ordinary parse-failure
//! NaN by giving it a dedicated NaN payload, so validation can tell "the
//! file said NA" apart from "we never managed to read a number".

use serde::{Deserialize, Serialize};

/// Bit pattern of the "not applicable" sentinel: a quiet NaN with a payload
/// no arithmetic operation will ever produce.
const NA_BITS: u64 = 0x7FF8_0000_4E41_4E41;

/// The `NA` sentinel value.
pub const NA: f64 = f64::from_bits(NA_BITS);

/// True if `x` is the `NA` sentinel (and not merely any NaN).
#[inline]
pub fn is_na(x: f64) -> bool {
    x.to_bits() == NA_BITS
}

/// Process/supply corner selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Corner {
    #[default]
    Typ,
    Min,
    Max,
}

impl Corner {
    /// All three corners, in Typ/Min/Max order.
    pub const ALL: [Corner; 3] = [Corner::Typ, Corner::Min, Corner::Max];
}

/// A Typ/Min/Max triple of doubles.
///
/// `typ` must always be a real number; `min` and `max` may be real or the
/// `NA` sentinel.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TypMinMax {
    pub typ: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for TypMinMax {
    fn default() -> Self {
        Self {
            typ: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
        }
    }
}

impl TypMinMax {
    pub fn new(typ: f64, min: f64, max: f64) -> Self {
        Self { typ, min, max }
    }

    /// Triple with the same value at every corner.
    pub fn splat(value: f64) -> Self {
        Self {
            typ: value,
            min: value,
            max: value,
        }
    }

    /// Value for the requested corner.
    #[inline]
    pub fn value(&self, corner: Corner) -> f64 {
        match corner {
            Corner::Typ => self.typ,
            Corner::Min => self.min,
            Corner::Max => self.max,
        }
    }

    /// Mutable access to the requested corner.
    #[inline]
    pub fn value_mut(&mut self, corner: Corner) -> &mut f64 {
        match corner {
            Corner::Typ => &mut self.typ,
            Corner::Min => &mut self.min,
            Corner::Max => &mut self.max,
        }
    }

    /// Structural validity: `typ` is a real number, `min`/`max` are real or
    /// the explicit `NA` sentinel.
    pub fn check(&self) -> bool {
        if self.typ.is_nan() {
            return false;
        }
        for v in [self.min, self.max] {
            if v.is_nan() && !is_na(v) {
                return false;
            }
        }
        true
    }
}

/// A dV/dt ramp slope: voltage swing over edge duration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Dvdt {
    /// Voltage swing in volts.
    pub dv: f64,
    /// Edge duration in seconds.
    pub dt: f64,
}

impl Default for Dvdt {
    fn default() -> Self {
        Self {
            dv: f64::NAN,
            dt: f64::NAN,
        }
    }
}

impl Dvdt {
    /// Slope in volts per second.
    #[inline]
    pub fn slope(&self) -> f64 {
        self.dv / self.dt
    }

    pub fn check(&self) -> bool {
        !self.dv.is_nan() && !self.dt.is_nan() && self.dt != 0.0
    }
}

/// A dV/dt triple across corners, as found under `[Ramp]`.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct DvdtTypMinMax {
    pub typ: Dvdt,
    pub min: Dvdt,
    pub max: Dvdt,
}

impl DvdtTypMinMax {
    #[inline]
    pub fn value(&self, corner: Corner) -> Dvdt {
        match corner {
            Corner::Typ => self.typ,
            Corner::Min => self.min,
            Corner::Max => self.max,
        }
    }

    pub fn check(&self) -> bool {
        self.typ.check() && self.min.check() && self.max.check()
    }
}
