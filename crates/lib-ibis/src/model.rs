//! In-memory representation of a parsed IBIS file.
//!
//! Record shapes follow the IBIS keyword structure: a header, components
//! (package parasitics, pins, pin mappings, differential pairs), model
//! selectors, electrical models (I-V tables, ramp, switching waveforms),
//! and standalone package models with pin-to-pin parasitic matrices.
//!
//! Each record carries a `check()` predicate verifying structural
//! completeness. Check failures are funneled through the [`Reporter`] with
//! ERROR severity and never abort parsing; the tolerant loader aggregates
//! them into its overall status instead.

use crate::reporter::{Reporter, Severity};
use lib_types::{is_na, Corner, DvdtTypMinMax, Matrix, TypMinMax, NA};
use serde::{Deserialize, Serialize};

/// Highest IBIS version this parser accepts.
pub const MAX_IBIS_VERSION: f64 = 7.2;

/// File name extensions the `[File Name]` keyword may carry.
pub const ALLOWED_FILE_EXTENSIONS: [&str; 4] = ["ibs", "pkg", "ebd", "ims"];

/// A parsed IBIS file. Owns every nested record; lifetime is the parse
/// session and onward.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IbisFile {
    pub header: Header,
    pub components: Vec<Component>,
    pub model_selectors: Vec<ModelSelector>,
    pub models: Vec<Model>,
    pub package_models: Vec<PackageModel>,
}

impl IbisFile {
    /// Look up a model by exact name.
    pub fn model_by_name(&self, name: &str) -> Option<(usize, &Model)> {
        self.models
            .iter()
            .enumerate()
            .find(|(_, m)| m.name == name)
    }

    /// Look up a model selector, case-insensitively.
    pub fn selector_by_name(&self, name: &str) -> Option<&ModelSelector> {
        self.model_selectors
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }
}

/// IBIS file header section.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Header {
    /// IBIS version, from `[IBIS Ver]`.
    pub ibis_version: f64,

    /// File name, from `[File Name]`. Extension must be one of
    /// [`ALLOWED_FILE_EXTENSIONS`].
    pub file_name: String,

    /// File revision, from `[File Rev]`.
    pub file_rev: String,

    pub date: String,
    pub source: String,
    pub notes: String,
    pub disclaimer: String,
    pub copyright: String,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            ibis_version: f64::NAN,
            file_name: String::new(),
            file_rev: String::new(),
            date: String::new(),
            source: String::new(),
            notes: String::new(),
            disclaimer: String::new(),
            copyright: String::new(),
        }
    }
}

impl Header {
    pub fn check(&self, rpt: &mut dyn Reporter) -> bool {
        let mut ok = true;
        if self.ibis_version.is_nan() {
            rpt.report("header: missing [IBIS Ver]", Severity::Error);
            ok = false;
        } else if self.ibis_version > MAX_IBIS_VERSION {
            rpt.report(
                &format!(
                    "header: IBIS version {} is newer than supported {}",
                    self.ibis_version, MAX_IBIS_VERSION
                ),
                Severity::Error,
            );
            ok = false;
        }
        if self.file_rev.is_empty() {
            rpt.report("header: missing [File Rev]", Severity::Error);
            ok = false;
        }
        let extension = self.file_name.rsplit('.').next().unwrap_or("");
        if !ALLOWED_FILE_EXTENSIONS
            .iter()
            .any(|e| extension.eq_ignore_ascii_case(e))
        {
            rpt.report(
                &format!("header: illegal file name '{}'", self.file_name),
                Severity::Error,
            );
            ok = false;
        }
        ok
    }
}

/// Package-level parasitics from the `[Package]` record.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct PackageRlc {
    pub r_pkg: TypMinMax,
    pub l_pkg: TypMinMax,
    pub c_pkg: TypMinMax,
}

impl PackageRlc {
    pub fn check(&self) -> bool {
        self.r_pkg.check() && self.l_pkg.check() && self.c_pkg.check()
    }
}

/// How the `[Pin]` table columns were declared by its header row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinLayout {
    /// pin / signal_name / model_name
    #[default]
    ThreeColumn,
    /// pin / signal_name / model_name / R_pin / L_pin / C_pin
    SixColumn,
}

/// One `[Component]` record.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub manufacturer: String,
    pub package: PackageRlc,
    pub pins: Vec<Pin>,
    pub pin_mappings: Vec<PinMapping>,
    pub diff_pins: Vec<DiffPin>,
    /// Reference to a `[Define Package Model]` by name, if any.
    pub package_model: Option<String>,
    /// Column layout resolved from the `[Pin]` header row.
    pub pin_layout: PinLayout,
}

impl Component {
    pub fn check(&self, rpt: &mut dyn Reporter) -> bool {
        let mut ok = true;
        if self.name.is_empty() {
            rpt.report("component: missing name", Severity::Error);
            ok = false;
        }
        if !self.package.check() {
            rpt.report(
                &format!("component '{}': invalid [Package] parasitics", self.name),
                Severity::Error,
            );
            ok = false;
        }
        if !self.pins.iter().any(|p| !p.dummy) {
            rpt.report(
                &format!("component '{}': no pins", self.name),
                Severity::Error,
            );
            ok = false;
        }
        for pin in &self.pins {
            if !pin.check() {
                rpt.report(
                    &format!("component '{}': invalid pin '{}'", self.name, pin.number),
                    Severity::Error,
                );
                ok = false;
            }
        }
        ok
    }
}

/// One row of the `[Pin]` table.
///
/// The header row itself is stored as a pin with `dummy` set: it carries
/// only the column names and contributes no electrical data.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Pin {
    /// Pin designator; alphanumeric to support BGA-style grids ("A7").
    pub number: String,
    pub signal: String,
    /// Model or model-selector name.
    pub model: String,
    /// Per-pin overrides; the NA sentinel means "use the package value".
    pub r_pin: f64,
    pub l_pin: f64,
    pub c_pin: f64,
    pub dummy: bool,
}

impl Default for Pin {
    fn default() -> Self {
        Self {
            number: String::new(),
            signal: String::new(),
            model: String::new(),
            r_pin: NA,
            l_pin: NA,
            c_pin: NA,
            dummy: false,
        }
    }
}

impl Pin {
    pub fn check(&self) -> bool {
        if self.dummy {
            return true;
        }
        if self.number.is_empty() || self.signal.is_empty() || self.model.is_empty() {
            return false;
        }
        [self.r_pin, self.l_pin, self.c_pin]
            .iter()
            .all(|v| !v.is_nan() || is_na(*v))
    }
}

/// One row of the `[Pin Mapping]` table: bus connections per pin.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PinMapping {
    pub pin: String,
    pub pulldown_ref: String,
    pub pullup_ref: String,
    pub gnd_clamp_ref: String,
    pub power_clamp_ref: String,
    pub ext_ref: String,
}

/// One row of the `[Diff Pin]` table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiffPin {
    pub pin: String,
    pub inv_pin: String,
    pub vdiff: f64,
    pub tdelay_typ: f64,
    pub tdelay_min: f64,
    pub tdelay_max: f64,
}

impl Default for DiffPin {
    fn default() -> Self {
        Self {
            pin: String::new(),
            inv_pin: String::new(),
            vdiff: NA,
            tdelay_typ: NA,
            tdelay_min: NA,
            tdelay_max: NA,
        }
    }
}

/// A `[Model Selector]`: a named group of models a pin may resolve to.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModelSelector {
    pub name: String,
    pub entries: Vec<ModelSelectorEntry>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModelSelectorEntry {
    pub model: String,
    pub description: String,
}

impl ModelSelector {
    pub fn check(&self, rpt: &mut dyn Reporter) -> bool {
        let mut ok = true;
        if self.name.is_empty() {
            rpt.report("model selector: missing name", Severity::Error);
            ok = false;
        }
        if self.entries.is_empty() {
            rpt.report(
                &format!("model selector '{}': no entries", self.name),
                Severity::Error,
            );
            ok = false;
        }
        ok
    }
}

/// The 17 IBIS model types.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelType {
    #[default]
    Undefined,
    Input,
    Output,
    IO,
    ThreeState,
    OpenDrain,
    IOOpenDrain,
    OpenSink,
    IOOpenSink,
    OpenSource,
    IOOpenSource,
    InputEcl,
    OutputEcl,
    IOEcl,
    ThreeStateEcl,
    Terminator,
    Series,
    SeriesSwitch,
}

impl ModelType {
    /// Parse the `Model_type` sub-parameter value.
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "input" => Some(Self::Input),
            "output" => Some(Self::Output),
            "i/o" => Some(Self::IO),
            "3-state" => Some(Self::ThreeState),
            "open_drain" => Some(Self::OpenDrain),
            "i/o_open_drain" => Some(Self::IOOpenDrain),
            "open_sink" => Some(Self::OpenSink),
            "i/o_open_sink" => Some(Self::IOOpenSink),
            "open_source" => Some(Self::OpenSource),
            "i/o_open_source" => Some(Self::IOOpenSource),
            "input_ecl" => Some(Self::InputEcl),
            "output_ecl" => Some(Self::OutputEcl),
            "i/o_ecl" => Some(Self::IOEcl),
            "3-state_ecl" => Some(Self::ThreeStateEcl),
            "terminator" => Some(Self::Terminator),
            "series" => Some(Self::Series),
            "series_switch" => Some(Self::SeriesSwitch),
            _ => None,
        }
    }

    /// Types that carry a switching stage and therefore require `[Ramp]`.
    pub fn requires_ramp(&self) -> bool {
        !matches!(
            self,
            Self::Undefined
                | Self::Input
                | Self::InputEcl
                | Self::Terminator
                | Self::Series
                | Self::SeriesSwitch
        )
    }

    /// Types a driver subcircuit can be synthesized for.
    pub fn can_drive(&self) -> bool {
        matches!(
            self,
            Self::Output
                | Self::IO
                | Self::ThreeState
                | Self::OpenDrain
                | Self::IOOpenDrain
                | Self::OpenSink
                | Self::IOOpenSink
                | Self::OpenSource
                | Self::IOOpenSource
                | Self::OutputEcl
                | Self::IOEcl
                | Self::ThreeStateEcl
        )
    }

    /// Types a receiver/device subcircuit can be synthesized for.
    pub fn can_receive(&self) -> bool {
        matches!(
            self,
            Self::Input
                | Self::IO
                | Self::IOOpenDrain
                | Self::IOOpenSink
                | Self::IOOpenSource
                | Self::InputEcl
                | Self::IOEcl
                | Self::Terminator
        )
    }
}

/// Output enable polarity, from the `Enable` sub-parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Enable {
    #[default]
    Undefined,
    ActiveHigh,
    ActiveLow,
}

/// Buffer polarity, from the `Polarity` sub-parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    #[default]
    Undefined,
    NonInverting,
    Inverting,
}

/// One `[Model]` record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    pub model_type: ModelType,
    pub polarity: Polarity,
    pub enable: Enable,

    /// Input low threshold, volts. Defaults to 0.8 V.
    pub vinl: f64,
    /// Input high threshold, volts. Defaults to 2.0 V.
    pub vinh: f64,
    pub vref: f64,
    pub rref: f64,
    pub cref: f64,
    pub vmeas: f64,

    /// Die capacitance, from `C_comp`.
    pub c_comp: TypMinMax,

    pub voltage_range: Option<TypMinMax>,
    pub temperature_range: Option<TypMinMax>,
    pub pullup_reference: Option<TypMinMax>,
    pub pulldown_reference: Option<TypMinMax>,
    pub gnd_clamp_reference: Option<TypMinMax>,
    pub power_clamp_reference: Option<TypMinMax>,

    pub pulldown: Option<IvTable>,
    pub pullup: Option<IvTable>,
    pub gnd_clamp: Option<IvTable>,
    pub power_clamp: Option<IvTable>,

    pub ramp: Ramp,
    pub rising_waveforms: Vec<VtTable>,
    pub falling_waveforms: Vec<VtTable>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            name: String::new(),
            model_type: ModelType::Undefined,
            polarity: Polarity::Undefined,
            enable: Enable::Undefined,
            vinl: 0.8,
            vinh: 2.0,
            vref: NA,
            rref: NA,
            cref: NA,
            vmeas: NA,
            c_comp: TypMinMax::default(),
            voltage_range: None,
            temperature_range: None,
            pullup_reference: None,
            pulldown_reference: None,
            gnd_clamp_reference: None,
            power_clamp_reference: None,
            pulldown: None,
            pullup: None,
            gnd_clamp: None,
            power_clamp: None,
            ramp: Ramp::default(),
            rising_waveforms: Vec::new(),
            falling_waveforms: Vec::new(),
        }
    }
}

impl Model {
    pub fn check(&self, rpt: &mut dyn Reporter) -> bool {
        let mut ok = true;
        if self.name.is_empty() {
            rpt.report("model: missing name", Severity::Error);
            ok = false;
        }
        if self.model_type == ModelType::Undefined {
            rpt.report(
                &format!("model '{}': missing Model_type", self.name),
                Severity::Error,
            );
            ok = false;
        }
        if self.model_type.requires_ramp() && !self.ramp.check() {
            rpt.report(
                &format!("model '{}': missing or invalid [Ramp]", self.name),
                Severity::Error,
            );
            ok = false;
        }
        for (label, table) in [
            ("Pulldown", &self.pulldown),
            ("Pullup", &self.pullup),
            ("GND Clamp", &self.gnd_clamp),
            ("POWER Clamp", &self.power_clamp),
        ] {
            if let Some(table) = table {
                if !table.check() {
                    rpt.report(
                        &format!("model '{}': invalid [{}] table", self.name, label),
                        Severity::Error,
                    );
                    ok = false;
                }
                if !table.is_monotonic_ascending() {
                    // quality warning, not a parse error
                    rpt.report(
                        &format!(
                            "model '{}': [{}] voltage column is not monotonically \
                             ascending; interpolation may be inaccurate",
                            self.name, label
                        ),
                        Severity::Warning,
                    );
                }
            }
        }
        ok
    }

    /// The supply rail swing for a corner, from `[Voltage Range]` or the
    /// pullup reference when the range is absent.
    pub fn supply_voltage(&self, corner: Corner) -> Option<f64> {
        self.voltage_range
            .or(self.pullup_reference)
            .map(|v| v.value(corner))
    }
}

/// One entry of an I-V table: current across corners at an applied voltage.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct IvEntry {
    pub voltage: f64,
    pub current: TypMinMax,
}

/// Tabulated current as a function of applied voltage.
///
/// Entries are kept in file order; monotonicity is a quality warning at
/// check time, not a parse error.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IvTable {
    pub entries: Vec<IvEntry>,
}

impl IvTable {
    pub fn check(&self) -> bool {
        !self.entries.is_empty()
            && self
                .entries
                .iter()
                .all(|e| !e.voltage.is_nan() && e.current.check())
    }

    pub fn is_monotonic_ascending(&self) -> bool {
        self.entries
            .windows(2)
            .all(|w| w[0].voltage <= w[1].voltage)
    }

    /// Linear interpolation of the current at `voltage` for one corner.
    ///
    /// Assumes the voltage column is sorted ascending. Outside the table's
    /// range the boundary value is returned (clamp, not extrapolate).
    pub fn interpolated_current(&self, voltage: f64, corner: Corner) -> f64 {
        let Some(first) = self.entries.first() else {
            return 0.0;
        };
        if voltage <= first.voltage {
            return first.current.value(corner);
        }
        let last = self.entries.last().unwrap();
        if voltage >= last.voltage {
            return last.current.value(corner);
        }
        for pair in self.entries.windows(2) {
            let (lo, hi) = (&pair[0], &pair[1]);
            if voltage <= hi.voltage {
                let span = hi.voltage - lo.voltage;
                if span == 0.0 {
                    return lo.current.value(corner);
                }
                let frac = (voltage - lo.voltage) / span;
                let (a, b) = (lo.current.value(corner), hi.current.value(corner));
                return a + frac * (b - a);
            }
        }
        last.current.value(corner)
    }
}

/// `[Ramp]` record: dV/dt under the default 50 ohm load.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Ramp {
    pub rising: DvdtTypMinMax,
    pub falling: DvdtTypMinMax,
    /// Load used when the dV/dt values were measured. Defaults to 50 ohm.
    pub r_load: f64,
}

impl Default for Ramp {
    fn default() -> Self {
        Self {
            rising: DvdtTypMinMax::default(),
            falling: DvdtTypMinMax::default(),
            r_load: 50.0,
        }
    }
}

impl Ramp {
    pub fn check(&self) -> bool {
        self.rising.check() && self.falling.check()
    }
}

/// The fixture network a waveform was measured into.
///
/// Two waveforms describe the same measurement setup, and may be combined,
/// exactly when every one of these six fields matches.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Fixture {
    pub r_fixture: f64,
    pub l_fixture: f64,
    pub c_fixture: f64,
    pub v_fixture: f64,
    pub v_fixture_min: f64,
    pub v_fixture_max: f64,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            r_fixture: NA,
            l_fixture: NA,
            c_fixture: NA,
            v_fixture: NA,
            v_fixture_min: NA,
            v_fixture_max: NA,
        }
    }
}

impl Fixture {
    /// Bitwise field equality, so that NA matches NA and any numeric
    /// difference (however small) unpairs.
    pub fn matches(&self, other: &Fixture) -> bool {
        let fields = |f: &Fixture| {
            [
                f.r_fixture,
                f.l_fixture,
                f.c_fixture,
                f.v_fixture,
                f.v_fixture_min,
                f.v_fixture_max,
            ]
        };
        fields(self)
            .iter()
            .zip(fields(other).iter())
            .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

/// One entry of a V-t table: voltage across corners at a time instant.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct VtEntry {
    pub time: f64,
    pub voltage: TypMinMax,
}

/// A `[Rising Waveform]` / `[Falling Waveform]` record: a V-t table plus
/// the fixture and DUT parasitics it was measured with.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VtTable {
    pub fixture: Fixture,
    pub r_dut: f64,
    pub l_dut: f64,
    pub c_dut: f64,
    pub entries: Vec<VtEntry>,
}

impl VtTable {
    pub fn check(&self) -> bool {
        !self.entries.is_empty()
            && self
                .entries
                .iter()
                .all(|e| !e.time.is_nan() && e.voltage.check())
    }

    /// Total edge duration covered by the table.
    pub fn duration(&self) -> f64 {
        match (self.entries.first(), self.entries.last()) {
            (Some(a), Some(b)) => b.time - a.time,
            _ => 0.0,
        }
    }
}

/// A `[Define Package Model]` record.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PackageModel {
    pub name: String,
    pub manufacturer: String,
    pub oem: String,
    pub description: String,
    pub number_of_pins: usize,
    pub pin_numbers: Vec<String>,
    pub resistance: Option<Matrix>,
    pub inductance: Option<Matrix>,
    pub capacitance: Option<Matrix>,
}

impl PackageModel {
    pub fn check(&self, rpt: &mut dyn Reporter) -> bool {
        let mut ok = true;
        if self.name.is_empty() {
            rpt.report("package model: missing name", Severity::Error);
            ok = false;
        }
        if self.number_of_pins == 0 {
            rpt.report(
                &format!("package model '{}': missing [Number Of Pins]", self.name),
                Severity::Error,
            );
            ok = false;
        }
        if self.pin_numbers.len() != self.number_of_pins {
            rpt.report(
                &format!(
                    "package model '{}': {} pin numbers listed, {} declared",
                    self.name,
                    self.pin_numbers.len(),
                    self.number_of_pins
                ),
                Severity::Error,
            );
            ok = false;
        }
        match &self.resistance {
            None => {
                rpt.report(
                    &format!("package model '{}': missing resistance matrix", self.name),
                    Severity::Error,
                );
                ok = false;
            }
            Some(m) if !m.check() => {
                rpt.report(
                    &format!("package model '{}': invalid resistance matrix", self.name),
                    Severity::Error,
                );
                ok = false;
            }
            Some(_) => {}
        }
        for (label, matrix) in [
            ("inductance", &self.inductance),
            ("capacitance", &self.capacitance),
        ] {
            if let Some(m) = matrix {
                if !m.check() {
                    rpt.report(
                        &format!("package model '{}': invalid {} matrix", self.name, label),
                        Severity::Error,
                    );
                    ok = false;
                }
            }
        }
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::VecReporter;

    fn table(points: &[(f64, f64)]) -> IvTable {
        IvTable {
            entries: points
                .iter()
                .map(|&(v, i)| IvEntry {
                    voltage: v,
                    current: TypMinMax::splat(i),
                })
                .collect(),
        }
    }

    #[test]
    fn test_interpolation_midpoint_and_clamp() {
        let t = table(&[(0.0, 0.0), (1.0, 2.0), (2.0, 2.0)]);
        assert!((t.interpolated_current(0.5, Corner::Typ) - 1.0).abs() < 1e-12);
        assert_eq!(t.interpolated_current(-1.0, Corner::Typ), 0.0);
        assert_eq!(t.interpolated_current(3.0, Corner::Typ), 2.0);
        assert!((t.interpolated_current(1.5, Corner::Typ) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_monotonicity_detection() {
        assert!(table(&[(0.0, 0.0), (1.0, 1.0)]).is_monotonic_ascending());
        assert!(!table(&[(1.0, 0.0), (0.0, 1.0)]).is_monotonic_ascending());
    }

    #[test]
    fn test_fixture_matching_is_exact() {
        let mut a = Fixture {
            r_fixture: 50.0,
            v_fixture: 1.8,
            ..Default::default()
        };
        let b = a;
        assert!(a.matches(&b));
        a.r_fixture += 1e-15;
        assert!(!a.matches(&b));
        // NA pairs with NA
        assert!(Fixture::default().matches(&Fixture::default()));
    }

    #[test]
    fn test_header_check_requires_extension() {
        let mut rpt = VecReporter::new();
        let mut h = Header {
            ibis_version: 5.1,
            file_name: "x.ibs".into(),
            file_rev: "1.0".into(),
            ..Default::default()
        };
        assert!(h.check(&mut rpt));
        h.file_name = "x.txt".into();
        assert!(!h.check(&mut rpt));
        h.file_name = "x.pkg".into();
        h.ibis_version = 99.0;
        assert!(!h.check(&mut rpt));
    }

    #[test]
    fn test_model_ramp_requirement() {
        let mut rpt = VecReporter::new();
        let mut m = Model {
            name: "OUT".into(),
            model_type: ModelType::Output,
            ..Default::default()
        };
        assert!(!m.check(&mut rpt));
        m.model_type = ModelType::Input;
        assert!(m.check(&mut rpt));
    }

    #[test]
    fn test_pin_check_na_overrides_legal() {
        let pin = Pin {
            number: "1".into(),
            signal: "CLK".into(),
            model: "OUT".into(),
            ..Default::default()
        };
        assert!(pin.check());
        let mut bad = pin.clone();
        bad.r_pin = f64::NAN;
        assert!(!bad.check());
    }
}
