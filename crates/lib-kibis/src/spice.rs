//! SPICE subcircuit synthesis for IBIS buffer models.
//!
//! A driver subcircuit mixes the pull-up and pull-down I-V networks with
//! time-varying coefficients Ku/Kd (the fractional "on-ness" of each
//! network during a switching transition). The coefficients are recovered
//! by running a disposable bootstrap deck through the external simulator:
//! the die node is forced to the measured switching waveform and the
//! balance of the clamp, fixture, and die-capacitance currents is solved
//! for Ku/Kd at every time step. At the lowest accuracy level the measured
//! waveforms are ignored and a linear profile derived from the `[Ramp]`
//! timing is used instead.

use crate::curve::{matched_pairs, trim_waveform, WaveformPair};
use crate::error::KibisError;
use crate::runner::{Simulator, TRACE_FILE};
use crate::translate::KibisPin;
use lib_ibis::model::Fixture;
use lib_ibis::{IvTable, Model, Reporter, Severity, VtTable};
use lib_types::{is_na, Corner, Dvdt, TypMinMax};

/// How many measured waveform pairs feed the Ku/Kd recovery.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Accuracy {
    /// No waveforms: linear Ku/Kd profile from the `[Ramp]` dV/dt timing.
    Level0,
    /// One matched pair, solved with the constraint Ku + Kd = 1.
    Level1,
    /// Two matched pairs, solved as a 2x2 system per time step.
    #[default]
    Level2,
    /// Reserved; currently behaves as level 2.
    Level3,
}

impl Accuracy {
    /// Waveform pairs consumed at this level.
    pub fn pairs_needed(&self) -> usize {
        match self {
            Accuracy::Level0 => 0,
            Accuracy::Level1 => 1,
            Accuracy::Level2 | Accuracy::Level3 => 2,
        }
    }

    pub fn level(&self) -> u8 {
        match self {
            Accuracy::Level0 => 0,
            Accuracy::Level1 => 1,
            Accuracy::Level2 => 2,
            Accuracy::Level3 => 3,
        }
    }
}

/// One recovered sample of the mixing coefficients.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KuKdSample {
    pub time: f64,
    pub ku: f64,
    pub kd: f64,
}

/// Rectangular stimulus timing.
#[derive(Clone, Copy, Debug)]
pub struct SquareWave {
    pub on_time: f64,
    pub off_time: f64,
    pub cycles: usize,
    pub delay: f64,
}

impl SquareWave {
    pub fn period(&self) -> f64 {
        self.on_time + self.off_time
    }
}

/// The switching pattern the synthesized driver reproduces.
#[derive(Clone, Copy, Debug)]
pub enum Stimulus {
    RisingEdge,
    FallingEdge,
    Rectangular(SquareWave),
}

/// Emits driver and device subcircuits for one (model, pin, corner)
/// selection.
#[derive(Debug, Default)]
pub struct DeckSynthesizer {
    pub simulator: Simulator,
}

impl DeckSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_simulator(simulator: Simulator) -> Self {
        Self { simulator }
    }

    /// Emit a driver subcircuit with ports `POWER GND PIN`.
    pub fn write_driver(
        &self,
        model: &Model,
        pin: &KibisPin,
        corner: Corner,
        accuracy: Accuracy,
        stimulus: &Stimulus,
        rpt: &mut dyn Reporter,
    ) -> Result<String, KibisError> {
        if !model.model_type.can_drive() {
            rpt.report(
                &format!(
                    "model '{}' cannot drive: Model_type is {:?}",
                    model.name, model.model_type
                ),
                Severity::Error,
            );
            return Err(KibisError::UnsupportedModelType {
                model: model.name.clone(),
                wanted: "driver",
                found: model.model_type,
            });
        }
        if model.pullup.is_none() && model.pulldown.is_none() {
            rpt.report(
                &format!("model '{}' has no pull network to drive with", model.name),
                Severity::Error,
            );
            return Err(KibisError::MissingPullTables {
                model: model.name.clone(),
            });
        }
        let samples = self.recover_ku_kd(model, corner, accuracy, stimulus, rpt)?;

        let mut deck = Deck::new();
        let id = subckt_id(&model.name, corner, "DRV");
        deck.line(format!(
            "* Driver subcircuit: model {} at the {corner:?} corner",
            model.name
        ));
        deck.line(format!(".SUBCKT {id} POWER GND PIN"));
        emit_pin_parasitics(&mut deck, pin, corner);
        deck.line(format!(
            "Ccomp DIE GND {}",
            num(corner_or_typ(model.c_comp, corner))
        ));
        emit_clamps(&mut deck, model, corner);
        emit_pwl_source(&mut deck, "Vku", "KU", &samples, |s| s.ku);
        emit_pwl_source(&mut deck, "Vkd", "KD", &samples, |s| s.kd);
        if let Some(pullup) = &model.pullup {
            // positive table current flows out of the die toward its rail
            deck.line(format!(
                "Bpu DIE POWER I=( v(KU) * {} )",
                iv_pwl(pullup, corner, "v(POWER,DIE)")
            ));
        }
        if let Some(pulldown) = &model.pulldown {
            deck.line(format!(
                "Bpd DIE GND I=( v(KD) * {} )",
                iv_pwl(pulldown, corner, "v(DIE)")
            ));
        }
        deck.line(".ENDS");
        Ok(deck.finish())
    }

    /// Emit a receiver subcircuit with ports `POWER GND PIN`: clamps and
    /// die capacitance only, no switching stage.
    pub fn write_device(
        &self,
        model: &Model,
        pin: &KibisPin,
        corner: Corner,
        rpt: &mut dyn Reporter,
    ) -> Result<String, KibisError> {
        if !model.model_type.can_receive() {
            rpt.report(
                &format!(
                    "model '{}' cannot receive: Model_type is {:?}",
                    model.name, model.model_type
                ),
                Severity::Error,
            );
            return Err(KibisError::UnsupportedModelType {
                model: model.name.clone(),
                wanted: "device",
                found: model.model_type,
            });
        }
        let mut deck = Deck::new();
        let id = subckt_id(&model.name, corner, "DEV");
        deck.line(format!(
            "* Device subcircuit: model {} at the {corner:?} corner",
            model.name
        ));
        deck.line(format!(".SUBCKT {id} POWER GND PIN"));
        emit_pin_parasitics(&mut deck, pin, corner);
        deck.line(format!(
            "Ccomp DIE GND {}",
            num(corner_or_typ(model.c_comp, corner))
        ));
        emit_clamps(&mut deck, model, corner);
        deck.line(".ENDS");
        Ok(deck.finish())
    }

    fn recover_ku_kd(
        &self,
        model: &Model,
        corner: Corner,
        accuracy: Accuracy,
        stimulus: &Stimulus,
        rpt: &mut dyn Reporter,
    ) -> Result<Vec<KuKdSample>, KibisError> {
        let needed = accuracy.pairs_needed();
        if needed == 0 {
            return ramp_ku_kd(model, corner, stimulus, rpt);
        }
        let pairs = matched_pairs(model);
        if pairs.len() < needed {
            rpt.report(
                &format!(
                    "model '{}': accuracy level {} needs {} matched waveform \
                     pair(s), found {}",
                    model.name,
                    accuracy.level(),
                    needed,
                    pairs.len()
                ),
                Severity::Error,
            );
            return Err(KibisError::MissingWaveformPair {
                model: model.name.clone(),
                level: accuracy.level(),
                available: pairs.len(),
                needed,
            });
        }
        let deck = recovery_deck(model, corner, &pairs[..needed], stimulus, rpt);
        let mut samples = self.simulator.run_ku_kd(&deck)?;
        for s in &mut samples {
            s.ku = s.ku.clamp(0.0, 1.0);
            s.kd = s.kd.clamp(0.0, 1.0);
        }
        Ok(samples)
    }
}

/// Behavioral voltage source reproducing a rectangular waveform from one
/// measured edge pair: one time-shifted copy of the trimmed rising edge and
/// one of the trimmed falling edge per cycle, plus the DC bias added back
/// once. Returns the source card and the total stimulus duration.
pub fn square_wave_source(
    name: &str,
    node: &str,
    pair: &WaveformPair<'_>,
    corner: Corner,
    wave: &SquareWave,
    rpt: &mut dyn Reporter,
) -> (String, f64) {
    if pair.rising.duration() > wave.on_time {
        rpt.report(
            &format!(
                "rising edge spans {} s but the on time is only {} s; \
                 the synthesized waveform will be distorted",
                pair.rising.duration(),
                wave.on_time
            ),
            Severity::Warning,
        );
    }
    if pair.falling.duration() > wave.off_time {
        rpt.report(
            &format!(
                "falling edge spans {} s but the off time is only {} s; \
                 the synthesized waveform will be distorted",
                pair.falling.duration(),
                wave.off_time
            ),
            Severity::Warning,
        );
    }
    let bias = pair
        .rising
        .entries
        .first()
        .map(|e| e.voltage.value(corner))
        .unwrap_or(0.0);
    let rising = trim_waveform(pair.rising);
    let falling = trim_waveform(pair.falling);
    let mut expr = num(bias);
    for cycle in 0..wave.cycles {
        let t_on = wave.delay + cycle as f64 * wave.period();
        let t_off = t_on + wave.on_time;
        expr.push_str(&format!(
            " + pwl(time-{}, {})",
            num(t_on),
            vt_points(&rising, corner)
        ));
        expr.push_str(&format!(
            " + pwl(time-{}, {})",
            num(t_off),
            vt_points(&falling, corner)
        ));
    }
    let duration =
        wave.delay + wave.cycles as f64 * wave.period() + pair.falling.duration();
    (format!("B{name} {node} 0 V=( {expr} )"), duration)
}

/// Build the bootstrap deck that recovers Ku/Kd for `pairs` (one pair for
/// the constrained solve, two for the full 2x2 solve). Nodes `KU` and `KD`
/// carry the coefficients; the `.control` block writes them to
/// [`TRACE_FILE`] in the simulator's working directory.
fn recovery_deck(
    model: &Model,
    corner: Corner,
    pairs: &[WaveformPair<'_>],
    stimulus: &Stimulus,
    rpt: &mut dyn Reporter,
) -> String {
    let vcc = match model.supply_voltage(corner) {
        Some(v) if !v.is_nan() => v,
        _ => {
            rpt.report(
                &format!(
                    "model '{}' has no [Voltage Range] or [Pullup Reference]; \
                     assuming a 0 V rail for Ku/Kd recovery",
                    model.name
                ),
                Severity::Warning,
            );
            0.0
        }
    };
    let ccomp = corner_or_typ(model.c_comp, corner);

    let mut deck = Deck::new();
    deck.line(format!(
        "* Ku/Kd recovery: model {} at the {corner:?} corner",
        model.name
    ));
    deck.line(format!("Vpower POWER 0 {}", num(vcc)));

    let mut duration: f64 = 0.0;
    for (n, pair) in pairs.iter().enumerate() {
        let die = format!("DIE{}", n + 1);
        let (source, span) = die_stimulus(&die, pair, corner, stimulus, rpt);
        duration = duration.max(span);
        deck.line(source);

        // per-network currents at the forced die voltage, as node voltages
        deck.line(format!(
            "Bipu{n} IPU{n} 0 V={}",
            opt_iv_pwl(&model.pullup, corner, &format!("v(POWER,{die})"))
        ));
        deck.line(format!(
            "Bipd{n} IPD{n} 0 V={}",
            opt_iv_pwl(&model.pulldown, corner, &format!("v({die})"))
        ));
        deck.line(format!(
            "Bigc{n} IGC{n} 0 V={}",
            opt_iv_pwl(&model.gnd_clamp, corner, &format!("v({die})"))
        ));
        deck.line(format!(
            "Bipc{n} IPC{n} 0 V={}",
            opt_iv_pwl(&model.power_clamp, corner, &format!("v(POWER,{die})"))
        ));
        let rfix = fixture_resistance(&pair.rising.fixture);
        let vfix = fixture_voltage(&pair.rising.fixture, corner);
        deck.line(format!(
            "Bifx{n} IFX{n} 0 V=((v({die})-{})/{})",
            num(vfix),
            num(rfix)
        ));
        deck.line(format!("Bicc{n} ICC{n} 0 V=({}*ddt(v({die})))", num(ccomp)));
        // every non-pull element is oriented die-to-rail, so the current
        // the pull stages must deliver into the die is the negated sum
        deck.line(format!(
            "Br{n} R{n} 0 V=(-v(IFX{n})-v(ICC{n})-v(IGC{n})-v(IPC{n}))"
        ));
    }

    match pairs.len() {
        1 => {
            // constrained solve: Kd = 1 - Ku
            deck.line("Bku KU 0 V=((v(R0)-v(IPD0))/(v(IPU0)-v(IPD0)))");
            deck.line("Bkd KD 0 V=(1-v(KU))");
        }
        _ => {
            // 2x2 solve across the two fixtures
            deck.line("Bdet DET 0 V=(v(IPU0)*v(IPD1)-v(IPU1)*v(IPD0))");
            deck.line("Bku KU 0 V=((v(R0)*v(IPD1)-v(R1)*v(IPD0))/v(DET))");
            deck.line("Bkd KD 0 V=((v(IPU0)*v(R1)-v(IPU1)*v(R0))/v(DET))");
        }
    }

    if duration <= 0.0 {
        duration = 1e-9;
    }
    deck.line(format!(".tran {} {}", num(duration / 500.0), num(duration)));
    deck.line(".control");
    deck.line("run");
    deck.line("set filetype=ascii");
    deck.line(format!("write {TRACE_FILE} v(KU) v(KD)"));
    deck.line("quit");
    deck.line(".endc");
    deck.line(".end");
    deck.finish()
}

/// Forcing source for one die node, following the requested stimulus.
fn die_stimulus(
    node: &str,
    pair: &WaveformPair<'_>,
    corner: Corner,
    stimulus: &Stimulus,
    rpt: &mut dyn Reporter,
) -> (String, f64) {
    match stimulus {
        Stimulus::RisingEdge => (
            format!("V{node} {node} 0 pwl({})", vt_points(pair.rising, corner)),
            pair.rising.duration(),
        ),
        Stimulus::FallingEdge => (
            format!("V{node} {node} 0 pwl({})", vt_points(pair.falling, corner)),
            pair.falling.duration(),
        ),
        Stimulus::Rectangular(wave) => {
            square_wave_source(&format!("die_{node}"), node, pair, corner, wave, rpt)
        }
    }
}

/// Linear Ku/Kd profile from the `[Ramp]` timing. The dV/dt dt covers the
/// 20-80% portion of the swing, so the full transition is dt/0.6.
fn ramp_ku_kd(
    model: &Model,
    corner: Corner,
    stimulus: &Stimulus,
    rpt: &mut dyn Reporter,
) -> Result<Vec<KuKdSample>, KibisError> {
    let rise = ramp_transition_time(model.ramp.rising.value(corner))
        .ok_or_else(|| KibisError::UnusableRamp {
            model: model.name.clone(),
            corner,
        })?;
    let fall = ramp_transition_time(model.ramp.falling.value(corner))
        .ok_or_else(|| KibisError::UnusableRamp {
            model: model.name.clone(),
            corner,
        })?;
    let up = |time| KuKdSample {
        time,
        ku: 1.0,
        kd: 0.0,
    };
    let down = |time| KuKdSample {
        time,
        ku: 0.0,
        kd: 1.0,
    };
    Ok(match stimulus {
        Stimulus::RisingEdge => vec![down(0.0), up(rise)],
        Stimulus::FallingEdge => vec![up(0.0), down(fall)],
        Stimulus::Rectangular(wave) => {
            if rise > wave.on_time || fall > wave.off_time {
                rpt.report(
                    "ramp transition is longer than the requested on/off time; \
                     the synthesized waveform will be distorted",
                    Severity::Warning,
                );
            }
            let mut samples = vec![down(0.0)];
            for cycle in 0..wave.cycles {
                let t_on = wave.delay + cycle as f64 * wave.period();
                let t_off = t_on + wave.on_time;
                let mut push = |s: KuKdSample| {
                    if samples.last().map(|p| s.time > p.time).unwrap_or(true) {
                        samples.push(s);
                    }
                };
                push(down(t_on));
                push(up(t_on + rise));
                push(up(t_off));
                push(down(t_off + fall));
            }
            samples
        }
    })
}

/// Full-swing transition time from one dV/dt cell, or `None` when the ramp
/// was never specified.
fn ramp_transition_time(dvdt: Dvdt) -> Option<f64> {
    if !dvdt.check() {
        return None;
    }
    Some(dvdt.dt / 0.6)
}

fn fixture_resistance(fixture: &Fixture) -> f64 {
    if is_na(fixture.r_fixture) || fixture.r_fixture == 0.0 {
        50.0
    } else {
        fixture.r_fixture
    }
}

/// Fixture rail for a corner: V_fixture_min/max when given, otherwise the
/// plain V_fixture, otherwise ground.
fn fixture_voltage(fixture: &Fixture, corner: Corner) -> f64 {
    let v = match corner {
        Corner::Typ => fixture.v_fixture,
        Corner::Min if !is_na(fixture.v_fixture_min) => fixture.v_fixture_min,
        Corner::Max if !is_na(fixture.v_fixture_max) => fixture.v_fixture_max,
        _ => fixture.v_fixture,
    };
    if is_na(v) {
        0.0
    } else {
        v
    }
}

// ----------------------------------------------------------------------
// text emission helpers

struct Deck(String);

impl Deck {
    fn new() -> Self {
        Deck(String::new())
    }

    fn line(&mut self, s: impl AsRef<str>) {
        self.0.push_str(s.as_ref());
        self.0.push('\n');
    }

    fn finish(self) -> String {
        self.0
    }
}

/// SPICE-safe numeric literal; NA and NaN degrade to zero.
fn num(v: f64) -> String {
    if v.is_nan() {
        "0".to_string()
    } else {
        format!("{v:.6e}")
    }
}

/// Corner value with a typ fallback for NA corners.
fn corner_or_typ(v: TypMinMax, corner: Corner) -> f64 {
    let value = v.value(corner);
    if is_na(value) || value.is_nan() {
        v.typ
    } else {
        value
    }
}

/// Subcircuit identifier: model name with SPICE-hostile characters folded
/// to underscores.
fn subckt_id(model_name: &str, corner: Corner, kind: &str) -> String {
    let safe: String = model_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{safe}_{corner:?}_{kind}").to_uppercase()
}

fn emit_pin_parasitics(deck: &mut Deck, pin: &KibisPin, corner: Corner) {
    deck.line(format!(
        "Rpin DIE NET1 {}",
        num(corner_or_typ(pin.r_pin, corner))
    ));
    deck.line(format!(
        "Lpin NET1 PIN {}",
        num(corner_or_typ(pin.l_pin, corner))
    ));
    deck.line(format!(
        "Cpin PIN GND {}",
        num(corner_or_typ(pin.c_pin, corner))
    ));
}

fn emit_clamps(deck: &mut Deck, model: &Model, corner: Corner) {
    if let Some(gnd_clamp) = &model.gnd_clamp {
        deck.line(format!(
            "Bgc DIE GND I=( {} )",
            iv_pwl(gnd_clamp, corner, "v(DIE)")
        ));
    }
    if let Some(power_clamp) = &model.power_clamp {
        deck.line(format!(
            "Bpc DIE POWER I=( {} )",
            iv_pwl(power_clamp, corner, "v(POWER,DIE)")
        ));
    }
}

/// Materialize an I-V table as a `pwl(ctrl, v0,i0, ...)` expression keyed
/// by corner.
fn iv_pwl(table: &IvTable, corner: Corner, ctrl: &str) -> String {
    let mut points = String::new();
    for entry in &table.entries {
        if !points.is_empty() {
            points.push_str(", ");
        }
        points.push_str(&num(entry.voltage));
        points.push(',');
        points.push_str(&num(entry.current.value(corner)));
    }
    format!("pwl({ctrl}, {points})")
}

/// As [`iv_pwl`], degrading to a constant zero when the table is absent or
/// empty.
fn opt_iv_pwl(table: &Option<IvTable>, corner: Corner, ctrl: &str) -> String {
    match table {
        Some(t) if !t.entries.is_empty() => iv_pwl(t, corner, ctrl),
        _ => "0".to_string(),
    }
}

/// V-t table as a flat `t0,v0, t1,v1, ...` point list for one corner.
fn vt_points(table: &VtTable, corner: Corner) -> String {
    let mut points = String::new();
    for entry in &table.entries {
        if !points.is_empty() {
            points.push_str(", ");
        }
        points.push_str(&num(entry.time));
        points.push(',');
        points.push_str(&num(entry.voltage.value(corner)));
    }
    points
}

/// PWL voltage source over recovered samples, wrapped onto SPICE
/// continuation lines.
fn emit_pwl_source(
    deck: &mut Deck,
    name: &str,
    node: &str,
    samples: &[KuKdSample],
    value: impl Fn(&KuKdSample) -> f64,
) {
    let mut card = format!("{name} {node} GND pwl(");
    for (i, sample) in samples.iter().enumerate() {
        if i > 0 {
            card.push(' ');
        }
        card.push_str(&num(sample.time));
        card.push(' ');
        card.push_str(&num(value(sample)));
        if i % 4 == 3 && i + 1 < samples.len() {
            card.push_str("\n+");
        }
    }
    card.push(')');
    deck.line(card);
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_ibis::model::{Fixture, IvEntry, ModelType, Ramp, VtEntry};
    use lib_ibis::VecReporter;
    use lib_types::DvdtTypMinMax;

    fn iv(points: &[(f64, f64)]) -> IvTable {
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

    fn vt(fixture: Fixture, points: &[(f64, f64)]) -> VtTable {
        VtTable {
            fixture,
            entries: points
                .iter()
                .map(|&(t, v)| VtEntry {
                    time: t,
                    voltage: TypMinMax::splat(v),
                })
                .collect(),
            ..Default::default()
        }
    }

    fn splat_dvdt(dv: f64, dt: f64) -> DvdtTypMinMax {
        let d = Dvdt { dv, dt };
        DvdtTypMinMax {
            typ: d,
            min: d,
            max: d,
        }
    }

    fn driver_model() -> Model {
        let fixture = Fixture {
            r_fixture: 50.0,
            v_fixture: 0.0,
            ..Default::default()
        };
        Model {
            name: "Strong".into(),
            model_type: ModelType::Output,
            pullup: Some(iv(&[(-3.3, 0.09), (0.0, 0.0), (3.3, -0.09)])),
            pulldown: Some(iv(&[(-3.3, -0.09), (0.0, 0.0), (3.3, 0.09)])),
            voltage_range: Some(TypMinMax::new(3.3, 3.0, 3.6)),
            ramp: Ramp {
                rising: splat_dvdt(2.0, 1.0e-9),
                falling: splat_dvdt(2.0, 1.0e-9),
                r_load: 50.0,
            },
            rising_waveforms: vec![vt(fixture, &[(0.0, 0.2), (1e-9, 3.1)])],
            falling_waveforms: vec![vt(fixture, &[(0.0, 3.1), (1e-9, 0.2)])],
            ..Default::default()
        }
    }

    fn bare_pin() -> KibisPin {
        KibisPin {
            number: "1".into(),
            signal: "DQ0".into(),
            r_pin: TypMinMax::splat(0.2),
            l_pin: TypMinMax::splat(5e-9),
            c_pin: TypMinMax::splat(2e-12),
            models: Vec::new(),
        }
    }

    #[test]
    fn test_accuracy_pair_counts() {
        assert_eq!(Accuracy::Level0.pairs_needed(), 0);
        assert_eq!(Accuracy::Level1.pairs_needed(), 1);
        assert_eq!(Accuracy::Level2.pairs_needed(), 2);
        // level 3 currently behaves as level 2
        assert_eq!(Accuracy::Level3.pairs_needed(), 2);
    }

    #[test]
    fn test_ramp_fallback_profile() {
        let model = driver_model();
        let mut rpt = VecReporter::new();
        let samples =
            ramp_ku_kd(&model, Corner::Typ, &Stimulus::RisingEdge, &mut rpt).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!((samples[0].ku, samples[0].kd), (0.0, 1.0));
        assert_eq!((samples[1].ku, samples[1].kd), (1.0, 0.0));
        // dt covers 20-80%, so the full transition is stretched by 1/0.6
        assert!((samples[1].time - 1.0e-9 / 0.6).abs() < 1e-15);
    }

    #[test]
    fn test_ramp_fallback_rectangular_monotonic() {
        let model = driver_model();
        let mut rpt = VecReporter::new();
        let wave = SquareWave {
            on_time: 10e-9,
            off_time: 10e-9,
            cycles: 2,
            delay: 1e-9,
        };
        let samples = ramp_ku_kd(
            &model,
            Corner::Typ,
            &Stimulus::Rectangular(wave),
            &mut rpt,
        )
        .unwrap();
        assert!(samples.windows(2).all(|w| w[0].time < w[1].time));
        assert_eq!(samples.last().unwrap().ku, 0.0);
    }

    #[test]
    fn test_ramp_fallback_requires_usable_ramp() {
        let mut model = driver_model();
        model.ramp = Ramp::default();
        let mut rpt = VecReporter::new();
        let err = ramp_ku_kd(&model, Corner::Typ, &Stimulus::RisingEdge, &mut rpt)
            .unwrap_err();
        assert!(matches!(err, KibisError::UnusableRamp { .. }));
    }

    #[test]
    fn test_driver_deck_level0() {
        let model = driver_model();
        let synth = DeckSynthesizer::new();
        let mut rpt = VecReporter::new();
        let deck = synth
            .write_driver(
                &model,
                &bare_pin(),
                Corner::Typ,
                Accuracy::Level0,
                &Stimulus::RisingEdge,
                &mut rpt,
            )
            .unwrap();
        assert!(deck.contains(".SUBCKT STRONG_TYP_DRV POWER GND PIN"));
        assert!(deck.contains("Vku KU GND pwl("));
        assert!(deck.contains("Vkd KD GND pwl("));
        assert!(deck.contains("Bpu DIE POWER"));
        assert!(deck.contains("Bpd DIE GND"));
        assert!(deck.ends_with(".ENDS\n"));
    }

    #[test]
    fn test_driver_rejects_receiver_type() {
        let mut model = driver_model();
        model.model_type = ModelType::Input;
        let synth = DeckSynthesizer::new();
        let mut rpt = VecReporter::new();
        let err = synth
            .write_driver(
                &model,
                &bare_pin(),
                Corner::Typ,
                Accuracy::Level0,
                &Stimulus::RisingEdge,
                &mut rpt,
            )
            .unwrap_err();
        assert!(matches!(err, KibisError::UnsupportedModelType { .. }));
        assert_eq!(rpt.count(Severity::Error), 1);
    }

    #[test]
    fn test_device_deck_has_no_switching_stage() {
        let mut model = driver_model();
        model.model_type = ModelType::IO;
        model.gnd_clamp = Some(iv(&[(-3.3, -1.0), (0.0, 0.0)]));
        let synth = DeckSynthesizer::new();
        let mut rpt = VecReporter::new();
        let deck = synth
            .write_device(&model, &bare_pin(), Corner::Min, &mut rpt)
            .unwrap();
        assert!(deck.contains(".SUBCKT STRONG_MIN_DEV POWER GND PIN"));
        assert!(deck.contains("Bgc DIE GND"));
        assert!(!deck.contains("v(KU)"));
        assert!(!deck.contains("Bpu"));
    }

    #[test]
    fn test_recovery_deck_single_pair() {
        let model = driver_model();
        let pairs = matched_pairs(&model);
        let mut rpt = VecReporter::new();
        let deck = recovery_deck(
            &model,
            Corner::Typ,
            &pairs[..1],
            &Stimulus::RisingEdge,
            &mut rpt,
        );
        assert!(deck.contains("VDIE1 DIE1 0 pwl("));
        assert!(deck.contains("Br0 R0 0 V=(-v(IFX0)-v(ICC0)-v(IGC0)-v(IPC0))"));
        assert!(deck.contains("Bku KU 0 V=((v(R0)-v(IPD0))/(v(IPU0)-v(IPD0)))"));
        assert!(deck.contains("Bkd KD 0 V=(1-v(KU))"));
        assert!(deck.contains(&format!("write {TRACE_FILE} v(KU) v(KD)")));
        assert!(deck.contains(".tran"));
        assert!(deck.ends_with(".end\n"));
    }

    #[test]
    fn test_recovery_deck_two_pairs_solves_2x2() {
        let mut model = driver_model();
        let second = Fixture {
            r_fixture: 50.0,
            v_fixture: 3.3,
            ..Default::default()
        };
        model
            .rising_waveforms
            .push(vt(second, &[(0.0, 0.2), (1e-9, 3.1)]));
        model
            .falling_waveforms
            .push(vt(second, &[(0.0, 3.1), (1e-9, 0.2)]));
        let pairs = matched_pairs(&model);
        assert_eq!(pairs.len(), 2);
        let mut rpt = VecReporter::new();
        let deck = recovery_deck(
            &model,
            Corner::Typ,
            &pairs[..2],
            &Stimulus::RisingEdge,
            &mut rpt,
        );
        assert!(deck.contains("VDIE2 DIE2 0 pwl("));
        assert!(deck.contains("Bdet DET 0"));
        assert!(deck.contains("v(R1)"));
    }

    #[test]
    fn test_constrained_recovery_balances_die_current() {
        // hand evaluation of the single-pair solve at one static point:
        // die held at 1.6 V mid fall, fixture at 3.3 V over 50 ohm, no
        // clamps, so the fixture current is the whole residual
        let model = driver_model();
        let vcc = 3.3;
        let vdie = 1.6;
        let ifx = (vdie - 3.3) / 50.0;
        let ipu = model
            .pullup
            .as_ref()
            .unwrap()
            .interpolated_current(vcc - vdie, Corner::Typ);
        let ipd = model
            .pulldown
            .as_ref()
            .unwrap()
            .interpolated_current(vdie, Corner::Typ);
        let r = -ifx;
        let ku = (r - ipd) / (ipu - ipd);
        let kd = 1.0 - ku;
        // the recovered mix must satisfy KCL at the driver deck's die node
        assert!((ku * ipu + kd * ipd + ifx).abs() < 1e-12);
        // mid fall the pulldown network dominates
        assert!(kd > 0.8, "ku={ku} kd={kd}");
        assert!((0.0..=1.0).contains(&ku));
    }

    #[test]
    fn test_two_pair_solve_recovers_known_mix() {
        // forward-generate residuals from a known (ku, kd), then invert
        // them with the same determinant form the recovery deck emits
        let model = driver_model();
        let pu = model.pullup.as_ref().unwrap();
        let pd = model.pulldown.as_ref().unwrap();
        let (ku, kd) = (0.3, 0.7);
        let vcc = 3.3;
        // die voltages seen through the two fixtures at one time step
        let points = [1.6, 2.4];
        let mut ipu = [0.0; 2];
        let mut ipd = [0.0; 2];
        let mut r = [0.0; 2];
        for (i, vdie) in points.into_iter().enumerate() {
            ipu[i] = pu.interpolated_current(vcc - vdie, Corner::Typ);
            ipd[i] = pd.interpolated_current(vdie, Corner::Typ);
            r[i] = ku * ipu[i] + kd * ipd[i];
        }
        let det = ipu[0] * ipd[1] - ipu[1] * ipd[0];
        assert!(det.abs() > 1e-6);
        let got_ku = (r[0] * ipd[1] - r[1] * ipd[0]) / det;
        let got_kd = (ipu[0] * r[1] - ipu[1] * r[0]) / det;
        assert!((got_ku - ku).abs() < 1e-12);
        assert!((got_kd - kd).abs() < 1e-12);
    }

    #[test]
    fn test_square_wave_warns_when_edge_does_not_fit() {
        let model = driver_model();
        let pairs = matched_pairs(&model);
        let wave = SquareWave {
            on_time: 0.5e-9, // shorter than the 1 ns rising edge
            off_time: 10e-9,
            cycles: 1,
            delay: 0.0,
        };
        let mut rpt = VecReporter::new();
        let (card, duration) =
            square_wave_source("w", "DIE1", &pairs[0], Corner::Typ, &wave, &mut rpt);
        assert!(rpt.contains(Severity::Warning, "rising edge"));
        assert!(card.starts_with("Bw DIE1 0 V=("));
        // bias once, then one shifted rising and one shifted falling copy
        assert_eq!(card.matches("pwl(time-").count(), 2);
        assert!((duration - (10.5e-9 + 1e-9)).abs() < 1e-15);
    }

    #[test]
    fn test_iv_pwl_points() {
        let table = iv(&[(0.0, 0.0), (1.0, 0.05)]);
        let expr = iv_pwl(&table, Corner::Typ, "v(DIE)");
        assert!(expr.starts_with("pwl(v(DIE), "));
        assert!(expr.contains("1.000000e0,5.000000e-2"));
    }
}
