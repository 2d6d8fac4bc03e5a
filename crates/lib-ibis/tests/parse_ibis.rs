//! End-to-end parses of complete IBIS buffers.

use lib_ibis::model::PinLayout;
use lib_ibis::reporter::Severity;
use lib_ibis::{parse_ibis_file, IbisError, IbisFile, ModelType, VecReporter};
use lib_types::{is_na, Corner, Matrix};

const SAMPLE_IBS: &str = r"|  Synthetic buffer library
[IBIS Ver]   4.2
[File Name]  sample.ibs
[File Rev]   1.0
[Date]       August 30, 2026
[Source]     bench characterization
[Notes]      Two drive strengths
 plus a clock receiver.

[Component]  Chip
[Manufacturer] ACME Devices
[Package]
R_pkg  250.0m   225.0m   275.0m
L_pkg  15.0nH   12.0nH   18.0nH
C_pkg  1.8pF    1.5pF    2.1pF
[Pin]  signal_name  model_name  R_pin  L_pin  C_pin
1      DQ0          DriverSel   200.0m 5.0nH  2.0pF
2      CLK          ClockIn     NA     NA     NA
3      GND          GND         NA     NA     NA
[Diff Pin]
1   2   0.2   1.0n
[Package Model] SmallPkg

[Model Selector] DriverSel
Strong      Full strength driver
Weak        Half strength driver

[Model] Strong
Model_type I/O
Polarity Non-Inverting
Enable Active-High
Vinl 0.8
Vinh 2.0
C_comp 1.5pF 1.2pF 1.8pF
[Voltage Range]  3.3  3.0  3.6
[Pulldown]
-3.3   -90.0m  -80.0m  -100.0m
 0.0     0.0     0.0      0.0
 3.3    90.0m   80.0m   100.0m
[Pullup]
-3.3    90.0m   80.0m   100.0m
 0.0     0.0     0.0      0.0
 3.3   -90.0m  -80.0m  -100.0m
[GND Clamp]
-3.3    -2.0    -1.8    -2.2
-0.7   -10.0u   -8.0u  -12.0u
 0.0     0.0     0.0      0.0
[Ramp]
dV/dt_r  2.2/1.0n  1.8/1.2n  2.6/0.8n
dV/dt_f  2.2/1.0n  1.8/1.2n  2.6/0.8n
R_load 50
[Rising Waveform]
R_fixture 50.0
V_fixture 0.0
0.0n   0.2  0.1  0.3
1.0n   1.6  1.4  1.8
2.0n   3.1  2.9  3.3
[Falling Waveform]
R_fixture 50.0
V_fixture 3.3
0.0n   3.1  2.9  3.3
1.0n   1.6  1.4  1.8
2.0n   0.2  0.1  0.3

[Model] Weak
Model_type I/O
C_comp 1.5pF
[Voltage Range]  3.3  3.0  3.6
[Pulldown]
-3.3   -45.0m  -40.0m  -50.0m
 3.3    45.0m   40.0m   50.0m
[Pullup]
-3.3    45.0m   40.0m   50.0m
 3.3   -45.0m  -40.0m  -50.0m
[Ramp]
dV/dt_r  1.1/2.0n  0.9/2.4n  1.3/1.6n
dV/dt_f  1.1/2.0n  0.9/2.4n  1.3/1.6n

[Model] ClockIn
Model_type Input
Vinl 0.8
Vinh 2.0
C_comp 1.0pF
[Voltage Range]  3.3  3.0  3.6

[Define Package Model] SmallPkg
[Manufacturer] ACME Devices
[OEM] ACME
[Description] 3-pin test package
[Number Of Pins] 3
[Pin Numbers]
1 2 3
[Model Data]
[Resistance Matrix] Full_matrix
0.25  0.01  0.005
0.25  0.01
0.25
[Inductance Matrix] Banded_matrix
[Bandwidth] 2
15n  2n
15n  2n
15n  2n
[Capacitance Matrix] Sparse_matrix
[Row] 1
1  1.8p
[Row] 2
2  1.8p   3  0.1p
[Row] 3
3  1.8p
[End Model Data]
[End Package Model]
[End]
";

fn parse(source: &str) -> (IbisFile, VecReporter, bool) {
    let mut rpt = VecReporter::new();
    let outcome = parse_ibis_file(source, &mut rpt).expect("no hard failure");
    (outcome.file, rpt, outcome.ok)
}

#[test]
fn test_full_sample_parses_clean() {
    let (file, rpt, ok) = parse(SAMPLE_IBS);
    assert_eq!(rpt.count(Severity::Error), 0, "{:?}", rpt.messages);
    assert!(ok);
    assert_eq!(file.components.len(), 1);
    assert_eq!(file.model_selectors.len(), 1);
    assert_eq!(file.models.len(), 3);
    assert_eq!(file.package_models.len(), 1);
}

#[test]
fn test_header_and_notes() {
    let (file, _, _) = parse(SAMPLE_IBS);
    assert!((file.header.ibis_version - 4.2).abs() < 1e-12);
    assert_eq!(file.header.file_name, "sample.ibs");
    assert_eq!(file.header.source, "bench characterization");
    assert_eq!(
        file.header.notes,
        "Two drive strengths\n plus a clock receiver."
    );
}

#[test]
fn test_component_records() {
    let (file, _, _) = parse(SAMPLE_IBS);
    let comp = &file.components[0];
    assert_eq!(comp.name, "Chip");
    assert_eq!(comp.manufacturer, "ACME Devices");
    assert_eq!(comp.pin_layout, PinLayout::SixColumn);
    assert_eq!(comp.package_model.as_deref(), Some("SmallPkg"));
    assert!((comp.package.r_pkg.typ - 0.25).abs() < 1e-12);
    assert!((comp.package.c_pkg.max - 2.1e-12).abs() < 1e-24);

    // dummy header row plus three data rows
    assert_eq!(comp.pins.len(), 4);
    assert!(comp.pins[0].dummy);
    let dq0 = &comp.pins[1];
    assert_eq!(dq0.number, "1");
    assert_eq!(dq0.model, "DriverSel");
    assert!((dq0.l_pin - 5.0e-9).abs() < 1e-21);
    assert!(is_na(comp.pins[2].r_pin));

    assert_eq!(comp.diff_pins.len(), 1);
    let dp = &comp.diff_pins[0];
    assert_eq!((dp.pin.as_str(), dp.inv_pin.as_str()), ("1", "2"));
    assert!((dp.vdiff - 0.2).abs() < 1e-12);
    assert!((dp.tdelay_typ - 1.0e-9).abs() < 1e-21);
    assert!(is_na(dp.tdelay_min));
}

#[test]
fn test_model_selector_and_models() {
    let (file, _, _) = parse(SAMPLE_IBS);
    let sel = file.selector_by_name("driversel").expect("case-insensitive");
    assert_eq!(sel.entries.len(), 2);
    assert_eq!(sel.entries[0].model, "Strong");
    assert_eq!(sel.entries[0].description, "Full strength driver");

    let (_, strong) = file.model_by_name("Strong").unwrap();
    assert_eq!(strong.model_type, ModelType::IO);
    assert!((strong.c_comp.typ - 1.5e-12).abs() < 1e-24);
    assert!((strong.voltage_range.unwrap().max - 3.6).abs() < 1e-12);
    assert_eq!(strong.pulldown.as_ref().unwrap().entries.len(), 3);
    assert_eq!(strong.gnd_clamp.as_ref().unwrap().entries.len(), 3);
    assert!(strong.power_clamp.is_none());
    assert_eq!(strong.rising_waveforms.len(), 1);
    assert_eq!(strong.falling_waveforms.len(), 1);
    let wfm = &strong.rising_waveforms[0];
    assert!((wfm.fixture.r_fixture - 50.0).abs() < 1e-12);
    assert!((wfm.fixture.v_fixture - 0.0).abs() < 1e-12);
    assert_eq!(wfm.entries.len(), 3);
    assert!((wfm.entries[2].voltage.value(Corner::Min) - 2.9).abs() < 1e-12);

    let rising = strong.ramp.rising;
    assert!((rising.typ.slope() - 2.2e9).abs() < 1e-3);

    // Weak's C_comp has only a typ column
    let (_, weak) = file.model_by_name("Weak").unwrap();
    assert!(is_na(weak.c_comp.min));
}

#[test]
fn test_package_model_matrices() {
    let (file, _, _) = parse(SAMPLE_IBS);
    let pm = &file.package_models[0];
    assert_eq!(pm.name, "SmallPkg");
    assert_eq!(pm.number_of_pins, 3);
    assert_eq!(pm.pin_numbers, ["1", "2", "3"]);

    let r = pm.resistance.as_ref().unwrap();
    assert!(matches!(r, Matrix::Full(_)));
    assert!((r.get(0, 0) - 0.25).abs() < 1e-12);
    assert!((r.get(2, 0) - 0.005).abs() < 1e-12); // symmetric

    let l = pm.inductance.as_ref().unwrap();
    assert!(matches!(l, Matrix::Banded(_)));
    assert!((l.get(1, 1) - 15e-9).abs() < 1e-21);
    assert!((l.get(2, 1) - 2e-9).abs() < 1e-21);
    assert_eq!(l.get(0, 2), 0.0); // outside band

    let c = pm.capacitance.as_ref().unwrap();
    assert!(matches!(c, Matrix::Sparse(_)));
    assert!((c.get(1, 2) - 0.1e-12).abs() < 1e-24);
    assert_eq!(c.get(0, 1), 0.0);
}

#[test]
fn test_malformed_row_is_tolerated() {
    // a bad pulldown row degrades status but the rest still loads
    let source = SAMPLE_IBS.replace(
        " 0.0     0.0     0.0      0.0\n 3.3    90.0m   80.0m   100.0m\n[Pullup]",
        " 0.0     bogus   0.0      0.0\n 3.3    90.0m   80.0m   100.0m\n[Pullup]",
    );
    let (file, rpt, ok) = parse(&source);
    assert!(!ok);
    assert!(rpt.count(Severity::Error) >= 1);
    let (_, strong) = file.model_by_name("Strong").unwrap();
    // the bad row is dropped, its neighbors survive
    assert_eq!(strong.pulldown.as_ref().unwrap().entries.len(), 2);
    assert_eq!(file.models.len(), 3);
}

#[test]
fn test_matrix_row_overflow_reported() {
    let source = SAMPLE_IBS.replace(
        "0.25  0.01  0.005\n0.25  0.01\n0.25",
        "0.25  0.01  0.005\n0.25  0.01  0.5\n0.25",
    );
    let (file, rpt, ok) = parse(&source);
    assert!(!ok);
    assert!(rpt.count(Severity::Error) >= 1);
    // rows after the overflow still land
    let r = file.package_models[0].resistance.as_ref().unwrap();
    assert!((r.get(2, 2) - 0.25).abs() < 1e-12);
}

#[test]
fn test_keyword_spelling_equivalence() {
    let source = SAMPLE_IBS
        .replace("[Voltage Range]", "[voltage_range]")
        .replace("[Model Selector]", "[MODEL_SELECTOR]")
        .replace("[End Package Model]", "[End_Package_Model]");
    let (file, rpt, _) = parse(&source);
    assert_eq!(rpt.count(Severity::Error), 0, "{:?}", rpt.messages);
    assert!(file.models[0].voltage_range.is_some());
}

#[test]
fn test_unknown_keyword_reported_with_context() {
    let source = SAMPLE_IBS.replace("[Diff Pin]\n1   2   0.2   1.0n\n", "[Bogus Thing]\n");
    let (_, rpt, ok) = parse(&source);
    assert!(!ok);
    assert!(rpt.contains(Severity::Error, "bogus_thing"));
    assert!(rpt.contains(Severity::Error, "component context"));
}

#[test]
fn test_line_too_long_aborts() {
    let mut source = String::from("[IBIS Ver] 4.2\n");
    source.push_str(&"x".repeat(4000));
    source.push('\n');
    let mut rpt = VecReporter::new();
    let err = parse_ibis_file(&source, &mut rpt).unwrap_err();
    assert!(matches!(err, IbisError::LineTooLong { line: 2, .. }));
}

#[test]
fn test_missing_end_aborts() {
    let truncated = &SAMPLE_IBS[..SAMPLE_IBS.len() - "[End]\n".len()];
    let mut rpt = VecReporter::new();
    let err = parse_ibis_file(truncated, &mut rpt).unwrap_err();
    assert!(matches!(err, IbisError::MissingEnd));
}

#[test]
fn test_incomplete_records_degrade_status() {
    let source = "\
[IBIS Ver] 4.2
[File Name] test.ibs
[File Rev] 1.0
[Model] Broken
Model_type Output
[End]
";
    let (file, rpt, ok) = parse(source);
    assert!(!ok);
    assert!(rpt.contains(Severity::Error, "Broken"));
    // the record is still present for salvage
    assert_eq!(file.models.len(), 1);
}
