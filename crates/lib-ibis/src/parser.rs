//! Recursive-descent driver over the line lexer.
//!
//! The parser keeps two pieces of state between lines: the current context
//! (which kind of record is open) and a continuation sub-state (which
//! multi-line construct the previous keyword armed). Each new line either
//! carries a `[Keyword]`, which is dispatched to a per-context handler, or
//! is handed to the active continuation handler.
//!
//! The loader is tolerant by design: a malformed statement is reported
//! through the [`Reporter`] and that line's status goes false, but parsing
//! continues — the goal is maximum salvage of a possibly-imperfect
//! real-world IBIS file. The overall result is the logical AND of every
//! per-line status. Only an oversized line or a buffer that ends before
//! `END` abort the loop.

use crate::error::IbisError;
use crate::lexer::{parse_double, LexError, LineReader};
use crate::model::*;
use crate::reporter::{Reporter, Severity};
use lib_types::{
    BandedMatrix, Dvdt, FullMatrix, Matrix, SparseMatrix, TypMinMax, NA,
};

/// Result of a parse session: the document plus the AND of all per-line
/// statuses. A `true` status does not guarantee semantic completeness —
/// `check()` diagnostics are visible only through the reporter.
#[derive(Debug)]
pub struct ParseOutcome {
    pub file: IbisFile,
    pub ok: bool,
}

/// Parse an IBIS file from an in-memory buffer.
///
/// Hard failures (oversized line, missing `END`) return `Err`; everything
/// else is reported and reflected in [`ParseOutcome::ok`].
pub fn parse_ibis_file(
    source: &str,
    reporter: &mut dyn Reporter,
) -> Result<ParseOutcome, IbisError> {
    Parser::new(source, reporter).parse()
}

/// Which kind of record is currently open.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Context {
    Header,
    Component,
    ModelSelector,
    Model,
    PackageModel,
    PackageModelData,
    End,
}

impl Context {
    fn name(&self) -> &'static str {
        match self {
            Context::Header => "header",
            Context::Component => "component",
            Context::ModelSelector => "model selector",
            Context::Model => "model",
            Context::PackageModel => "package model",
            Context::PackageModelData => "package model data",
            Context::End => "end",
        }
    }
}

/// Multi-line string destinations.
#[derive(Clone, Copy, Debug)]
enum StringTarget {
    Notes,
    Disclaimer,
    Copyright,
}

/// Which I-V table of the open model is being filled.
#[derive(Clone, Copy, Debug)]
enum IvKind {
    Pulldown,
    Pullup,
    GndClamp,
    PowerClamp,
}

/// Waveform edge direction.
#[derive(Clone, Copy, Debug)]
enum Edge {
    Rising,
    Falling,
}

/// Which package matrix is being filled.
#[derive(Clone, Copy, Debug)]
enum MatrixKind {
    Resistance,
    Inductance,
    Capacitance,
}

/// The multi-line construct armed by the previous keyword line.
#[derive(Clone, Copy, Debug, Default)]
enum Continuation {
    #[default]
    None,
    Str(StringTarget),
    PackageRlc,
    PinTable,
    PinMapping,
    DiffPin,
    SelectorEntry,
    ModelSubparam,
    IvTable(IvKind),
    Ramp,
    Waveform(Edge),
    PackagePins,
    Matrix,
}

struct Parser<'a, 'r> {
    lexer: LineReader<'a>,
    reporter: &'r mut dyn Reporter,
    context: Context,
    continuation: Continuation,
    file: IbisFile,
    status: bool,
    header_checked: bool,
    /// Whether the open `[Define Package Model]` was entered from a
    /// component (standalone `.pkg` files have none).
    pm_from_component: bool,
    /// Matrix being filled inside `[Model Data]`, if any.
    active_matrix: Option<MatrixKind>,
    /// Current matrix row, 0-based (the format counts rows from 1).
    matrix_row: usize,
}

impl<'a, 'r> Parser<'a, 'r> {
    fn new(source: &'a str, reporter: &'r mut dyn Reporter) -> Self {
        Self {
            lexer: LineReader::new(source),
            reporter,
            context: Context::Header,
            continuation: Continuation::None,
            file: IbisFile::default(),
            status: true,
            header_checked: false,
            pm_from_component: false,
            active_matrix: None,
            matrix_row: 0,
        }
    }

    fn parse(mut self) -> Result<ParseOutcome, IbisError> {
        loop {
            if !self.lexer.next_line()? {
                self.reporter
                    .report("end of file reached before END", Severity::Error);
                return Err(IbisError::MissingEnd);
            }
            let ok = self.process_line();
            self.status &= ok;
            if self.context == Context::End {
                break;
            }
        }
        Ok(ParseOutcome {
            file: self.file,
            ok: self.status,
        })
    }

    fn err(&mut self, message: &str) -> bool {
        let line = self.lexer.line_number();
        self.reporter
            .report(&format!("line {line}: {message}"), Severity::Error);
        false
    }

    fn warn(&mut self, message: &str) {
        let line = self.lexer.line_number();
        self.reporter
            .report(&format!("line {line}: {message}"), Severity::Warning);
    }

    fn process_line(&mut self) -> bool {
        if self.lexer.at_eol() {
            return true;
        }
        match self.lexer.keyword() {
            Err(LexError::UnterminatedKeyword) => self.err("malformed keyword bracket"),
            Err(LexError::InvalidCommentChar) => self.err("invalid comment character"),
            Ok(Some(kw)) => self.dispatch_keyword(&kw),
            Ok(None) => {
                // free text swallows everything, including a bare END
                if let Continuation::Str(target) = self.continuation {
                    return self.append_string_line(target);
                }
                let first = self.lexer.read_word();
                // the grammar quirk: the terminal END carries no brackets
                if first.eq_ignore_ascii_case("end") && self.lexer.at_eol() {
                    return self.finish(true);
                }
                self.dispatch_continuation(first)
            }
        }
    }

    // ------------------------------------------------------------------
    // keyword dispatch

    fn dispatch_keyword(&mut self, kw: &str) -> bool {
        match kw {
            // record-opening keywords transition from any context
            "component" | "model" | "model_selector" | "define_package_model" => {
                self.open_record(kw)
            }
            "end" => self.finish(false),
            "comment_char" => match self.lexer.change_comment_char() {
                Ok(_) => {
                    self.continuation = Continuation::None;
                    true
                }
                Err(_) => {
                    self.continuation = Continuation::None;
                    self.err("invalid [Comment Char] directive")
                }
            },
            _ => {
                self.continuation = Continuation::None;
                match self.context {
                    Context::Header => self.header_keyword(kw),
                    Context::Component => self.component_keyword(kw),
                    Context::ModelSelector => self.unknown_keyword(kw),
                    Context::Model => self.model_keyword(kw),
                    Context::PackageModel => self.package_model_keyword(kw),
                    Context::PackageModelData => self.package_model_data_keyword(kw),
                    Context::End => self.unknown_keyword(kw),
                }
            }
        }
    }

    fn unknown_keyword(&mut self, kw: &str) -> bool {
        let context = self.context.name();
        self.err(&format!("unknown keyword [{kw}] in {context} context"))
    }

    /// Close whichever record is open, running its `check()`. Failures are
    /// reported but never abort parsing.
    fn close_open_record(&mut self) -> bool {
        let mut ok = true;
        if !self.header_checked && self.context != Context::End {
            ok &= self.file.header.check(self.reporter);
            self.header_checked = true;
        }
        match self.context {
            Context::Component => {
                if let Some(c) = self.file.components.last() {
                    ok &= c.check(self.reporter);
                }
            }
            Context::ModelSelector => {
                if let Some(s) = self.file.model_selectors.last() {
                    ok &= s.check(self.reporter);
                }
            }
            Context::Model => {
                if let Some(m) = self.file.models.last() {
                    ok &= m.check(self.reporter);
                }
            }
            Context::PackageModel | Context::PackageModelData => {
                if let Some(p) = self.file.package_models.last() {
                    ok &= p.check(self.reporter);
                }
            }
            Context::Header | Context::End => {}
        }
        ok
    }

    fn finish(&mut self, _bare: bool) -> bool {
        let ok = self.close_open_record();
        self.context = Context::End;
        self.continuation = Continuation::None;
        ok
    }

    fn open_record(&mut self, kw: &str) -> bool {
        let mut ok = self.close_open_record();
        // record names may contain spaces ("16 Meg DRAM")
        let name = self.lexer.read_string().to_string();
        if name.is_empty() {
            ok &= self.err(&format!("[{kw}] without a name"));
        }
        self.active_matrix = None;
        match kw {
            "component" => {
                self.file.components.push(Component {
                    name,
                    ..Default::default()
                });
                self.context = Context::Component;
                self.continuation = Continuation::None;
            }
            "model" => {
                self.file.models.push(Model {
                    name,
                    ..Default::default()
                });
                self.context = Context::Model;
                self.continuation = Continuation::ModelSubparam;
            }
            "model_selector" => {
                self.file.model_selectors.push(ModelSelector {
                    name,
                    ..Default::default()
                });
                self.context = Context::ModelSelector;
                self.continuation = Continuation::SelectorEntry;
            }
            "define_package_model" => {
                self.pm_from_component = self.context == Context::Component;
                self.file.package_models.push(PackageModel {
                    name,
                    ..Default::default()
                });
                self.context = Context::PackageModel;
                self.continuation = Continuation::None;
            }
            _ => unreachable!("open_record called for [{kw}]"),
        }
        ok
    }

    // ------------------------------------------------------------------
    // header context

    fn header_keyword(&mut self, kw: &str) -> bool {
        match kw {
            "ibis_ver" => {
                let word = self.lexer.read_word();
                match parse_double(word) {
                    Some(v) if !v.is_nan() => {
                        self.file.header.ibis_version = v;
                        if v > MAX_IBIS_VERSION {
                            return self.err(&format!(
                                "IBIS version {v} is newer than supported {MAX_IBIS_VERSION}"
                            ));
                        }
                        true
                    }
                    _ => self.err("invalid [IBIS Ver] value"),
                }
            }
            "file_name" => {
                self.file.header.file_name = self.lexer.read_word().to_string();
                true
            }
            "file_rev" => {
                self.file.header.file_rev = self.lexer.read_word().to_string();
                true
            }
            "date" => {
                self.file.header.date = self.lexer.read_string().to_string();
                true
            }
            "source" => {
                self.file.header.source = self.lexer.read_string().to_string();
                true
            }
            "notes" => self.start_string(StringTarget::Notes),
            "disclaimer" => self.start_string(StringTarget::Disclaimer),
            "copyright" => self.start_string(StringTarget::Copyright),
            _ => self.unknown_keyword(kw),
        }
    }

    fn start_string(&mut self, target: StringTarget) -> bool {
        let chunk = self.lexer.read_string().to_string();
        *self.string_target_mut(target) = chunk;
        self.continuation = Continuation::Str(target);
        true
    }

    fn string_target_mut(&mut self, target: StringTarget) -> &mut String {
        match target {
            StringTarget::Notes => &mut self.file.header.notes,
            StringTarget::Disclaimer => &mut self.file.header.disclaimer,
            StringTarget::Copyright => &mut self.file.header.copyright,
        }
    }

    fn append_string_line(&mut self, target: StringTarget) -> bool {
        let text = self.lexer.read_verbatim();
        let dest = self.string_target_mut(target);
        if !dest.is_empty() {
            dest.push('\n');
        }
        dest.push_str(text);
        true
    }

    // ------------------------------------------------------------------
    // component context

    fn component_keyword(&mut self, kw: &str) -> bool {
        match kw {
            "manufacturer" => {
                let text = self.lexer.read_string().to_string();
                self.component_mut().manufacturer = text;
                true
            }
            "package" => {
                self.continuation = Continuation::PackageRlc;
                true
            }
            "pin" => self.start_pin_table(),
            "pin_mapping" => {
                self.continuation = Continuation::PinMapping;
                true
            }
            "diff_pin" => {
                self.continuation = Continuation::DiffPin;
                true
            }
            "package_model" => {
                // must match a [Define Package Model] name, spaces included
                let name = self.lexer.read_string().to_string();
                if name.is_empty() {
                    return self.err("[Package Model] without a name");
                }
                self.component_mut().package_model = Some(name);
                true
            }
            _ => self.unknown_keyword(kw),
        }
    }

    fn component_mut(&mut self) -> &mut Component {
        // a Component context always has an open component
        self.file.components.last_mut().expect("open component")
    }

    /// The `[Pin]` keyword line carries the column-header row. A 3-column
    /// layout lists signal_name/model_name; a 6-column layout adds
    /// R_pin/L_pin/C_pin. The header row is stored as a dummy pin and the
    /// resolved layout drives how every following row is parsed.
    fn start_pin_table(&mut self) -> bool {
        let words = self.read_words();
        self.continuation = Continuation::PinTable;
        let layout = match words.len() {
            0 | 2 => PinLayout::ThreeColumn,
            5 => PinLayout::SixColumn,
            _ => {
                let n = words.len();
                self.component_mut().pin_layout = PinLayout::ThreeColumn;
                return self.err(&format!("[Pin] header row has {n} columns, expected 2 or 5"));
            }
        };
        let component = self.component_mut();
        component.pin_layout = layout;
        if !words.is_empty() {
            component.pins.push(Pin {
                signal: words[0].to_string(),
                model: words[1].to_string(),
                dummy: true,
                ..Default::default()
            });
        }
        true
    }

    // ------------------------------------------------------------------
    // model context

    fn model_keyword(&mut self, kw: &str) -> bool {
        match kw {
            "voltage_range" => self.read_model_triple(|m, v| m.voltage_range = Some(v)),
            "temperature_range" => self.read_model_triple(|m, v| m.temperature_range = Some(v)),
            "pullup_reference" => self.read_model_triple(|m, v| m.pullup_reference = Some(v)),
            "pulldown_reference" => self.read_model_triple(|m, v| m.pulldown_reference = Some(v)),
            "gnd_clamp_reference" => self.read_model_triple(|m, v| m.gnd_clamp_reference = Some(v)),
            "power_clamp_reference" => {
                self.read_model_triple(|m, v| m.power_clamp_reference = Some(v))
            }
            "pulldown" => self.start_iv_table(IvKind::Pulldown),
            "pullup" => self.start_iv_table(IvKind::Pullup),
            "gnd_clamp" => self.start_iv_table(IvKind::GndClamp),
            "power_clamp" => self.start_iv_table(IvKind::PowerClamp),
            "ramp" => {
                self.continuation = Continuation::Ramp;
                true
            }
            "rising_waveform" => self.start_waveform(Edge::Rising),
            "falling_waveform" => self.start_waveform(Edge::Falling),
            _ => self.unknown_keyword(kw),
        }
    }

    fn model_mut(&mut self) -> &mut Model {
        self.file.models.last_mut().expect("open model")
    }

    fn read_model_triple(&mut self, set: fn(&mut Model, TypMinMax)) -> bool {
        match self.read_triple() {
            Some(v) => {
                set(self.model_mut(), v);
                true
            }
            None => self.err("expected typ/min/max values"),
        }
    }

    fn start_iv_table(&mut self, kind: IvKind) -> bool {
        let model = self.model_mut();
        let slot = match kind {
            IvKind::Pulldown => &mut model.pulldown,
            IvKind::Pullup => &mut model.pullup,
            IvKind::GndClamp => &mut model.gnd_clamp,
            IvKind::PowerClamp => &mut model.power_clamp,
        };
        slot.get_or_insert_with(IvTable::default);
        self.continuation = Continuation::IvTable(kind);
        true
    }

    fn start_waveform(&mut self, edge: Edge) -> bool {
        let model = self.model_mut();
        match edge {
            Edge::Rising => model.rising_waveforms.push(VtTable::default()),
            Edge::Falling => model.falling_waveforms.push(VtTable::default()),
        }
        self.continuation = Continuation::Waveform(edge);
        true
    }

    // ------------------------------------------------------------------
    // package model contexts

    fn package_model_keyword(&mut self, kw: &str) -> bool {
        match kw {
            "manufacturer" => {
                let text = self.lexer.read_string().to_string();
                self.package_model_mut().manufacturer = text;
                true
            }
            "oem" => {
                let text = self.lexer.read_string().to_string();
                self.package_model_mut().oem = text;
                true
            }
            "description" => {
                let text = self.lexer.read_string().to_string();
                self.package_model_mut().description = text;
                true
            }
            "number_of_pins" => {
                let word = self.lexer.read_word();
                match word.parse::<usize>() {
                    Ok(n) if n > 0 => {
                        self.package_model_mut().number_of_pins = n;
                        true
                    }
                    _ => self.err("invalid [Number Of Pins] value"),
                }
            }
            "pin_numbers" => {
                self.continuation = Continuation::PackagePins;
                true
            }
            "model_data" => {
                self.context = Context::PackageModelData;
                self.active_matrix = None;
                true
            }
            "end_package_model" => {
                let ok = {
                    let pm = self.file.package_models.last().expect("open package model");
                    pm.check(self.reporter)
                };
                self.context = if self.pm_from_component {
                    Context::Component
                } else {
                    Context::Header
                };
                self.active_matrix = None;
                ok
            }
            _ => self.unknown_keyword(kw),
        }
    }

    fn package_model_mut(&mut self) -> &mut PackageModel {
        self.file
            .package_models
            .last_mut()
            .expect("open package model")
    }

    fn package_model_data_keyword(&mut self, kw: &str) -> bool {
        match kw {
            "resistance_matrix" => self.start_matrix(MatrixKind::Resistance),
            "inductance_matrix" => self.start_matrix(MatrixKind::Inductance),
            "capacitance_matrix" => self.start_matrix(MatrixKind::Capacitance),
            "bandwidth" => {
                self.continuation = Continuation::Matrix;
                let word = self.lexer.read_word();
                let bandwidth = match word.parse::<usize>() {
                    Ok(n) if n > 0 => n,
                    _ => return self.err("invalid [Bandwidth] value"),
                };
                match self.active_matrix_mut() {
                    Some(Matrix::Banded(m)) => {
                        m.set_bandwidth(bandwidth);
                        true
                    }
                    _ => self.err("[Bandwidth] outside a banded matrix"),
                }
            }
            "row" => {
                self.continuation = Continuation::Matrix;
                let word = self.lexer.read_word();
                match word.parse::<usize>() {
                    Ok(n) if n > 0 => {
                        self.matrix_row = n - 1;
                        true
                    }
                    _ => self.err("invalid [Row] value"),
                }
            }
            "end_model_data" => {
                self.context = Context::PackageModel;
                self.active_matrix = None;
                true
            }
            _ => self.unknown_keyword(kw),
        }
    }

    /// `[xxx_Matrix]` names the encoding on the keyword line; that choice
    /// fixes the per-row parsing rule for every following data line.
    fn start_matrix(&mut self, kind: MatrixKind) -> bool {
        let encoding = self.lexer.read_word().to_lowercase();
        let dim = self.package_model_mut().number_of_pins;
        let matrix = match encoding.as_str() {
            "banded_matrix" => Matrix::Banded(BandedMatrix::new(dim)),
            "full_matrix" => Matrix::Full(FullMatrix::new(dim)),
            "sparse_matrix" => Matrix::Sparse(SparseMatrix::new(dim)),
            other => {
                return self.err(&format!("unknown matrix encoding '{other}'"));
            }
        };
        let pm = self.package_model_mut();
        match kind {
            MatrixKind::Resistance => pm.resistance = Some(matrix),
            MatrixKind::Inductance => pm.inductance = Some(matrix),
            MatrixKind::Capacitance => pm.capacitance = Some(matrix),
        }
        self.active_matrix = Some(kind);
        self.matrix_row = 0;
        self.continuation = Continuation::Matrix;
        true
    }

    fn active_matrix_mut(&mut self) -> Option<&mut Matrix> {
        let kind = self.active_matrix?;
        let pm = self.file.package_models.last_mut()?;
        match kind {
            MatrixKind::Resistance => pm.resistance.as_mut(),
            MatrixKind::Inductance => pm.inductance.as_mut(),
            MatrixKind::Capacitance => pm.capacitance.as_mut(),
        }
    }

    // ------------------------------------------------------------------
    // continuation dispatch

    fn dispatch_continuation(&mut self, first: &'a str) -> bool {
        match self.continuation {
            Continuation::None => self.err("unexpected data line"),
            Continuation::Str(_) => {
                unreachable!("string continuations are consumed before the word scan")
            }
            Continuation::PackageRlc => self.package_rlc_row(first),
            Continuation::PinTable => self.pin_row(first),
            Continuation::PinMapping => self.pin_mapping_row(first),
            Continuation::DiffPin => self.diff_pin_row(first),
            Continuation::SelectorEntry => {
                let description = self.lexer.read_string().to_string();
                let selector = self
                    .file
                    .model_selectors
                    .last_mut()
                    .expect("open model selector");
                selector.entries.push(ModelSelectorEntry {
                    model: first.to_string(),
                    description,
                });
                true
            }
            Continuation::ModelSubparam => self.model_subparam(first),
            Continuation::IvTable(kind) => self.iv_row(kind, first),
            Continuation::Ramp => self.ramp_row(first),
            Continuation::Waveform(edge) => self.waveform_row(edge, first),
            Continuation::PackagePins => {
                let mut ok = true;
                let mut words = vec![first];
                words.extend(self.read_words());
                let declared = self.package_model_mut().number_of_pins;
                for word in words {
                    let pm = self.package_model_mut();
                    if pm.pin_numbers.len() >= declared {
                        ok = self.err("more [Pin Numbers] entries than declared pins");
                        break;
                    }
                    pm.pin_numbers.push(word.to_string());
                }
                ok
            }
            Continuation::Matrix => self.matrix_data_row(first),
        }
    }

    /// `[Package]` is a short table read row-by-row: parameter name then
    /// up to Typ/Min/Max columns.
    fn package_rlc_row(&mut self, first: &'a str) -> bool {
        let Some(value) = self.read_triple() else {
            return self.err("invalid [Package] row");
        };
        let component = self.component_mut();
        match first.to_lowercase().as_str() {
            "r_pkg" => component.package.r_pkg = value,
            "l_pkg" => component.package.l_pkg = value,
            "c_pkg" => component.package.c_pkg = value,
            other => {
                let msg = format!("unknown [Package] parameter '{other}'");
                return self.err(&msg);
            }
        }
        true
    }

    fn pin_row(&mut self, first: &'a str) -> bool {
        let mut words = vec![first];
        words.extend(self.read_words());
        let layout = self.component_mut().pin_layout;
        let expected = match layout {
            PinLayout::ThreeColumn => 3,
            PinLayout::SixColumn => 6,
        };
        if words.len() != expected {
            let n = words.len();
            return self.err(&format!("[Pin] row has {n} columns, expected {expected}"));
        }
        let mut pin = Pin {
            number: words[0].to_string(),
            signal: words[1].to_string(),
            model: words[2].to_string(),
            ..Default::default()
        };
        if layout == PinLayout::SixColumn {
            for (slot, word) in [&mut pin.r_pin, &mut pin.l_pin, &mut pin.c_pin]
                .into_iter()
                .zip(&words[3..])
            {
                match parse_double(word) {
                    Some(v) => *slot = v,
                    None => {
                        return self.err(&format!("invalid pin parasitic '{word}'"));
                    }
                }
            }
        }
        self.component_mut().pins.push(pin);
        true
    }

    fn pin_mapping_row(&mut self, first: &'a str) -> bool {
        let mut words = vec![first];
        words.extend(self.read_words());
        if words.len() < 3 || words.len() > 6 {
            let n = words.len();
            return self.err(&format!("[Pin Mapping] row has {n} columns, expected 3 to 6"));
        }
        let get = |i: usize| words.get(i).copied().unwrap_or("").to_string();
        self.component_mut().pin_mappings.push(PinMapping {
            pin: get(0),
            pulldown_ref: get(1),
            pullup_ref: get(2),
            gnd_clamp_ref: get(3),
            power_clamp_ref: get(4),
            ext_ref: get(5),
        });
        true
    }

    fn diff_pin_row(&mut self, first: &'a str) -> bool {
        let mut words = vec![first];
        words.extend(self.read_words());
        if words.len() < 2 {
            return self.err("[Diff Pin] row needs at least pin and inv_pin");
        }
        let mut row = DiffPin {
            pin: words[0].to_string(),
            inv_pin: words[1].to_string(),
            ..Default::default()
        };
        let numeric = [
            &mut row.vdiff,
            &mut row.tdelay_typ,
            &mut row.tdelay_min,
            &mut row.tdelay_max,
        ];
        for (slot, word) in numeric.into_iter().zip(&words[2..]) {
            match parse_double(word) {
                Some(v) => *slot = v,
                None => {
                    return self.err(&format!("invalid [Diff Pin] value '{word}'"));
                }
            }
        }
        self.component_mut().diff_pins.push(row);
        true
    }

    /// Model sub-parameters are matched by exact literal name, mirroring
    /// the fixed-column IBIS grammar: the first word must equal one of the
    /// declared names, not merely start with it.
    fn model_subparam(&mut self, first: &'a str) -> bool {
        const DOUBLE_PARAMS: &[(&str, fn(&mut Model, f64))] = &[
            ("vinl", |m, v| m.vinl = v),
            ("vinh", |m, v| m.vinh = v),
            ("vref", |m, v| m.vref = v),
            ("rref", |m, v| m.rref = v),
            ("cref", |m, v| m.cref = v),
            ("vmeas", |m, v| m.vmeas = v),
        ];
        let lower = first.to_lowercase();
        match lower.as_str() {
            "model_type" => {
                let word = self.lexer.read_word();
                match ModelType::from_keyword(word) {
                    Some(t) => {
                        self.model_mut().model_type = t;
                        true
                    }
                    None => self.err(&format!("unknown Model_type '{word}'")),
                }
            }
            "polarity" => {
                let word = self.lexer.read_word().to_lowercase();
                let polarity = match word.as_str() {
                    "non-inverting" => Polarity::NonInverting,
                    "inverting" => Polarity::Inverting,
                    _ => return self.err(&format!("unknown Polarity '{word}'")),
                };
                self.model_mut().polarity = polarity;
                true
            }
            "enable" => {
                let word = self.lexer.read_word().to_lowercase();
                let enable = match word.as_str() {
                    "active-high" => Enable::ActiveHigh,
                    "active-low" => Enable::ActiveLow,
                    _ => return self.err(&format!("unknown Enable '{word}'")),
                };
                self.model_mut().enable = enable;
                true
            }
            "c_comp" => match self.read_triple() {
                Some(v) => {
                    self.model_mut().c_comp = v;
                    true
                }
                None => self.err("invalid C_comp value"),
            },
            _ => {
                if let Some((_, set)) = DOUBLE_PARAMS.iter().find(|(name, _)| *name == lower) {
                    let word = self.lexer.read_word();
                    return match parse_double(word) {
                        Some(v) => {
                            set(self.model_mut(), v);
                            true
                        }
                        None => self.err(&format!("invalid value for '{first}'")),
                    };
                }
                self.err(&format!("unknown model sub-parameter '{first}'"))
            }
        }
    }

    fn iv_row(&mut self, kind: IvKind, first: &'a str) -> bool {
        let Some(voltage) = parse_double(first) else {
            return self.err(&format!("invalid I-V table voltage '{first}'"));
        };
        let Some(current) = self.read_triple() else {
            return self.err("invalid I-V table currents");
        };
        let model = self.model_mut();
        let table = match kind {
            IvKind::Pulldown => model.pulldown.as_mut(),
            IvKind::Pullup => model.pullup.as_mut(),
            IvKind::GndClamp => model.gnd_clamp.as_mut(),
            IvKind::PowerClamp => model.power_clamp.as_mut(),
        };
        table
            .expect("armed I-V table exists")
            .entries
            .push(IvEntry { voltage, current });
        true
    }

    fn ramp_row(&mut self, first: &'a str) -> bool {
        let lower = first.to_lowercase();
        match lower.as_str() {
            "dv/dt_r" | "dv/dt_f" => {
                let mut values = [Dvdt::default(); 3];
                for slot in &mut values {
                    let word = self.lexer.read_word();
                    match parse_ramp_dvdt(word) {
                        Some(v) => *slot = v,
                        None => {
                            return self.err(&format!("invalid dV/dt value '{word}'"));
                        }
                    }
                }
                let triple = lib_types::DvdtTypMinMax {
                    typ: values[0],
                    min: values[1],
                    max: values[2],
                };
                let ramp = &mut self.model_mut().ramp;
                if lower == "dv/dt_r" {
                    ramp.rising = triple;
                } else {
                    ramp.falling = triple;
                }
                true
            }
            "r_load" => {
                let word = self.lexer.read_word();
                match parse_double(word) {
                    Some(v) => {
                        self.model_mut().ramp.r_load = v;
                        true
                    }
                    None => self.err(&format!("invalid R_load value '{word}'")),
                }
            }
            _ => self.err(&format!("unknown [Ramp] parameter '{first}'")),
        }
    }

    fn waveform_row(&mut self, edge: Edge, first: &'a str) -> bool {
        let lower = first.to_lowercase();
        let subparam = matches!(
            lower.as_str(),
            "r_fixture"
                | "l_fixture"
                | "c_fixture"
                | "v_fixture"
                | "v_fixture_min"
                | "v_fixture_max"
                | "r_dut"
                | "l_dut"
                | "c_dut"
        );
        if subparam {
            let word = self.lexer.read_word();
            let Some(value) = parse_double(word) else {
                return self.err(&format!("invalid value for '{first}'"));
            };
            let wfm = self.waveform_mut(edge);
            match lower.as_str() {
                "r_fixture" => wfm.fixture.r_fixture = value,
                "l_fixture" => wfm.fixture.l_fixture = value,
                "c_fixture" => wfm.fixture.c_fixture = value,
                "v_fixture" => wfm.fixture.v_fixture = value,
                "v_fixture_min" => wfm.fixture.v_fixture_min = value,
                "v_fixture_max" => wfm.fixture.v_fixture_max = value,
                "r_dut" => wfm.r_dut = value,
                "l_dut" => wfm.l_dut = value,
                "c_dut" => wfm.c_dut = value,
                _ => unreachable!(),
            }
            return true;
        }
        let Some(time) = parse_double(first) else {
            return self.err(&format!("invalid waveform time '{first}'"));
        };
        let Some(voltage) = self.read_triple() else {
            return self.err("invalid waveform voltages");
        };
        self.waveform_mut(edge).entries.push(VtEntry { time, voltage });
        true
    }

    fn waveform_mut(&mut self, edge: Edge) -> &mut VtTable {
        let model = self.file.models.last_mut().expect("open model");
        match edge {
            Edge::Rising => model.rising_waveforms.last_mut(),
            Edge::Falling => model.falling_waveforms.last_mut(),
        }
        .expect("armed waveform exists")
    }

    /// Matrix data rows. Full and banded encodings advance the row cursor
    /// after every data line; the sparse encoding advances only via
    /// `[Row]`. Overfilling a row is a hard error for that assignment but
    /// later rows still parse.
    fn matrix_data_row(&mut self, first: &'a str) -> bool {
        let mut words = vec![first];
        words.extend(self.read_words());
        let row = self.matrix_row;
        let line = self.lexer.line_number();
        let rpt = &mut *self.reporter;
        let Some(matrix) = ({
            let kind = self.active_matrix;
            let pm = self.file.package_models.last_mut();
            match (kind, pm) {
                (Some(kind), Some(pm)) => match kind {
                    MatrixKind::Resistance => pm.resistance.as_mut(),
                    MatrixKind::Inductance => pm.inductance.as_mut(),
                    MatrixKind::Capacitance => pm.capacitance.as_mut(),
                },
                _ => None,
            }
        }) else {
            rpt.report(
                &format!("line {line}: matrix data without an open matrix"),
                Severity::Error,
            );
            return false;
        };
        let mut ok = true;
        let mut fail = |rpt: &mut dyn Reporter, msg: String| {
            rpt.report(&format!("line {line}: {msg}"), Severity::Error);
        };
        match matrix {
            Matrix::Full(m) => {
                for (offset, word) in words.iter().enumerate() {
                    let Some(value) = parse_double(word) else {
                        fail(rpt, format!("invalid matrix value '{word}'"));
                        ok = false;
                        continue;
                    };
                    if let Err(e) = m.set(row, row + offset, value) {
                        fail(rpt, e.to_string());
                        ok = false;
                        break;
                    }
                }
                self.matrix_row += 1;
            }
            Matrix::Banded(m) => {
                for (offset, word) in words.iter().enumerate() {
                    let Some(value) = parse_double(word) else {
                        fail(rpt, format!("invalid matrix value '{word}'"));
                        ok = false;
                        continue;
                    };
                    if let Err(e) = m.push(row, offset, value) {
                        fail(rpt, e.to_string());
                        ok = false;
                        break;
                    }
                }
                self.matrix_row += 1;
            }
            Matrix::Sparse(m) => {
                for pair in words.chunks(2) {
                    let [col_word, val_word] = pair else {
                        fail(rpt, "sparse matrix row has an odd field count".to_string());
                        ok = false;
                        break;
                    };
                    let col = match col_word.parse::<usize>() {
                        Ok(c) if c > 0 => c - 1,
                        _ => {
                            fail(rpt, format!("invalid sparse column index '{col_word}'"));
                            ok = false;
                            continue;
                        }
                    };
                    let Some(value) = parse_double(val_word) else {
                        fail(rpt, format!("invalid matrix value '{val_word}'"));
                        ok = false;
                        continue;
                    };
                    if let Err(e) = m.set(row, col, value) {
                        fail(rpt, e.to_string());
                        ok = false;
                    }
                }
            }
        }
        ok
    }

    // ------------------------------------------------------------------
    // shared readers

    /// Remaining whitespace-separated words on the line.
    fn read_words(&mut self) -> Vec<&'a str> {
        let mut words = Vec::new();
        loop {
            let word = self.lexer.read_word();
            if word.is_empty() {
                return words;
            }
            words.push(word);
        }
    }

    /// A Typ/Min/Max triple: the typ column is required, min/max default to
    /// the NA sentinel when absent.
    fn read_triple(&mut self) -> Option<TypMinMax> {
        let typ = parse_double(self.lexer.read_word())?;
        let min = match self.lexer.read_word() {
            "" => NA,
            w => parse_double(w)?,
        };
        let max = match self.lexer.read_word() {
            "" => NA,
            w => parse_double(w)?,
        };
        Some(TypMinMax::new(typ, min, max))
    }
}

/// Parse a `[Ramp]` dV/dt cell: `NA` or `<dv>/<dt>`.
fn parse_ramp_dvdt(word: &str) -> Option<Dvdt> {
    if word.eq_ignore_ascii_case("na") {
        return Some(Dvdt { dv: NA, dt: NA });
    }
    let (dv, dt) = word.split_once('/')?;
    Some(Dvdt {
        dv: parse_double(dv)?,
        dt: parse_double(dt)?,
    })
}
