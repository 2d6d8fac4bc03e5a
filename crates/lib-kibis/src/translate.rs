//! Translation of a parsed IBIS document into a simulation-ready graph.
//!
//! The translated graph is a shadow of the document: one component per
//! `[Component]`, one pin per non-dummy `[Pin]` row, with parasitics
//! resolved against the package values and model references resolved
//! through `[Model Selector]` indirection. Models are referenced by index
//! into the owning [`IbisFile`]'s model list rather than copied.

use lib_ibis::{IbisFile, Model, Reporter, Severity};
use lib_types::{is_na, TypMinMax};
use serde::{Deserialize, Serialize};

/// Pin model names that designate supply or unconnected pins rather than a
/// buffer model. Pins using them get no candidate models.
pub const RESERVED_PIN_MODELS: [&str; 3] = ["POWER", "GND", "NC"];

/// A component ready for deck synthesis.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KibisComponent {
    pub name: String,
    pub manufacturer: String,
    pub pins: Vec<KibisPin>,
}

impl KibisComponent {
    /// Look up a pin by its designator.
    pub fn pin_by_number(&self, number: &str) -> Option<&KibisPin> {
        self.pins.iter().find(|p| p.number == number)
    }
}

/// One pin with resolved parasitics and candidate models.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KibisPin {
    pub number: String,
    pub signal: String,

    /// Resolved parasitics: the package triple unless the pin carried an
    /// override.
    pub r_pin: TypMinMax,
    pub l_pin: TypMinMax,
    pub c_pin: TypMinMax,

    /// Candidate models, as indices into the source file's model list, in
    /// selector-entry order.
    pub models: Vec<usize>,
}

impl KibisPin {
    /// Resolve the candidate indices against the source document.
    pub fn candidate_models<'a>(&self, file: &'a IbisFile) -> Vec<&'a Model> {
        self.models.iter().map(|&i| &file.models[i]).collect()
    }
}

/// Build the simulation-ready graph for every component in `file`.
pub fn translate(file: &IbisFile, rpt: &mut dyn Reporter) -> Vec<KibisComponent> {
    file.components
        .iter()
        .map(|component| {
            let pins = component
                .pins
                .iter()
                .filter(|pin| !pin.dummy)
                .map(|pin| {
                    let models = resolve_models(file, &pin.model, &pin.number, rpt);
                    KibisPin {
                        number: pin.number.clone(),
                        signal: pin.signal.clone(),
                        r_pin: resolve_parasitic(component.package.r_pkg, pin.r_pin),
                        l_pin: resolve_parasitic(component.package.l_pkg, pin.l_pin),
                        c_pin: resolve_parasitic(component.package.c_pkg, pin.c_pin),
                        models,
                    }
                })
                .collect();
            KibisComponent {
                name: component.name.clone(),
                manufacturer: component.manufacturer.clone(),
                pins,
            }
        })
        .collect()
}

/// A pin-level override that is not NA replaces the package value. The
/// override is a single scalar written into all three corners at once; the
/// source format does not provide per-corner pin overrides.
fn resolve_parasitic(package: TypMinMax, pin_override: f64) -> TypMinMax {
    if is_na(pin_override) {
        package
    } else {
        TypMinMax::splat(pin_override)
    }
}

/// Resolve a pin's model name into candidate model indices.
///
/// Selector names match case-insensitively; the models a selector lists
/// match by exact name. A name that resolves to nothing leaves a gap in the
/// candidate list; the gap is reported as a warning so it stays observable.
fn resolve_models(
    file: &IbisFile,
    model_name: &str,
    pin_number: &str,
    rpt: &mut dyn Reporter,
) -> Vec<usize> {
    if RESERVED_PIN_MODELS
        .iter()
        .any(|r| r.eq_ignore_ascii_case(model_name))
    {
        return Vec::new();
    }
    if let Some(selector) = file.selector_by_name(model_name) {
        let mut indices = Vec::with_capacity(selector.entries.len());
        for entry in &selector.entries {
            match file.model_by_name(&entry.model) {
                Some((i, _)) => indices.push(i),
                None => rpt.report(
                    &format!(
                        "pin '{pin_number}': selector '{}' names model '{}' \
                         which does not exist; entry skipped",
                        selector.name, entry.model
                    ),
                    Severity::Warning,
                ),
            }
        }
        return indices;
    }
    match file.model_by_name(model_name) {
        Some((i, _)) => vec![i],
        None => {
            rpt.report(
                &format!(
                    "pin '{pin_number}': model '{model_name}' does not exist; \
                     pin left without candidate models"
                ),
                Severity::Warning,
            );
            Vec::new()
        }
    }
}
