//! Diagnostic sink for the tolerant parser.
//!
//! The parser never throws on malformed statements; every anomaly is
//! funneled through a [`Reporter`] and parsing continues where structurally
//! possible. Callers that ignore the reporter can therefore observe a
//! successfully-returned document that is missing data for the lines that
//! failed.

/// Severity of a diagnostic message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Action,
    Warning,
    Error,
}

/// A sink for parser and validator diagnostics.
pub trait Reporter {
    fn report(&mut self, message: &str, severity: Severity);
}

/// Discards every message. Passing this is equivalent to a null reporter.
#[derive(Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&mut self, _message: &str, _severity: Severity) {}
}

/// Forwards diagnostics to the `tracing` subscriber.
#[derive(Debug, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&mut self, message: &str, severity: Severity) {
        match severity {
            Severity::Info => tracing::info!("{message}"),
            Severity::Action => tracing::info!("action: {message}"),
            Severity::Warning => tracing::warn!("{message}"),
            Severity::Error => tracing::error!("{message}"),
        }
    }
}

/// Collects diagnostics in memory. Used by tests and the CLI summary.
#[derive(Debug, Default)]
pub struct VecReporter {
    pub messages: Vec<(Severity, String)>,
}

impl VecReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages at exactly `severity`.
    pub fn count(&self, severity: Severity) -> usize {
        self.messages.iter().filter(|(s, _)| *s == severity).count()
    }

    /// True if any message at `severity` contains `needle`.
    pub fn contains(&self, severity: Severity, needle: &str) -> bool {
        self.messages
            .iter()
            .any(|(s, m)| *s == severity && m.contains(needle))
    }
}

impl Reporter for VecReporter {
    fn report(&mut self, message: &str, severity: Severity) {
        self.messages.push((severity, message.to_string()));
    }
}
