//! External circuit simulator subprocess.
//!
//! Every invocation gets its own temporary directory: the deck goes in, the
//! simulator runs batch-mode with that directory as its working directory,
//! and the trace comes back out. Unique paths plus a polled timeout keep
//! concurrent recoveries from trampling each other and turn a hung
//! simulator into a reportable error instead of an indefinite stall.

use crate::error::KibisError;
use crate::spice::KuKdSample;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

/// File the recovery deck's `write` directive produces, relative to the
/// simulator's working directory.
pub const TRACE_FILE: &str = "kukd.raw";

/// Lines before the first data group in the simulator's ASCII trace.
const TRACE_HEADER_LINES: usize = 11;

/// Handle to the external simulator executable.
#[derive(Clone, Debug)]
pub struct Simulator {
    /// Executable name or path; resolved through `PATH` when bare.
    pub executable: String,

    /// Wall-clock budget for one recovery run.
    pub timeout: Duration,
}

impl Default for Simulator {
    fn default() -> Self {
        Self {
            executable: "ngspice".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl Simulator {
    pub fn new(executable: impl Into<String>, timeout: Duration) -> Self {
        Self {
            executable: executable.into(),
            timeout,
        }
    }

    /// True if the executable can be spawned at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.executable)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Run a Ku/Kd recovery deck and parse the resulting trace.
    pub fn run_ku_kd(&self, deck: &str) -> Result<Vec<KuKdSample>, KibisError> {
        let dir = tempfile::tempdir()?;
        let deck_path = dir.path().join("recovery.sp");
        std::fs::write(&deck_path, deck)?;

        tracing::debug!(
            executable = %self.executable,
            deck = %deck_path.display(),
            "starting Ku/Kd recovery run"
        );
        let mut child = Command::new(&self.executable)
            .arg("-b")
            .arg(&deck_path)
            .current_dir(dir.path())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        let status = wait_with_timeout(&mut child, self.timeout)?;
        if !status.success() {
            return Err(KibisError::SimulatorFailed {
                executable: self.executable.clone(),
                status,
            });
        }

        let trace_path = dir.path().join(TRACE_FILE);
        if !trace_path.exists() {
            return Err(KibisError::MissingTrace { path: trace_path });
        }
        let text = std::fs::read_to_string(&trace_path)?;
        parse_ku_kd_trace(&text)
    }
}

/// Poll the child until it exits or the budget runs out; on timeout the
/// child is killed and reaped before the error is returned.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<ExitStatus, KibisError> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if start.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(KibisError::SimulatorTimeout {
                seconds: timeout.as_secs(),
            });
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

/// Parse the simulator's ASCII trace: a fixed 11-line header, then
/// repeating 3-line groups of `<tab>time`, Ku value, Kd value. Each line's
/// value is its last whitespace-separated token.
pub fn parse_ku_kd_trace(text: &str) -> Result<Vec<KuKdSample>, KibisError> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < TRACE_HEADER_LINES {
        return Err(KibisError::MalformedTrace {
            reason: "trace shorter than its header".to_string(),
            line: lines.len(),
        });
    }
    let mut samples = Vec::new();
    for (i, group) in lines[TRACE_HEADER_LINES..].chunks(3).enumerate() {
        let line = TRACE_HEADER_LINES + i * 3 + 1;
        if group.iter().all(|l| l.trim().is_empty()) {
            break;
        }
        let [time, ku, kd] = group else {
            return Err(KibisError::MalformedTrace {
                reason: "truncated time/Ku/Kd group".to_string(),
                line,
            });
        };
        let sample = KuKdSample {
            time: last_value(time).ok_or_else(|| KibisError::MalformedTrace {
                reason: format!("unreadable time line '{}'", time.trim()),
                line,
            })?,
            ku: last_value(ku).ok_or_else(|| KibisError::MalformedTrace {
                reason: format!("unreadable Ku line '{}'", ku.trim()),
                line: line + 1,
            })?,
            kd: last_value(kd).ok_or_else(|| KibisError::MalformedTrace {
                reason: format!("unreadable Kd line '{}'", kd.trim()),
                line: line + 2,
            })?,
        };
        samples.push(sample);
    }
    Ok(samples)
}

fn last_value(line: &str) -> Option<f64> {
    line.split_whitespace().last()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(groups: &[(f64, f64, f64)]) -> String {
        let mut text = String::new();
        text.push_str("Title: Ku/Kd recovery\n");
        text.push_str("Date: Sat Aug 29 2026\n");
        text.push_str("Plotname: Transient Analysis\n");
        text.push_str("Flags: real\n");
        text.push_str("No. Variables: 3\n");
        text.push_str(&format!("No. Points: {}\n", groups.len()));
        text.push_str("Variables:\n");
        text.push_str("\t0\ttime\ttime\n");
        text.push_str("\t1\tv(ku)\tvoltage\n");
        text.push_str("\t2\tv(kd)\tvoltage\n");
        text.push_str("Values:\n");
        for (i, (t, ku, kd)) in groups.iter().enumerate() {
            text.push_str(&format!("{i}\t{t:e}\n"));
            text.push_str(&format!("\t{ku:e}\n"));
            text.push_str(&format!("\t{kd:e}\n"));
        }
        text
    }

    #[test]
    fn test_parse_trace_groups() {
        let text = trace(&[(0.0, 0.0, 1.0), (1e-9, 0.4, 0.6), (2e-9, 1.0, 0.0)]);
        let samples = parse_ku_kd_trace(&text).unwrap();
        assert_eq!(samples.len(), 3);
        assert!((samples[1].time - 1e-9).abs() < 1e-21);
        assert!((samples[1].ku - 0.4).abs() < 1e-12);
        assert!((samples[1].kd - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_parse_trace_tolerates_trailing_blank_lines() {
        let mut text = trace(&[(0.0, 0.0, 1.0)]);
        text.push_str("\n\n");
        let samples = parse_ku_kd_trace(&text).unwrap();
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn test_parse_trace_rejects_short_header() {
        let err = parse_ku_kd_trace("only\nfour\nheader\nlines\n").unwrap_err();
        assert!(matches!(err, KibisError::MalformedTrace { .. }));
    }

    #[test]
    fn test_parse_trace_rejects_truncated_group() {
        let mut text = trace(&[(0.0, 0.0, 1.0)]);
        text.push_str("1\t1e-9\n\t5e-1\n"); // group missing its Kd line
        let err = parse_ku_kd_trace(&text).unwrap_err();
        assert!(matches!(
            err,
            KibisError::MalformedTrace { line: 15, .. }
        ));
    }

    #[test]
    fn test_parse_trace_rejects_garbage_value() {
        let text = trace(&[(0.0, 0.0, 1.0)]).replace("\t0e0\n", "\tbogus\n");
        assert!(parse_ku_kd_trace(&text).is_err());
    }

    // Needs a real ngspice on PATH; run with `--ignored`.
    #[test]
    #[ignore]
    fn test_simulator_roundtrip() {
        let simulator = Simulator::default();
        assert!(simulator.is_available());
        let deck = format!(
            "constant Ku/Kd\n\
             Vku KU 0 0.25\n\
             Vkd KD 0 0.75\n\
             .tran 1n 10n\n\
             .control\nrun\nset filetype=ascii\nwrite {TRACE_FILE} v(KU) v(KD)\nquit\n.endc\n\
             .end\n"
        );
        let samples = simulator.run_ku_kd(&deck).unwrap();
        assert!(!samples.is_empty());
        assert!(samples.iter().all(|s| (s.ku - 0.25).abs() < 1e-9));
    }
}
