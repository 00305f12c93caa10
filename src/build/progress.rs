//! Build progress reporting.
//!
//! Progress is reported as [`ProgressEvent`]s to a [`ProgressReporter`].
//! The console reporter prints short human-readable lines; the JSON
//! reporter prints one object per line for tools.
//!
//! # Example
//!
//! ```ignore
//! use sitepack::build::{BuildPhase, ConsoleProgress, ProgressEvent, ProgressReporter};
//!
//! let reporter = ConsoleProgress::new();
//! reporter.report(ProgressEvent::BuildStarted { integrations: 2 });
//! reporter.report(ProgressEvent::PhaseStarted { phase: BuildPhase::Init });
//! reporter.report(ProgressEvent::PhaseCompleted { phase: BuildPhase::Init, duration_ms: 3 });
//! ```

use crate::build::BuildPhase;
use serde_json::json;
use std::io::{IsTerminal, Write};
use std::sync::Mutex;

/// Outcome of one asset transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetStatus {
    /// Service output kept
    Transformed,
    /// Service failed, original bytes kept
    Passthrough(String),
    /// Service failed and the build stops
    Failed(String),
}

impl std::fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetStatus::Transformed => write!(f, "transformed"),
            AssetStatus::Passthrough(e) => write!(f, "passthrough: {}", e),
            AssetStatus::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}

/// Events that can be reported during a build.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Build process started
    BuildStarted {
        /// Number of registered integrations
        integrations: usize,
    },
    /// A phase was entered
    PhaseStarted { phase: BuildPhase },
    /// A phase finished
    PhaseCompleted { phase: BuildPhase, duration_ms: u64 },
    /// One asset went through its service
    AssetTransformed {
        path: String,
        service: String,
        status: AssetStatus,
        duration_ms: u64,
    },
    /// A warning was recorded
    Warning {
        /// Integration, module or asset the warning is about
        source: Option<String>,
        message: String,
    },
    /// Every phase completed
    BuildCompleted { files: usize, warnings: usize, duration_ms: u64 },
    /// The build stopped in a phase
    BuildFailed { phase: BuildPhase, message: String },
}

/// Trait for progress reporters.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event.
    fn report(&self, event: ProgressEvent);

    /// Check if this reporter wants verbose output.
    fn is_verbose(&self) -> bool {
        false
    }
}

/// A progress reporter that discards all events.
#[derive(Debug, Default)]
pub struct NullProgress;

impl NullProgress {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for NullProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Console progress reporter with optional colors.
pub struct ConsoleProgress {
    use_colors: bool,
    verbose: bool,
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for ConsoleProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleProgress")
            .field("use_colors", &self.use_colors)
            .field("verbose", &self.verbose)
            .finish()
    }
}

impl ConsoleProgress {
    /// Create a console reporter writing to stderr. Colors are on only when
    /// stderr is a terminal.
    pub fn new() -> Self {
        let stderr = std::io::stderr();
        Self { use_colors: stderr.is_terminal(), verbose: false, output: Mutex::new(Box::new(stderr)) }
    }

    /// Create a console progress reporter that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self { use_colors: false, verbose: false, output: Mutex::new(Box::new(output)) }
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// In verbose mode phase starts and every asset are printed too.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn color(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{}{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.color(text, "\x1b[32m")
    }

    fn yellow(&self, text: &str) -> String {
        self.color(text, "\x1b[33m")
    }

    fn red(&self, text: &str) -> String {
        self.color(text, "\x1b[31m")
    }

    fn cyan(&self, text: &str) -> String {
        self.color(text, "\x1b[36m")
    }

    fn writeln(&self, line: &str) {
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", line);
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::BuildStarted { integrations } => {
                self.writeln(&format!(
                    "{} Building with {} integration{}...",
                    self.cyan("[build]"),
                    integrations,
                    if integrations == 1 { "" } else { "s" }
                ));
            }
            ProgressEvent::PhaseStarted { phase } => {
                if self.verbose {
                    self.writeln(&format!("{} {}...", self.cyan("[build]"), phase));
                }
            }
            ProgressEvent::PhaseCompleted { phase, duration_ms } => {
                self.writeln(&format!(
                    "{} {} {} ({})",
                    self.cyan("[build]"),
                    self.green("ok"),
                    phase,
                    format_duration(duration_ms)
                ));
            }
            ProgressEvent::AssetTransformed { path, service, status, duration_ms } => {
                let show = self.verbose || !matches!(status, AssetStatus::Transformed);
                if show {
                    let status_str = match &status {
                        AssetStatus::Transformed => self.green("ok"),
                        AssetStatus::Passthrough(_) => self.yellow("kept original"),
                        AssetStatus::Failed(_) => self.red("FAILED"),
                    };
                    self.writeln(&format!(
                        "{}   {} {} via {} ({})",
                        self.cyan("[asset]"),
                        status_str,
                        path,
                        service,
                        format_duration(duration_ms)
                    ));
                    if let AssetStatus::Passthrough(e) | AssetStatus::Failed(e) = status {
                        self.writeln(&format!("          {}", e));
                    }
                }
            }
            ProgressEvent::Warning { source, message } => {
                let prefix = match source {
                    Some(s) => format!("{}: ", s),
                    None => String::new(),
                };
                self.writeln(&format!("{} {}{}", self.yellow("[warn]"), prefix, message));
            }
            ProgressEvent::BuildCompleted { files, warnings, duration_ms } => {
                self.writeln(&format!(
                    "\n{} {} file{}, {} warning{} in {}",
                    self.green("[done]"),
                    files,
                    if files == 1 { "" } else { "s" },
                    warnings,
                    if warnings == 1 { "" } else { "s" },
                    format_duration(duration_ms)
                ));
            }
            ProgressEvent::BuildFailed { phase, message } => {
                self.writeln(&format!(
                    "\n{} Build failed in {}: {}",
                    self.red("[error]"),
                    phase,
                    message
                ));
            }
        }
    }

    fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// JSON progress reporter for machine-readable output.
pub struct JsonProgress {
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for JsonProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonProgress").finish()
    }
}

impl JsonProgress {
    /// Create a new JSON progress reporter writing to stderr.
    pub fn new() -> Self {
        Self { output: Mutex::new(Box::new(std::io::stderr())) }
    }

    /// Create a JSON progress reporter that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self { output: Mutex::new(Box::new(output)) }
    }
}

impl Default for JsonProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        let value = match event {
            ProgressEvent::BuildStarted { integrations } => {
                json!({ "event": "build_started", "integrations": integrations })
            }
            ProgressEvent::PhaseStarted { phase } => {
                json!({ "event": "phase_started", "phase": phase.as_str() })
            }
            ProgressEvent::PhaseCompleted { phase, duration_ms } => {
                json!({ "event": "phase_completed", "phase": phase.as_str(), "duration_ms": duration_ms })
            }
            ProgressEvent::AssetTransformed { path, service, status, duration_ms } => {
                let (status, error) = match status {
                    AssetStatus::Transformed => ("transformed", None),
                    AssetStatus::Passthrough(e) => ("passthrough", Some(e)),
                    AssetStatus::Failed(e) => ("failed", Some(e)),
                };
                json!({
                    "event": "asset_transformed",
                    "path": path,
                    "service": service,
                    "status": status,
                    "error": error,
                    "duration_ms": duration_ms,
                })
            }
            ProgressEvent::Warning { source, message } => {
                json!({ "event": "warning", "source": source, "message": message })
            }
            ProgressEvent::BuildCompleted { files, warnings, duration_ms } => json!({
                "event": "build_completed",
                "files": files,
                "warnings": warnings,
                "duration_ms": duration_ms,
            }),
            ProgressEvent::BuildFailed { phase, message } => {
                json!({ "event": "build_failed", "phase": phase.as_str(), "message": message })
            }
        };
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", value);
        }
    }
}

/// Format a duration in milliseconds to a human-readable string.
fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        let minutes = ms / 60_000;
        let seconds = (ms % 60_000) / 1000;
        format!("{}m {}s", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct TestWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for TestWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn captured(report: impl FnOnce(Box<dyn Fn(ProgressEvent)>)) -> String {
        let output = Arc::new(Mutex::new(Vec::new()));
        let reporter = ConsoleProgress::with_output(TestWriter(Arc::clone(&output)));
        report(Box::new(move |e| reporter.report(e)));
        let bytes = output.lock().unwrap().clone();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[test]
    fn test_asset_status_display() {
        assert_eq!(AssetStatus::Transformed.to_string(), "transformed");
        assert_eq!(AssetStatus::Failed("x".to_string()).to_string(), "failed: x");
    }

    #[test]
    fn test_console_progress_colors_follow_stderr() {
        assert_eq!(ConsoleProgress::new().use_colors, std::io::stderr().is_terminal());
    }

    #[test]
    fn test_null_progress() {
        let reporter = NullProgress::new();
        reporter.report(ProgressEvent::BuildStarted { integrations: 1 });
        assert!(!reporter.is_verbose());
    }

    #[test]
    fn test_console_progress_phase_completed() {
        let text = captured(|report| {
            report(ProgressEvent::BuildStarted { integrations: 2 });
            report(ProgressEvent::PhaseCompleted {
                phase: BuildPhase::TransformAssets,
                duration_ms: 150,
            });
        });
        assert!(text.contains("2 integrations"));
        assert!(text.contains("ok transformAssets (150ms)"));
    }

    #[test]
    fn test_console_progress_hides_successful_assets_unless_verbose() {
        let text = captured(|report| {
            report(ProgressEvent::AssetTransformed {
                path: "img/a.png".to_string(),
                service: "local".to_string(),
                status: AssetStatus::Transformed,
                duration_ms: 5,
            });
            report(ProgressEvent::AssetTransformed {
                path: "img/b.png".to_string(),
                service: "local".to_string(),
                status: AssetStatus::Passthrough("bad header".to_string()),
                duration_ms: 5,
            });
        });
        assert!(!text.contains("img/a.png"));
        assert!(text.contains("kept original img/b.png via local"));
        assert!(text.contains("bad header"));
    }

    #[test]
    fn test_console_progress_build_failed() {
        let text = captured(|report| {
            report(ProgressEvent::BuildFailed {
                phase: BuildPhase::Resolve,
                message: "integration 'x' failed".to_string(),
            });
        });
        assert!(text.contains("[error] Build failed in resolve: integration 'x' failed"));
    }

    #[test]
    fn test_json_progress_lines_parse() {
        let output = Arc::new(Mutex::new(Vec::new()));
        let reporter = JsonProgress::with_output(TestWriter(Arc::clone(&output)));
        reporter.report(ProgressEvent::PhaseStarted { phase: BuildPhase::Bundle });
        reporter.report(ProgressEvent::Warning { source: None, message: "m".to_string() });

        let bytes = output.lock().unwrap().clone();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<serde_json::Value> =
            text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines[0]["event"], "phase_started");
        assert_eq!(lines[0]["phase"], "bundle");
        assert_eq!(lines[1]["source"], serde_json::Value::Null);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(999), "999ms");
        assert_eq!(format_duration(1500), "1.5s");
        assert_eq!(format_duration(61_000), "1m 1s");
    }
}
