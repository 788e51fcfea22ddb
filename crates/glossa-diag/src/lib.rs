//! Crash report capture.
//!
//! `CrashDumper` writes a plain-text report (reason, thread, backtrace and
//! optionally process details) into `<user_dir>/CrashDumps` and keeps only
//! the newest reports. `install_panic_hook` hooks it into the panic machinery
//! so every panic leaves a report behind.

use std::fmt::Write as _;
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use std::{fs, io};

use log::{error, info, warn};
use parking_lot::Mutex;
use thiserror::Error;

/// Folder created inside the user directory to hold reports.
pub const DUMP_DIR_NAME: &str = "CrashDumps";
const REPORT_PREFIX: &str = "Crash-";
const REPORT_EXTENSION: &str = "txt";

/// Result type for crash capture operations.
pub type Result<T> = std::result::Result<T, DumpError>;

/// Errors that can occur while capturing a crash report.
#[derive(Error, Debug)]
pub enum DumpError {
    /// `trigger_dump` was called before `initialize` or after `shutdown`.
    #[error("crash dumper not initialized")]
    NotInitialized,

    /// The dump directory or report file could not be written.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Something that can record the state of the process for post-mortem
/// inspection.
pub trait DiagnosticCapture: Send + Sync {
    /// Write a report tagged with `reason`. Returns the report path.
    fn trigger_dump(&self, reason: &str) -> Result<PathBuf>;

    fn is_initialized(&self) -> bool;

    /// Stop capturing. Later `trigger_dump` calls fail.
    fn shutdown(&self) {}
}

/// Capture that never writes anything. Stands in for a `CrashDumper` when
/// crash reports are disabled or the dump directory cannot be created.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCapture;

impl DiagnosticCapture for DisabledCapture {
    fn trigger_dump(&self, _reason: &str) -> Result<PathBuf> {
        Err(DumpError::NotInitialized)
    }

    fn is_initialized(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
pub struct DumpSettings {
    /// Reports kept after each dump. Zero keeps everything.
    pub keep_count: usize,
    /// Add process arguments and platform details to every report.
    pub extended_info: bool,
}

impl Default for DumpSettings {
    fn default() -> Self {
        Self {
            keep_count: 10,
            extended_info: false,
        }
    }
}

#[derive(Debug, Default)]
struct DumperState {
    dump_dir: Option<PathBuf>,
    sequence: u64,
}

/// Writes crash reports into a rotating directory.
#[derive(Debug)]
pub struct CrashDumper {
    settings: DumpSettings,
    state: Mutex<DumperState>,
}

impl CrashDumper {
    pub fn new(settings: DumpSettings) -> Self {
        Self {
            settings,
            state: Mutex::new(DumperState::default()),
        }
    }

    pub fn settings(&self) -> &DumpSettings {
        &self.settings
    }

    /// Create `<user_dir>/CrashDumps` and start accepting dumps.
    pub fn initialize(&self, user_dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dump_dir = user_dir.as_ref().join(DUMP_DIR_NAME);
        fs::create_dir_all(&dump_dir)?;
        info!("crash reports go to {}", dump_dir.display());
        self.state.lock().dump_dir = Some(dump_dir.clone());
        Ok(dump_dir)
    }

    pub fn dump_dir(&self) -> Option<PathBuf> {
        self.state.lock().dump_dir.clone()
    }

    /// Stop accepting dumps. Existing reports stay on disk.
    pub fn shutdown(&self) {
        self.state.lock().dump_dir = None;
    }

    /// Write a report, overriding the configured `extended_info` setting.
    pub fn trigger_dump_with(&self, reason: &str, extended_info: bool) -> Result<PathBuf> {
        // No lock across IO: the panic hook can re-enter here.
        let (dump_dir, sequence) = {
            let mut state = self.state.lock();
            let dir = state.dump_dir.clone().ok_or(DumpError::NotInitialized)?;
            state.sequence += 1;
            (dir, state.sequence)
        };

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        let pid = std::process::id();
        let file_name =
            format!("{REPORT_PREFIX}{timestamp}-{pid}-{sequence:04}.{REPORT_EXTENSION}");
        let path = dump_dir.join(file_name);

        fs::write(&path, render_report(reason, timestamp, extended_info))?;

        if self.settings.keep_count > 0 {
            if let Err(err) = keep_newest_reports(&dump_dir, self.settings.keep_count) {
                warn!("failed to prune old crash reports: {err}");
            }
        }
        Ok(path)
    }
}

impl DiagnosticCapture for CrashDumper {
    fn trigger_dump(&self, reason: &str) -> Result<PathBuf> {
        self.trigger_dump_with(reason, self.settings.extended_info)
    }

    fn is_initialized(&self) -> bool {
        self.state.lock().dump_dir.is_some()
    }

    fn shutdown(&self) {
        CrashDumper::shutdown(self);
    }
}

fn render_report(reason: &str, timestamp: u64, extended_info: bool) -> String {
    let thread = std::thread::current();
    let backtrace = std::backtrace::Backtrace::force_capture();

    let mut report = String::new();
    let _ = writeln!(report, "reason: {reason}");
    let _ = writeln!(report, "time: {timestamp}");
    let _ = writeln!(report, "pid: {}", std::process::id());
    let _ = writeln!(report, "thread: {}", thread.name().unwrap_or("<unnamed>"));
    let _ = writeln!(report, "version: {}", env!("CARGO_PKG_VERSION"));
    if extended_info {
        let args: Vec<String> = std::env::args().collect();
        let _ = writeln!(report, "args: {args:?}");
        let _ = writeln!(report, "os: {}", std::env::consts::OS);
        let _ = writeln!(report, "arch: {}", std::env::consts::ARCH);
        if let Ok(dir) = std::env::current_dir() {
            let _ = writeln!(report, "cwd: {}", dir.display());
        }
    }
    let _ = writeln!(report, "\nbacktrace:\n{backtrace}");
    report
}

fn is_report(path: &Path) -> bool {
    let name_matches = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(REPORT_PREFIX));
    let ext_matches = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(REPORT_EXTENSION));
    name_matches && ext_matches
}

/// Delete all but the `keep_count` most recently written reports in `dir`.
/// Returns how many files were removed.
pub fn keep_newest_reports(dir: &Path, keep_count: usize) -> io::Result<usize> {
    let mut reports = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !is_report(&path) {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        reports.push((modified, path));
    }

    // Newest first. Reports written within one clock tick fall back to name
    // order, which follows the sequence number.
    reports.sort_by(|a, b| b.cmp(a));

    let mut removed = 0;
    for (_, path) in reports.into_iter().skip(keep_count) {
        fs::remove_file(&path)?;
        removed += 1;
    }
    Ok(removed)
}

fn panic_reason(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "<non-string panic payload>".to_string());
    match info.location() {
        Some(location) => format!("panic at {location}: {message}"),
        None => format!("panic: {message}"),
    }
}

/// Write a crash report for every panic, then run the previously installed
/// hook.
pub fn install_panic_hook(capture: Arc<dyn DiagnosticCapture>) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if capture.is_initialized() {
            match capture.trigger_dump(&panic_reason(info)) {
                Ok(path) => error!("crash report written to {}", path.display()),
                Err(err) => error!("failed to write crash report: {err}"),
            }
        }
        previous(info);
    }));
}
