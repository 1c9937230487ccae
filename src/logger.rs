//! Session logger: backs the `log` facade with a single file in the OS data directory.
//!
//! The file is **truncated (overwritten) at each launch**, so it only ever
//! contains output from the most-recent session.
//!
//! Log location:
//!   Windows:  `%APPDATA%\Lumina\lumina.log`
//!   Linux:    `~/.local/share/Lumina/lumina.log`
//!   macOS:    `~/Library/Application Support/Lumina/lumina.log`
//!
//! Headless (CLI) runs use [`init_stderr`] instead: same format, no file.
//! The level comes from `LUMINA_LOG` (`error`, `warn`, `info`, `debug`,
//! `trace`), defaulting to `info`.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{LevelFilter, Log, Metadata, Record};

pub const LEVEL_ENV: &str = "LUMINA_LOG";

static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

enum Sink {
    File(Mutex<File>),
    Stderr,
}

struct SessionLogger {
    sink: Sink,
}

impl Log for SessionLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(record.level().as_str(), record.target(), &record.args().to_string());
        match &self.sink {
            // Logging must never take the application down, so I/O errors are dropped.
            Sink::File(file) => {
                if let Ok(mut file) = file.lock() {
                    let _ = writeln!(file, "{}", line);
                }
            }
            Sink::Stderr => eprintln!("{}", line),
        }
    }

    fn flush(&self) {
        if let Sink::File(file) = &self.sink
            && let Ok(mut file) = file.lock()
        {
            let _ = file.flush();
        }
    }
}

/// Returns the path to the current session log file (GUI mode only).
pub fn log_path() -> Option<&'static PathBuf> {
    LOG_PATH.get()
}

/// Parse a level name, falling back to `Info` for anything unrecognised.
pub fn level_from_str(raw: Option<&str>) -> LevelFilter {
    raw.and_then(|s| LevelFilter::from_str(s.trim()).ok())
        .unwrap_or(LevelFilter::Info)
}

fn level_from_env() -> LevelFilter {
    level_from_str(std::env::var(LEVEL_ENV).ok().as_deref())
}

/// Initialise the session logger.  Must be called once before any logging.
///
/// * Creates (or truncates) the log file.
/// * Installs a panic hook that writes the panic message to the log before
///   propagating to the default handler.
///
/// Falls back to stderr when the file cannot be opened.
pub fn init() {
    let path = log_file_path();

    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&path);

    let sink = match file {
        Ok(f) => {
            let _ = LOG_PATH.set(path.clone());
            Sink::File(Mutex::new(f))
        }
        Err(e) => {
            eprintln!("[logger] Failed to open log file {:?}: {}", path, e);
            Sink::Stderr
        }
    };
    install(sink);

    log::info!("=== Lumina session started {} ===", human_timestamp());
    if let Some(p) = log_path() {
        log::info!("Log file: {}", p.display());
    }

    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        log::error!("PANIC: {}", info);
        log::logger().flush();
        prev(info);
    }));
}

/// Logger for headless runs: everything goes to stderr.
pub fn init_stderr() {
    install(Sink::Stderr);
}

fn install(sink: Sink) {
    let logger: &'static SessionLogger = Box::leak(Box::new(SessionLogger { sink }));
    // A second init (tests, re-entry) keeps the first logger.
    if log::set_logger(logger).is_ok() {
        log::set_max_level(level_from_env());
    }
}

fn format_line(level: &str, target: &str, msg: &str) -> String {
    format!("[{}] [{}] [{}] {}", timestamp(), level, target, msg)
}

fn log_file_path() -> PathBuf {
    data_dir().join("Lumina").join("lumina.log")
}

/// Platform data directory (without the app sub-folder).
fn data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata);
        }
    }
    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support");
        }
    }
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from(".")
}

/// HH:MM:SS (UTC) within the current day; good enough for a session log.
fn timestamp() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => {
            let secs = d.as_secs();
            let h = (secs % 86400) / 3600;
            let m = (secs % 3600) / 60;
            let s = secs % 60;
            format!("{:02}:{:02}:{:02}", h, m, s)
        }
        Err(_) => "??:??:??".to_string(),
    }
}

fn human_timestamp() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => format!("(unix {})", d.as_secs()),
        Err(_) => "(unknown time)".to_string(),
    }
}

#[cfg(test)]
#[path = "logger_test.rs"]
mod tests;
