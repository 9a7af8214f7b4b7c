//! # Logging Utilities
//!
//! Logging setup for dwarfidl binaries and tests, built on `tracing`.
//!
//! Console output always goes to stderr: the JIDL document is written to
//! stdout and must stay parseable when piped.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dwarfidl_utils::init_logging;
//!
//! // Reads RUST_LOG, DWARFIDL_LOG_FORMAT and DWARFIDL_LOG_FILE
//! let _guard = init_logging().expect("Failed to initialize logging");
//!
//! tracing::info!("Processing started");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Filter directives (e.g. `RUST_LOG=debug`, `RUST_LOG=dwarfidl_core::resolver=trace`)
//! - `DWARFIDL_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
//! - `DWARFIDL_LOG_FILE`: Optional path of a log file written in addition to stderr
//!
//! An explicit [`LogLevel`] (from a `--log-level` flag) takes precedence over
//! `RUST_LOG`.

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, fmt, fs};

use chrono::Local;
use tracing::{Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the output format
pub const LOG_FORMAT_ENV: &str = "DWARFIDL_LOG_FORMAT";
/// Environment variable naming an additional log file
pub const LOG_FILE_ENV: &str = "DWARFIDL_LOG_FILE";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat
{
    /// Human-readable lines (default)
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(LoggingError::InvalidFormat(s.to_string())),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    Error,
    Warn,
    /// Default level
    Info,
    Debug,
    /// Every builder decision
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLevel(s.to_string())),
        }
    }
}

impl fmt::Display for LogLevel
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", Level::from(*self))
    }
}

/// Everything needed to install the global subscriber.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingConfig
{
    /// Overrides `RUST_LOG` when set
    pub level: Option<LogLevel>,
    pub format: LogFormat,
    /// Additional plain-text or JSON log file
    pub file: Option<PathBuf>,
}

impl LoggingConfig
{
    /// Read format and log file from the environment.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidFormat` if `DWARFIDL_LOG_FORMAT` is set to an unknown value.
    pub fn from_env() -> Result<Self, LoggingError>
    {
        Self::from_values(env::var(LOG_FORMAT_ENV).ok(), env::var(LOG_FILE_ENV).ok())
    }

    fn from_values(format: Option<String>, file: Option<String>) -> Result<Self, LoggingError>
    {
        let format = match format {
            Some(value) => value.parse()?,
            None => LogFormat::default(),
        };
        Ok(Self {
            level: None,
            format,
            file: file.filter(|path| !path.is_empty()).map(PathBuf::from),
        })
    }

    #[must_use]
    pub fn with_level(mut self, level: Option<LogLevel>) -> Self
    {
        if level.is_some() {
            self.level = level;
        }
        self
    }
}

/// Keeps the background file writer alive. Logs written after the guard is
/// dropped may be lost.
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug, Default)]
pub struct LoggingGuard
{
    _file: Option<WorkerGuard>,
}

/// Initialize logging from the environment
///
/// ## Errors
///
/// Returns an error if:
/// - Logging is already initialized
/// - `DWARFIDL_LOG_FORMAT` has an unknown value
/// - The log file directory cannot be created
pub fn init_logging() -> Result<LoggingGuard, LoggingError>
{
    init_logging_with(&LoggingConfig::from_env()?)
}

/// Initialize logging with explicit level and format, console only
///
/// ## Errors
///
/// Returns an error if logging is already initialized.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<LoggingGuard, LoggingError>
{
    init_logging_with(&LoggingConfig {
        level: Some(level),
        format,
        file: None,
    })
}

/// Initialize logging into a dated file inside `dir`, in addition to stderr.
///
/// The file is named `YYYY-MM-DD-dwarfidl.log` and appended to across runs
/// of the same day.
///
/// ## Errors
///
/// Returns an error if `dir` cannot be created or logging is already
/// initialized.
pub fn init_logging_to_dir(dir: &Path, level: Option<LogLevel>) -> Result<(LoggingGuard, PathBuf), LoggingError>
{
    let file = log_file_in(dir);
    let config = LoggingConfig {
        level,
        format: LogFormat::Pretty,
        file: Some(file.clone()),
    };
    Ok((init_logging_with(&config)?, file))
}

/// Path of today's log file inside `dir`.
#[must_use]
pub fn log_file_in(dir: &Path) -> PathBuf
{
    let today = Local::now().format("%Y-%m-%d");
    dir.join(format!("{today}-dwarfidl.log"))
}

/// Install the global subscriber described by `config`.
///
/// ## Errors
///
/// Returns `FileError` if the log file directory cannot be created and
/// `InitializationFailed` if a global subscriber is already installed.
pub fn init_logging_with(config: &LoggingConfig) -> Result<LoggingGuard, LoggingError>
{
    let filter = env_filter(config.level);
    let console = format_layer(config.format, io::stderr, io::stderr().is_terminal()).with_filter(filter.clone());

    let mut guard = LoggingGuard::default();
    let file_layer = match &config.file {
        Some(path) => {
            let dir = path.parent().filter(|parent| !parent.as_os_str().is_empty()).unwrap_or(Path::new("."));
            fs::create_dir_all(dir)?;
            let file_name = path
                .file_name()
                .ok_or_else(|| LoggingError::InvalidFile(path.display().to_string()))?;
            // Dated names come from the caller, so the appender never rotates.
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, worker) = tracing_appender::non_blocking(appender);
            guard._file = Some(worker);
            Some(format_layer(config.format, writer, false).with_filter(filter))
        }
        None => None,
    };

    Registry::default()
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;
    Ok(guard)
}

/// Explicit level first, then `RUST_LOG`, then `info`.
fn env_filter(level: Option<LogLevel>) -> EnvFilter
{
    if let Some(level) = level {
        return EnvFilter::new(Level::from(level).to_string());
    }
    match env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) => EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string())),
        Err(_) => EnvFilter::new(Level::INFO.to_string()),
    }
}

fn format_layer<S, W>(format: LogFormat, writer: W, ansi: bool) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(ansi)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_current_span(true)
            .with_span_list(true)
            .boxed(),
    }
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Unknown log format: {0}. Use 'pretty' or 'json'")]
    InvalidFormat(String),

    /// Invalid log level
    #[error("Unknown log level: {0}. Use 'error', 'warn', 'info', 'debug', or 'trace'")]
    InvalidLevel(String),

    /// The log file path has no file name
    #[error("Invalid log file path: {0}")]
    InvalidFile(String),

    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}
