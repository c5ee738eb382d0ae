use std::ffi::OsStr;

use clap::ValueEnum;
use tracing::level_filters::LevelFilter;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// systemd sets `JOURNAL_STREAM` when stderr is connected to the journal,
/// which stamps every line itself.
fn journal_attached(journal_stream: Option<&OsStr>) -> bool {
    journal_stream.is_some_and(|value| !value.is_empty())
}

/// Installs the stderr subscriber. Timestamps are left out under journald.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let stamped = !journal_attached(std::env::var_os("JOURNAL_STREAM").as_deref());
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(LevelFilter::from(level))
        .with_ansi(false)
        .with_target(false);

    let installed = match (format, stamped) {
        (LogFormat::Text, true) => builder.try_init(),
        (LogFormat::Text, false) => builder.without_time().try_init(),
        (LogFormat::Json, true) => builder.json().try_init(),
        (LogFormat::Json, false) => builder.json().without_time().try_init(),
    };
    if let Err(err) = installed {
        eprintln!("sps30d: logging unavailable: {err}");
    }
}
