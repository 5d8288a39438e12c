//! Generic logger utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use log::{self, info};
use fern;
use colored::{ColoredString, Colorize};
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level less than `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
/// 
/// # Notes
/// 
/// - `min_level` must be greater than `log::Level::Info`.
/// 
/// # Safety
/// 
/// - This function must only be called once to prevent corrupting logs.
pub fn logger_init(
    min_level: self::LevelFilter, 
    session: &session::Session
) -> Result<(), LoggerInitError> {

    if min_level < log::Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level))
    }

    let log_file = fern::log_file(session.log_file_path.clone())
        .map_err(LoggerInitError::LogFileInitError)?;

    // Coloured level tags on the terminal only
    let stdout = fern::Dispatch::new()
        .format(|out, message, record| format_record(out, message, record, true))
        .chain(std::io::stdout());
    let file = fern::Dispatch::new()
        .format(|out, message, record| format_record(out, message, record, false))
        .chain(log_file);

    fern::Dispatch::new()
        .level(min_level)
        .level_for("comms_if::bus", bus_level(min_level))
        .chain(stdout)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;
    
    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log level: {:?}", min_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Format a single record, prefixed with the session time and level.
///
/// Debug and trace records also include their target.
fn format_record(
    out: fern::FormatCallback,
    message: &std::fmt::Arguments,
    record: &log::Record,
    colour: bool
) {
    let level = level_to_str(record.level(), colour);

    if record.level() > log::Level::Info {
        out.finish(format_args!(
            "[{:10.6} {}] {}: {}",
            session::get_elapsed_seconds(),
            level,
            record.target(),
            message
        ))
    }
    else {
        out.finish(format_args!(
            "[{:10.6} {}] {}",
            session::get_elapsed_seconds(),
            level,
            message
        ))
    }
}

/// Level for the bus, which drains far more often than anything else logs.
///
/// Capped at `Debug` so a trace session isn't swamped by drain output.
fn bus_level(min_level: LevelFilter) -> LevelFilter {
    min_level.min(LevelFilter::Debug)
}

/// Get the string representation of a log level
fn level_to_str(level: log::Level, colour: bool) -> ColoredString {
    let tag = match level {
        log::Level::Trace => "TRC",
        log::Level::Debug => "DBG",
        log::Level::Info  => "INF",
        log::Level::Warn  => "WRN",
        log::Level::Error => "ERR"
    };

    if !colour {
        return tag.normal();
    }

    match level {
        log::Level::Trace => tag.dimmed().italic(),
        log::Level::Debug => tag.dimmed(),
        log::Level::Info  => tag.normal(),
        log::Level::Warn  => tag.yellow(),
        log::Level::Error => tag.red().bold()
    }
}
