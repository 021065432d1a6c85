//! Logger initialization.
//!
//! `env_logger` backend for the `log` facade, with a coloured plain format
//! for terminals and a one-object-per-line JSON format for log shippers.

use std::io::Write;

use crate::config::LogFormat;
use crate::error_handling::InitializationError;
use colored::*;
use env_logger::Builder;
use log::{Level, LevelFilter};

/// Dependencies kept quieter than the gate itself.
///
/// `maxminddb` would otherwise log every record decode at debug, and the HTTP
/// stack logs every connection.
const DEPENDENCY_FILTERS: &[(&str, LevelFilter)] = &[
    ("reqwest", LevelFilter::Info),
    ("hyper", LevelFilter::Info),
    ("hyper_util", LevelFilter::Info),
    ("maxminddb", LevelFilter::Warn),
];

/// Initializes the logger with the specified level and format.
///
/// `RUST_LOG` is read first, then `level` overrides its global level and the
/// level of the `geo_gate` target. Per-dependency filters stay in place.
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` if a logger is already installed.
///
/// # Examples
///
/// ```bash
/// # Use RUST_LOG for quick debugging (no CLI args needed)
/// RUST_LOG=debug geo_gate --config gate.json --upstream http://127.0.0.1:3000
///
/// # Per-module filtering via RUST_LOG
/// RUST_LOG=geo_gate=debug,hyper=warn geo_gate --config gate.json --upstream http://127.0.0.1:3000
/// ```
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    colored::control::set_override(true);

    let mut builder = Builder::from_default_env();
    configure(&mut builder, level, format);

    // try_init so a second initialization (tests) is an error, not a panic
    builder.try_init().map_err(InitializationError::from)?;

    Ok(())
}

/// Applies the gate's level filters and output format to `builder`.
fn configure(builder: &mut Builder, level: LevelFilter, format: LogFormat) {
    builder.filter_level(level);
    for (module, filter) in DEPENDENCY_FILTERS {
        builder.filter_module(module, (*filter).min(level));
    }
    builder.filter_module("geo_gate", level);

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{}",
                    json_line(
                        chrono::Utc::now().timestamp_millis(),
                        record.level(),
                        record.target(),
                        &record.args().to_string()
                    )
                )
            });
        }
        LogFormat::Plain => {
            builder.format(|buf, record| {
                let level = record.level();
                let colored_level = match level {
                    Level::Error => level.to_string().red(),
                    Level::Warn => level.to_string().yellow(),
                    Level::Info => level.to_string().green(),
                    Level::Debug => level.to_string().blue(),
                    Level::Trace => level.to_string().purple(),
                };

                writeln!(
                    buf,
                    "{} {} [{}] {}",
                    level_emoji(level),
                    record.target().cyan(),
                    colored_level,
                    record.args()
                )
            });
        }
    }
}

/// One JSON log object: `ts` (unix millis), `level`, `target`, `msg`.
fn json_line(ts_millis: i64, level: Level, target: &str, msg: &str) -> String {
    serde_json::json!({
        "ts": ts_millis,
        "level": level.as_str(),
        "target": target,
        "msg": msg,
    })
    .to_string()
}

fn level_emoji(level: Level) -> &'static str {
    match level {
        Level::Error => "❌",
        Level::Warn => "⚠️",
        Level::Info => "✔️",
        Level::Debug => "🔍",
        Level::Trace => "🔬",
    }
}
