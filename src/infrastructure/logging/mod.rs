//! Structured logging via `tracing` (spec.md §9 "every phase transition,
//! scheduler tick, and integration action emits a structured span/event").
//!
//! `EnvFilter` picks up `RUST_LOG`; `FOREMAN_LOG_LEVEL`/`FOREMAN_LOG_FORMAT`
//! are folded into `LogConfig` by the config loader before `init` runs. File
//! output rotates daily when `log_dir` is set.

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::domain::models::{LogConfig, LogFormat};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log level: {0}")]
    InvalidLevel(String),
}

/// Holds the non-blocking file writer's guard alive for the process
/// lifetime; dropping it would stop flushing to the log file.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

pub fn init(config: &LogConfig) -> Result<LoggingGuard, LoggingError> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(
            config
                .level
                .parse()
                .map_err(|_| LoggingError::InvalidLevel(config.level.clone()))?,
        )
        .from_env_lossy();

    let file_guard = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "foreman.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let file_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_filter(env_filter.clone());

            match config.format {
                LogFormat::Json => {
                    let stdout_layer =
                        tracing_subscriber::fmt::layer().json().with_target(true).with_filter(env_filter);
                    tracing_subscriber::registry().with(file_layer).with(stdout_layer).init();
                }
                LogFormat::Pretty => {
                    let stdout_layer =
                        tracing_subscriber::fmt::layer().pretty().with_target(true).with_filter(env_filter);
                    tracing_subscriber::registry().with(file_layer).with(stdout_layer).init();
                }
            }
            Some(guard)
        }
        None => {
            match config.format {
                LogFormat::Json => {
                    let stdout_layer =
                        tracing_subscriber::fmt::layer().json().with_target(true).with_filter(env_filter);
                    tracing_subscriber::registry().with(stdout_layer).init();
                }
                LogFormat::Pretty => {
                    let stdout_layer =
                        tracing_subscriber::fmt::layer().pretty().with_target(true).with_filter(env_filter);
                    tracing_subscriber::registry().with(stdout_layer).init();
                }
            }
            None
        }
    };

    tracing::info!(level = %config.level, format = ?config.format, file_output = config.log_dir.is_some(), "logging initialized");

    Ok(LoggingGuard { _file_guard: file_guard })
}
