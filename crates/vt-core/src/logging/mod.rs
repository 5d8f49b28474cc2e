//! Structured logging for vt-core.
//!
//! stdout is reserved for command payloads (reports, cohorts); every event
//! goes to stderr, either as human-readable lines or as JSONL. The core emits
//! run start/finish at info, per-trial progress at debug and cohort details
//! at trace. vt-config reports calibration resolution at debug.

pub mod config;

pub use config::{LogConfig, LogFormat, ENV_LOG_FORMAT, ENV_LOG_LEVEL, ENV_RUST_LOG};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Build the event filter: `RUST_LOG` directives when they were kept and
/// parse, otherwise the config level for every workspace crate.
pub fn build_filter(config: &LogConfig) -> EnvFilter {
    config
        .directives
        .as_deref()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(config.level_directive()))
}

/// Initialize the logging subsystem. Call once, before any event is emitted.
pub fn init_logging(config: &LogConfig) {
    let filter = build_filter(config);

    match config.format {
        LogFormat::Human => {
            let human_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal());
            tracing_subscriber::registry()
                .with(filter)
                .with(human_layer)
                .init();
        }
        LogFormat::Jsonl => {
            let json_layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false)
                .flatten_event(true);
            tracing_subscriber::registry()
                .with(filter)
                .with(json_layer)
                .init();
        }
    }
}
