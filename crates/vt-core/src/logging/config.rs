//! Logging configuration.
//!
//! Level precedence: `-v`/`-q` on the command line, then `VT_LOG`, then the
//! raw `RUST_LOG` directives. Format precedence: `--log-format`, then
//! `VT_LOG_FORMAT`.

use clap::ValueEnum;
use tracing_subscriber::filter::LevelFilter;

/// Level override variable; takes precedence over `RUST_LOG`.
pub const ENV_LOG_LEVEL: &str = "VT_LOG";
/// Format override variable.
pub const ENV_LOG_FORMAT: &str = "VT_LOG_FORMAT";
/// Standard tracing directive variable.
pub const ENV_RUST_LOG: &str = "RUST_LOG";

/// Workspace crates that emit events.
const TARGETS: [&str; 2] = ["vt_core", "vt_config"];

/// Log output format on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Human,
    /// One JSON object per event
    #[value(alias = "json")]
    Jsonl,
}

/// Resolved logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LevelFilter,
    /// `RUST_LOG` directives, kept only when no explicit level was chosen.
    pub directives: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LevelFilter::INFO,
            directives: None,
        }
    }
}

impl LogConfig {
    /// Create config from the process environment and CLI overrides.
    pub fn from_env(cli_level: Option<LevelFilter>, cli_format: Option<LogFormat>) -> Self {
        Self::from_lookup(cli_level, cli_format, |key| std::env::var(key).ok())
    }

    /// Resolve from an arbitrary variable source.
    pub fn from_lookup(
        cli_level: Option<LevelFilter>,
        cli_format: Option<LogFormat>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let format = cli_format
            .or_else(|| {
                non_empty(ENV_LOG_FORMAT).and_then(|v| LogFormat::from_str(v.trim(), true).ok())
            })
            .unwrap_or_default();

        let env_level = non_empty(ENV_LOG_LEVEL).and_then(|v| v.trim().parse::<LevelFilter>().ok());
        match cli_level.or(env_level) {
            Some(level) => LogConfig {
                format,
                level,
                directives: None,
            },
            None => LogConfig {
                format,
                directives: non_empty(ENV_RUST_LOG),
                ..LogConfig::default()
            },
        }
    }

    /// Filter directive applying `level` to every workspace crate,
    /// e.g. `vt_core=debug,vt_config=debug`.
    pub fn level_directive(&self) -> String {
        TARGETS
            .iter()
            .map(|target| format!("{}={}", target, self.level))
            .collect::<Vec<_>>()
            .join(",")
    }
}
