//! Logging configuration and initialization.
//!
//! Every toolhub event is emitted under a `toolhub::<area>` target:
//! `startup`, `api`, `store`, `interactions`, `tools`. Presets pick a level per
//! area; `--log area=level` overrides one of them; `RUST_LOG`, when set,
//! replaces the whole filter.

use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const TARGET_PREFIX: &str = "toolhub::";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: '{}'. Use 'text' or 'json'.", s)),
        }
    }
}

/// Logging preset levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogPreset {
    /// Startup, API and failures; per-call store chatter off
    #[default]
    Production,
    /// Every toolhub area at info
    Verbose,
    /// Every toolhub area at debug, including each store operation
    Debug,
    /// Everything
    Trace,
    /// Warnings and errors only
    Quiet,
}

impl LogPreset {
    fn directives(self) -> Vec<&'static str> {
        match self {
            LogPreset::Production => vec![
                "toolhub::startup=info",
                "toolhub::api=info",
                "toolhub::interactions=warn",
                "toolhub::store=warn",
                "toolhub::tools=warn",
                "tower_http=warn",
            ],
            LogPreset::Verbose => vec!["toolhub=info", "tower_http=info"],
            LogPreset::Debug => vec!["toolhub=debug", "tower_http=debug"],
            LogPreset::Trace => vec!["toolhub=trace", "tower_http=trace"],
            LogPreset::Quiet => vec!["toolhub=warn", "tower_http=error"],
        }
    }
}

/// Logging configuration built from CLI arguments.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub preset: LogPreset,
    /// Per-target level overrides, keyed by full target name
    pub overrides: BTreeMap<String, Level>,
    pub format: LogFormat,
}

impl LogConfig {
    /// Create a new LogConfig from CLI arguments.
    ///
    /// Overrides are `target=level` pairs, comma-separated or repeated. Short
    /// targets get the `toolhub::` prefix; malformed pairs are ignored.
    pub fn from_cli(
        verbose: bool,
        debug: bool,
        trace: bool,
        quiet: bool,
        log_overrides: Vec<String>,
        format: LogFormat,
    ) -> Self {
        let preset = if quiet {
            LogPreset::Quiet
        } else if trace {
            LogPreset::Trace
        } else if debug {
            LogPreset::Debug
        } else if verbose {
            LogPreset::Verbose
        } else {
            LogPreset::Production
        };

        let overrides = log_overrides
            .iter()
            .flat_map(|arg| arg.split(','))
            .filter_map(parse_override)
            .collect();

        Self {
            preset,
            overrides,
            format,
        }
    }

    /// Filter directives for this configuration, overrides last.
    pub fn directives(&self) -> Vec<String> {
        let mut directives: Vec<String> = self
            .preset
            .directives()
            .into_iter()
            .map(String::from)
            .collect();
        for (target, level) in &self.overrides {
            directives.push(format!("{}={}", target, level.as_str().to_ascii_lowercase()));
        }
        directives
    }

    /// Build an EnvFilter, preferring `RUST_LOG` when it is set.
    pub fn build_filter(&self) -> EnvFilter {
        if let Ok(env_filter) = EnvFilter::try_from_default_env() {
            return env_filter;
        }
        EnvFilter::try_new(self.directives().join(",")).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

fn parse_override(pair: &str) -> Option<(String, Level)> {
    let (target, level) = pair.split_once('=')?;
    let target = target.trim();
    if target.is_empty() {
        return None;
    }
    let level = Level::from_str(level.trim()).ok()?;

    let full_target = if target == "toolhub" || target.starts_with(TARGET_PREFIX) || target == "tower_http" {
        target.to_string()
    } else {
        format!("{TARGET_PREFIX}{target}")
    };
    Some((full_target, level))
}

/// Initialize the tracing subscriber with the given configuration.
pub fn init(config: &LogConfig) {
    let filter = config.build_filter();

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false),
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE),
                )
                .init();
        }
    }
}
