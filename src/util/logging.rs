//! Structured logging setup for pomalign
//!
//! Logs always go to stderr so the run summary on stdout stays machine
//! readable. The level comes from, in order: `--log-level`, `-v` (debug),
//! `-q` (error), `POMALIGN_LOG_LEVEL`, then info. When `RUST_LOG` is set it
//! replaces the default directives entirely.
//!
//! # Example
//!
//! ```no_run
//! use pomalign::util::logging;
//!
//! logging::init_from_env();
//!
//! use tracing::{debug, info};
//! info!("Realignment started");
//! debug!(pom = "app/pom.xml", "Loading descriptor");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Ensures logging is only initialized once
static INIT: Once = Once::new();

/// Noisy HTTP stack crates kept at warn unless `RUST_LOG` says otherwise
const QUIET_CRATES: &[&str] = &["h2", "hyper", "hyper_util", "reqwest"];

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level for pomalign's own events
    pub level: Level,

    /// Emit one JSON object per event
    pub use_json: bool,

    /// Include the module target (e.g. pomalign::rewrite) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Resolves the level from command-line flags, falling back to the environment
    ///
    /// ```
    /// use pomalign::util::LoggingConfig;
    /// use tracing::Level;
    ///
    /// let config = LoggingConfig::from_cli(None, true, false);
    /// assert_eq!(config.level, Level::DEBUG);
    /// ```
    pub fn from_cli(log_level: Option<&str>, verbose: bool, quiet: bool) -> Self {
        let level = if let Some(level_str) = log_level {
            parse_level(level_str)
        } else if verbose {
            Level::DEBUG
        } else if quiet {
            Level::ERROR
        } else {
            env_level()
        };
        Self {
            level,
            use_json: env_json(),
            ..Default::default()
        }
    }
}

/// Parses a log level from a string, falling back to INFO
///
/// ```
/// use pomalign::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("debug"), Level::DEBUG);
/// assert_eq!(parse_level("WARN"), Level::WARN);
/// assert_eq!(parse_level("loud"), Level::INFO);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

fn env_level() -> Level {
    env::var("POMALIGN_LOG_LEVEL")
        .map(|s| parse_level(&s))
        .unwrap_or(Level::INFO)
}

fn env_json() -> bool {
    env::var("POMALIGN_LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false)
}

/// Filter for a configuration; `RUST_LOG` wins when set
fn build_filter(config: &LoggingConfig) -> EnvFilter {
    if env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }
    let mut filter = EnvFilter::new(format!(
        "warn,pomalign={}",
        config.level.as_str().to_lowercase()
    ));
    for krate in QUIET_CRATES {
        if let Ok(directive) = format!("{}=warn", krate).parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

/// Installs the global subscriber; later calls are ignored
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = build_filter(&config);

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    });
}

/// Initializes logging from `POMALIGN_LOG_LEVEL` and `POMALIGN_LOG_JSON`
pub fn init_from_env() {
    init_logging(LoggingConfig::from_cli(None, false, false));
}
