//! Provides utilities to initialize logging for the harness and its test suites.
use std::env;

use tracing::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Environment variable name for the service label, which is appended to the whoami string.
pub const SVC_LABEL_ENVVAR: &str = "POX_HARNESS_SVC_LABEL";

/// Configuration for the logger.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// The whoami string, which is used to identify the flow in logs.
    whoami: String,

    /// Whether to emit the source file of each event.
    with_file: bool,

    /// Whether to emit the source line number of each event.
    with_line_number: bool,
}

impl LoggerConfig {
    /// Creates a new instance with whoami set and file/line reporting taken from the environment.
    pub fn new(whoami: String) -> Self {
        Self {
            whoami,
            with_file: env::var("LOG_FILE").is_ok_and(|v| v == "1"),
            with_line_number: env::var("LOG_LINE_NUM").is_ok_and(|v| v == "1"),
        }
    }

    /// Creates a new instance with the whoami string derived from the provided base name.
    pub fn with_base_name(s: &str) -> Self {
        Self::new(get_whoami_string(s))
    }

    /// Returns the whoami string this config was built with.
    pub fn whoami(&self) -> &str {
        &self.whoami
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::with_base_name("(pox-harness)")
    }
}

/// Initializes the logging subsystem with the provided config.
///
/// # Panics
///
/// Panics if a global subscriber has already been installed. Use [`try_init`] from test code that
/// may run several times in the same process.
pub fn init(config: LoggerConfig) {
    if let Err(err) = try_init(config) {
        panic!("logging already initialized: {err}");
    }
}

/// Initializes the logging subsystem, returning an error instead of panicking when a global
/// subscriber is already set.
pub fn try_init(config: LoggerConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filt = tracing_subscriber::EnvFilter::from_default_env();

    let stdout_sub = tracing_subscriber::fmt::layer()
        .compact()
        .event_format(
            tracing_subscriber::fmt::format()
                .with_file(config.with_file)
                .with_line_number(config.with_line_number),
        )
        .with_filter(filt);

    tracing_subscriber::registry().with(stdout_sub).try_init()?;

    info!(whoami = %config.whoami, "logging started");
    Ok(())
}

/// Gets the service label from the standard envvar, which should be included in the whoami string.
pub fn get_service_label_from_env() -> Option<String> {
    env::var(SVC_LABEL_ENVVAR).ok()
}

/// Computes a standard whoami string.
pub fn get_whoami_string(base: &str) -> String {
    match get_service_label_from_env() {
        Some(label) => format!("{base}%{label}"),
        None => base.to_owned(),
    }
}
