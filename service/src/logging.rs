//! Terminal logging for the server binary.

use crate::config::Config;
use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// HTTP stack crates whose records only show up at `TRACE`.
const HTTP_STACK_MODULES: &[&str] = &["tower", "tower_http", "tracing", "hyper", "h2", "axum"];

pub struct Logger {}

impl Logger {
    /// Installs a `TermLogger` at the configured level with RFC3339 timestamps.
    /// A second call keeps the logger that is already installed.
    pub fn init_logger(config: &Config) {
        let level = config.log_level_filter;

        if let Err(e) = TermLogger::init(
            level,
            Self::log_config(level),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ) {
            eprintln!("Logger already initialized: {e}");
        }
    }

    /// Modules silenced at `level`: the HTTP stack, unless tracing.
    fn ignored_modules(level: LevelFilter) -> &'static [&'static str] {
        match level {
            LevelFilter::Trace => &[],
            _ => HTTP_STACK_MODULES,
        }
    }

    fn log_config(level: LevelFilter) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();

        for module in Self::ignored_modules(level) {
            builder.add_filter_ignore_str(module);
        }

        builder.build()
    }
}
