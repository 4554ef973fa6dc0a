use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::fmt;
use std::str::FromStr;

/// Default name of the cookie carrying the sealed session.
pub const DEFAULT_SESSION_COOKIE_NAME: &str = "__session";

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that allowed to receive server responses.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "http://localhost:3000,https://localhost:3000"
    )]
    pub allowed_origins: Vec<String>,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 4000)]
    pub port: u16,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .map(|s| s.parse::<RustEnv>().unwrap()),
    )]
    pub runtime_env: RustEnv,

    /// Session expiry duration in seconds (default: 24 hours = 86400 seconds)
    #[arg(long, env, default_value_t = 86400)]
    pub backend_session_expiry_seconds: u64,

    /// 32-byte key (64 hex characters) used to seal session cookies.
    /// Required in production; development generates a throwaway key.
    #[arg(long, env)]
    session_key: Option<String>,

    /// Name of the cookie that carries the session.
    #[arg(long, env, default_value = DEFAULT_SESSION_COOKIE_NAME)]
    session_cookie_name: String,

    /// Seconds between keep-alive comments on open SSE connections (at least 1)
    #[arg(long, env, default_value_t = 15, value_parser = clap::value_parser!(u64).range(1..))]
    pub sse_keep_alive_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    /// Builds a config from defaults and environment only, ignoring the
    /// process arguments.
    pub fn from_defaults() -> Self {
        Config::parse_from([env!("CARGO_PKG_NAME")])
    }

    pub fn set_session_key(mut self, session_key: String) -> Self {
        self.session_key = Some(session_key);
        self
    }

    pub fn session_key(&self) -> Option<&str> {
        self.session_key.as_deref()
    }

    pub fn session_cookie_name(&self) -> &str {
        &self.session_cookie_name
    }

    pub fn listen_address(&self) -> String {
        format!(
            "{}:{}",
            self.interface.as_deref().unwrap_or("127.0.0.1"),
            self.port
        )
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }

    pub fn is_production(&self) -> bool {
        self.runtime_env() == RustEnv::Production
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_env_parses_case_insensitively() {
        assert_eq!("PRODUCTION".parse::<RustEnv>(), Ok(RustEnv::Production));
        assert_eq!("staging".parse::<RustEnv>(), Ok(RustEnv::Staging));
        assert_eq!("qa".parse::<RustEnv>(), Err(RustEnvParseError));
    }

    #[test]
    fn explicit_arguments_override_defaults() {
        let config = Config::parse_from([
            "beerich",
            "--port",
            "4747",
            "--runtime-env",
            "production",
            "--session-cookie-name",
            "bee",
            "--allowed-origins",
            "https://a.example,https://b.example",
        ]);

        assert_eq!(config.port, 4747);
        assert!(config.is_production());
        assert_eq!(config.session_cookie_name(), "bee");
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn set_session_key_is_readable_back() {
        let config = Config::parse_from(["beerich"]).set_session_key("ab".repeat(32));
        assert_eq!(config.session_key(), Some("ab".repeat(32).as_str()));
    }

    #[test]
    fn sse_keep_alive_must_be_at_least_one_second() {
        let rejected = Config::try_parse_from(["beerich", "--sse-keep-alive-seconds", "0"]);
        assert!(rejected.is_err());

        let config = Config::parse_from(["beerich", "--sse-keep-alive-seconds", "1"]);
        assert_eq!(config.sse_keep_alive_seconds, 1);
    }

    #[test]
    fn listen_address_joins_interface_and_port() {
        let config = Config::parse_from(["beerich", "--interface", "0.0.0.0", "--port", "8080"]);
        assert_eq!(config.listen_address(), "0.0.0.0:8080");
    }
}
