//! Server configuration management
//!
//! Configuration is layered: defaults, then an optional TOML file, then
//! `TICKSTREAM_*` environment variables, then CLI arguments.
//!
//! ```toml
//! port = 8080
//! log_level = "debug"
//!
//! [stream]
//! tick_interval_ms = 2000
//!
//! [synthesis]
//! volatility = 0.0005
//! seed = 42
//!
//! [sources]
//! indices_primary_url = "https://example.invalid/indices"
//! ```

use adapter_sources::SyntheticFlow;
use feed_core::{CoreError, SynthesisParams};
use feed_hub::HubConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Prefix shared by every environment variable the server reads
pub const ENV_PREFIX: &str = "TICKSTREAM_";

/// Reasons a configuration is rejected
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("port {0} is not usable; pick 1-65535")]
    InvalidPort(u16),

    #[error("unknown log level '{0}' (trace, debug, info, warn, error)")]
    InvalidLogLevel(String),

    #[error("unknown environment '{0}' (development, staging, production)")]
    InvalidEnvironment(String),

    #[error("{field} {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("synthesis: {0}")]
    Synthesis(#[from] CoreError),

    #[error("config file: {0}")]
    FileError(String),

    #[error("environment: {0}")]
    EnvError(String),
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

fn lookup_name<T: Copy>(table: &[(&str, T)], raw: &str) -> Option<T> {
    let raw = raw.trim().to_ascii_lowercase();
    table.iter().find(|(name, _)| *name == raw).map(|(_, value)| *value)
}

/// Verbosity passed to the tracing filter. Parsed case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    const NAMES: [(&'static str, LogLevel); 5] = [
        ("trace", LogLevel::Trace),
        ("debug", LogLevel::Debug),
        ("info", LogLevel::Info),
        ("warn", LogLevel::Warn),
        ("error", LogLevel::Error),
    ];

    /// `EnvFilter` directive for this level
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup_name(&Self::NAMES, s).ok_or_else(|| ConfigError::InvalidLogLevel(s.to_string()))
    }
}

impl TryFrom<String> for LogLevel {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, ConfigError> {
        value.parse()
    }
}

impl From<LogLevel> for &'static str {
    fn from(level: LogLevel) -> Self {
        level.as_filter_str()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

/// Deployment environment; `dev`, `stage` and `prod` are accepted too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    const NAMES: [(&'static str, Environment); 6] = [
        ("development", Environment::Development),
        ("dev", Environment::Development),
        ("staging", Environment::Staging),
        ("stage", Environment::Staging),
        ("production", Environment::Production),
        ("prod", Environment::Production),
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup_name(&Self::NAMES, s).ok_or_else(|| ConfigError::InvalidEnvironment(s.to_string()))
    }
}

impl TryFrom<String> for Environment {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Environment> for &'static str {
    fn from(env: Environment) -> Self {
        env.as_str()
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `[stream]`: broadcast timing and per-connection buffering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSection {
    pub tick_interval_ms: u64,
    pub send_timeout_ms: u64,
    /// Price updates buffered per connection before sends start to block
    pub outbound_buffer: usize,
    pub symbol_idle_eviction_secs: u64,
}

impl Default for StreamSection {
    fn default() -> Self {
        Self {
            tick_interval_ms: 2000,
            send_timeout_ms: 250,
            outbound_buffer: 64,
            symbol_idle_eviction_secs: 600,
        }
    }
}

impl StreamSection {
    /// Hub timing derived from this section
    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            send_timeout: Duration::from_millis(self.send_timeout_ms),
            symbol_idle_eviction: Duration::from_secs(self.symbol_idle_eviction_secs),
        }
    }
}

/// `[synthesis]`: tick model parameters plus an optional seed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisSection {
    /// Fixed seed for reproducible price paths; entropy when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(flatten)]
    pub model: SynthesisParams,
}

/// `[sources]`: upstream endpoints and cache policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesSection {
    pub cache_ttl_secs: u64,
    pub request_timeout_ms: u64,
    pub indices_primary_url: Option<String>,
    pub indices_mirror_url: Option<String>,
    pub flow_primary_url: Option<String>,
    pub flow_mirror_url: Option<String>,
    /// Period of the index snapshot stream
    pub snapshot_interval_ms: u64,
    /// Standard deviation of synthetic index moves, as a fraction of base
    pub fallback_index_sigma: f64,
    /// Mean and standard deviation of a synthetic FII buy or sell figure (crore)
    pub fallback_fii: (f64, f64),
    /// Mean and standard deviation of a synthetic DII buy or sell figure (crore)
    pub fallback_dii: (f64, f64),
}

impl Default for SourcesSection {
    fn default() -> Self {
        let flow = SyntheticFlow::default();
        Self {
            cache_ttl_secs: 300,
            request_timeout_ms: 3000,
            indices_primary_url: None,
            indices_mirror_url: None,
            flow_primary_url: None,
            flow_mirror_url: None,
            snapshot_interval_ms: 5000,
            fallback_index_sigma: 0.005,
            fallback_fii: flow.fii,
            fallback_dii: flow.dii,
        }
    }
}

impl SourcesSection {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_millis(self.snapshot_interval_ms)
    }
}

/// `[bars]`: batch bar generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BarsSection {
    pub daily_volatility: f64,
    pub max_days: usize,
    /// Day count used when a request names none
    pub default_days: usize,
}

impl Default for BarsSection {
    fn default() -> Self {
        Self {
            daily_volatility: 0.02,
            max_days: 365,
            default_days: 30,
        }
    }
}

/// Everything the server reads at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: LogLevel,
    pub environment: Environment,
    /// Grace period for open connections after a shutdown signal
    pub shutdown_timeout_secs: u64,
    pub stream: StreamSection,
    pub synthesis: SynthesisSection,
    pub sources: SourcesSection,
    pub bars: BarsSection,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: LogLevel::Info,
            environment: Environment::Development,
            shutdown_timeout_secs: 30,
            stream: StreamSection::default(),
            synthesis: SynthesisSection::default(),
            sources: SourcesSection::default(),
            bars: BarsSection::default(),
        }
    }
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::EnvError(format!("{ENV_PREFIX}{name}={value}")))
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim().to_string();
    (!value.is_empty()).then_some(value)
}

impl ServerConfig {
    /// Defaults overridden by environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|name| std::env::var(format!("{ENV_PREFIX}{name}")).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileError(format!("cannot read {}: {e}", path.display())))?;
        let config: ServerConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::FileError(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from variables found by `lookup`.
    ///
    /// `lookup` receives names without the `TICKSTREAM_` prefix and
    /// returns `None` for unset variables.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.port = parse_env("PORT", &port)?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = LogLevel::from_str(&level)?;
        }
        if let Some(env) = lookup("ENV") {
            self.environment = Environment::from_str(&env)?;
        }
        if let Some(secs) = lookup("SHUTDOWN_TIMEOUT_SECS") {
            self.shutdown_timeout_secs = parse_env("SHUTDOWN_TIMEOUT_SECS", &secs)?;
        }
        if let Some(ms) = lookup("TICK_INTERVAL_MS") {
            self.stream.tick_interval_ms = parse_env("TICK_INTERVAL_MS", &ms)?;
        }
        if let Some(seed) = lookup("SEED") {
            self.synthesis.seed = Some(parse_env("SEED", &seed)?);
        }
        if let Some(secs) = lookup("CACHE_TTL_SECS") {
            self.sources.cache_ttl_secs = parse_env("CACHE_TTL_SECS", &secs)?;
        }
        if let Some(url) = lookup("INDICES_PRIMARY_URL") {
            self.sources.indices_primary_url = non_empty(url);
        }
        if let Some(url) = lookup("INDICES_MIRROR_URL") {
            self.sources.indices_mirror_url = non_empty(url);
        }
        if let Some(url) = lookup("FLOW_PRIMARY_URL") {
            self.sources.flow_primary_url = non_empty(url);
        }
        if let Some(url) = lookup("FLOW_MIRROR_URL") {
            self.sources.flow_mirror_url = non_empty(url);
        }
        Ok(())
    }

    /// Reject values the hub, sources or bar generator cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }
        if self.stream.tick_interval_ms == 0 {
            return Err(ConfigError::invalid("stream.tick_interval_ms", "must be non-zero"));
        }
        if self.stream.send_timeout_ms == 0 {
            return Err(ConfigError::invalid("stream.send_timeout_ms", "must be non-zero"));
        }
        if self.stream.outbound_buffer == 0 {
            return Err(ConfigError::invalid("stream.outbound_buffer", "must be non-zero"));
        }
        self.synthesis.model.validate()?;
        if self.sources.cache_ttl_secs == 0 {
            return Err(ConfigError::invalid("sources.cache_ttl_secs", "must be non-zero"));
        }
        if self.sources.request_timeout_ms == 0 {
            return Err(ConfigError::invalid("sources.request_timeout_ms", "must be non-zero"));
        }
        if self.sources.snapshot_interval_ms == 0 {
            return Err(ConfigError::invalid(
                "sources.snapshot_interval_ms",
                "must be non-zero",
            ));
        }
        let vol = self.bars.daily_volatility;
        if !(vol.is_finite() && vol > 0.0 && vol < 1.0) {
            return Err(ConfigError::invalid("bars.daily_volatility", "must lie in (0, 1)"));
        }
        if self.bars.max_days == 0 {
            return Err(ConfigError::invalid("bars.max_days", "must be non-zero"));
        }
        if self.bars.default_days == 0 || self.bars.default_days > self.bars.max_days {
            return Err(ConfigError::invalid(
                "bars.default_days",
                "must lie in 1..=max_days",
            ));
        }
        Ok(())
    }

    /// `host:port` to bind
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Apply command-line overrides on top of everything else
    pub fn merge_with_cli(&mut self, cli: &CliArgs) -> Result<(), ConfigError> {
        if let Some(host) = &cli.host {
            self.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(log_level) = &cli.log_level {
            self.log_level = LogLevel::from_str(log_level)?;
        }
        if let Some(seed) = cli.seed {
            self.synthesis.seed = Some(seed);
        }
        Ok(())
    }
}

/// Command-line overrides, already parsed by the binary
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// TOML file to start from
    pub config_file: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    /// Overrides `synthesis.seed`
    pub seed: Option<u64>,
}

/// Resolve the effective configuration.
///
/// Later layers win: defaults, the file named by `cli.config_file`,
/// `TICKSTREAM_*` variables, then the command line. The result is
/// validated once more after the last layer.
pub fn build_config(cli: &CliArgs) -> Result<ServerConfig, ConfigError> {
    let mut config = if let Some(config_path) = &cli.config_file {
        ServerConfig::from_file(config_path)?
    } else {
        ServerConfig::default()
    };

    config.apply_env(|name| std::env::var(format!("{ENV_PREFIX}{name}")).ok())?;
    config.merge_with_cli(cli)?;
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.shutdown_timeout_secs, 30);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.stream.tick_interval_ms, 2000);
        assert_eq!(config.sources.cache_ttl_secs, 300);
        assert!(config.synthesis.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str("trace").unwrap(), LogLevel::Trace);
        assert_eq!(LogLevel::from_str("DEBUG").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("Warn").unwrap(), LogLevel::Warn);
        assert!(LogLevel::from_str(" info ").is_ok());
        assert!(LogLevel::from_str("verbose").is_err());
    }

    #[test]
    fn test_log_level_try_from_string() {
        assert_eq!(LogLevel::try_from("error".to_string()).unwrap(), LogLevel::Error);
        assert!(matches!(
            LogLevel::try_from("loud".to_string()),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn test_toml_enum_values_are_case_insensitive() {
        let config: ServerConfig =
            toml::from_str("log_level = \"WARN\"\nenvironment = \"Prod\"").unwrap();
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.environment, Environment::Production);
        assert!(toml::from_str::<ServerConfig>("log_level = \"loud\"").is_err());
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(Environment::from_str("dev").unwrap(), Environment::Development);
        assert_eq!(Environment::from_str("stage").unwrap(), Environment::Staging);
        assert_eq!(Environment::from_str("PROD").unwrap(), Environment::Production);
        assert!(Environment::from_str("qa").is_err());
        assert_eq!(Environment::Staging.to_string(), "staging");
    }

    #[test]
    fn test_hub_config_conversion() {
        let hub = StreamSection::default().hub_config();
        assert_eq!(hub.tick_interval, Duration::from_secs(2));
        assert_eq!(hub.send_timeout, Duration::from_millis(250));
        assert_eq!(hub.symbol_idle_eviction, Duration::from_secs(600));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ServerConfig::default();
        config.port = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPort(0))));

        let mut config = ServerConfig::default();
        config.stream.tick_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.sources.cache_ttl_secs = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.synthesis.model.floor_ratio = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::Synthesis(_))));

        let mut config = ServerConfig::default();
        config.synthesis.model.volume_min = 10;
        config.synthesis.model.volume_max = 5;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.bars.default_days = 400;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_sections() {
        let toml_str = r#"
            host = "127.0.0.1"
            port = 3000
            log_level = "debug"
            environment = "production"

            [stream]
            tick_interval_ms = 500

            [synthesis]
            seed = 42
            volatility = 0.001
            cap_window_ms = 2000

            [sources]
            cache_ttl_secs = 60
            indices_primary_url = "http://upstream.test/indices"

            [bars]
            max_days = 90
        "#;

        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.stream.tick_interval_ms, 500);
        assert_eq!(config.stream.send_timeout_ms, 250);
        assert_eq!(config.synthesis.seed, Some(42));
        assert_eq!(config.synthesis.model.volatility, 0.001);
        assert_eq!(config.synthesis.model.cap_window, Duration::from_secs(2));
        assert_eq!(config.synthesis.model.trend_decay, 0.95);
        assert_eq!(config.sources.cache_ttl_secs, 60);
        assert_eq!(
            config.sources.indices_primary_url.as_deref(),
            Some("http://upstream.test/indices")
        );
        assert!(config.sources.flow_primary_url.is_none());
        assert_eq!(config.bars.max_days, 90);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_deserialization() {
        let config: ServerConfig = toml::from_str("port = 9000").unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.stream.tick_interval_ms, 2000);
    }

    #[test]
    fn test_rendered_config_reloads() {
        let mut config = ServerConfig::default();
        config.log_level = LogLevel::Debug;
        config.synthesis.seed = Some(11);
        config.sources.flow_mirror_url = Some("http://mirror.local/flow".to_string());

        let rendered = toml::to_string_pretty(&config).unwrap();
        assert!(rendered.contains("log_level = \"debug\""));
        assert!(rendered.contains("cap_window_ms = 5000"));

        let reloaded: ServerConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(reloaded.log_level, LogLevel::Debug);
        assert_eq!(reloaded.synthesis.seed, Some(11));
        assert_eq!(reloaded.synthesis.model.cap_window, config.synthesis.model.cap_window);
        assert_eq!(reloaded.sources.flow_mirror_url, config.sources.flow_mirror_url);
        assert!(reloaded.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ServerConfig::default();
        config
            .apply_env(lookup(&[
                ("PORT", "9100"),
                ("LOG_LEVEL", "warn"),
                ("TICK_INTERVAL_MS", "750"),
                ("SEED", "7"),
                ("FLOW_PRIMARY_URL", "http://flow.test"),
                ("FLOW_MIRROR_URL", "  "),
            ]))
            .unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.stream.tick_interval_ms, 750);
        assert_eq!(config.synthesis.seed, Some(7));
        assert_eq!(config.sources.flow_primary_url.as_deref(), Some("http://flow.test"));
        assert!(config.sources.flow_mirror_url.is_none());
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_env_parse_failure() {
        let mut config = ServerConfig::default();
        let err = config.apply_env(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("TICKSTREAM_PORT=eighty"));
    }

    #[test]
    fn test_cli_args_merge() {
        let mut config = ServerConfig::default();
        let cli = CliArgs {
            host: Some("192.168.1.1".to_string()),
            port: Some(9000),
            log_level: Some("debug".to_string()),
            seed: Some(11),
            config_file: None,
        };

        config.merge_with_cli(&cli).unwrap();

        assert_eq!(config.host, "192.168.1.1");
        assert_eq!(config.port, 9000);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.synthesis.seed, Some(11));
    }

    #[test]
    fn test_cli_rejects_bad_log_level() {
        let mut config = ServerConfig::default();
        let cli = CliArgs {
            log_level: Some("chatty".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.merge_with_cli(&cli),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn test_from_missing_file() {
        let err = ServerConfig::from_file(&PathBuf::from("/nonexistent/tickstream.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileError(_)));
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            ..Default::default()
        };
        assert_eq!(config.socket_addr(), "127.0.0.1:3000");
    }
}
