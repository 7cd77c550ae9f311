use config::{Config, ConfigError, Environment, File};
use journal::JournalConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RegistryConfig {
    /// Reject references that do not resolve to an existing version.
    /// Default: true. A policy flag, never per-call behavior.
    #[serde(default = "default_references_strict")]
    pub references_strict: bool,
    /// Seconds a write waits for its own journal apply. Default: 30.
    #[serde(default = "default_response_timeout_secs")]
    pub response_timeout_secs: u64,
    /// Bound of the consumer-to-sink hand-off queue. Default: 256.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_references_strict() -> bool {
    true
}
fn default_response_timeout_secs() -> u64 {
    30
}
fn default_channel_capacity() -> usize {
    256
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            references_strict: default_references_strict(),
            response_timeout_secs: default_response_timeout_secs(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub journal: JournalConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600_i64)?
            .set_default("database.url", "sqlite::memory:")?
            .set_default("journal.topic", "registry-journal")?
            .set_default("journal.bootstrap_servers", "localhost:9092")?
            .set_default("journal.partitions", 1_i64)?
            .set_default("journal.poll_timeout_ms", 1000_i64)?
            .set_default("registry.references_strict", true)?
            .set_default("registry.response_timeout_secs", 30_i64)?
            .set_default("registry.channel_capacity", 256_i64)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., ARTICHOKE__DATABASE__URL)
            .add_source(Environment::with_prefix("ARTICHOKE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
