//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Group chat configuration.
    #[serde(default)]
    pub chat: ChatConfig,
    /// Commodity price lookup configuration.
    #[serde(default)]
    pub market_prices: MarketPricesConfig,
    /// CORS configuration.
    #[serde(default)]
    pub cors: CorsConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Group chat configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Number of messages replayed when a client joins a room.
    #[serde(default = "default_history_limit")]
    pub history_limit: u64,
    /// Maximum rooms a single connection may be subscribed to.
    #[serde(default = "default_max_rooms")]
    pub max_rooms_per_connection: usize,
    /// Capacity of the in-process broadcast channel.
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

/// Commodity price lookup configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketPricesConfig {
    /// Upstream resource URL.
    #[serde(default = "default_market_base_url")]
    pub base_url: String,
    /// Upstream API key. Lookups fail with a server error while unset.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Number of records requested from upstream per lookup.
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: u32,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// How long upstream responses are reused.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

/// CORS configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins. Empty allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    5000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_history_limit() -> u64 {
    50
}

const fn default_max_rooms() -> usize {
    16
}

const fn default_broadcast_capacity() -> usize {
    1024
}

fn default_market_base_url() -> String {
    "https://api.data.gov.in/resource/9ef84268-d588-465a-a308-a864a43d0070".to_string()
}

const fn default_fetch_limit() -> u32 {
    1000
}

const fn default_timeout_secs() -> u64 {
    10
}

const fn default_cache_ttl_secs() -> u64 {
    300
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            max_rooms_per_connection: default_max_rooms(),
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

impl Default for MarketPricesConfig {
    fn default() -> Self {
        Self {
            base_url: default_market_base_url(),
            api_key: None,
            fetch_limit: default_fetch_limit(),
            timeout_secs: default_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present, into the process environment)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `RAWMATE_ENV`)
    /// 4. Environment variables with `RAWMATE__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("RAWMATE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("RAWMATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("RAWMATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
