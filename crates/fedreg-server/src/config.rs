use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, time::Duration};

pub const DEFAULT_BASE_URL: &str = "https://www.federalregister.gov/api/v1";

/// Largest `per_page` the Federal Register search endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    /// Federal Register API client settings
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Fan-out and query sizing for the aggregation pipeline
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        // Upstream validations
        let base = self.upstream.base_url.trim();
        if base.is_empty() {
            return Err("upstream.base_url must not be empty".into());
        }
        match url::Url::parse(base) {
            Ok(u) if u.scheme() == "http" || u.scheme() == "https" => {}
            Ok(u) => {
                return Err(format!(
                    "upstream.base_url must use http or https, got '{}'",
                    u.scheme()
                ));
            }
            Err(e) => return Err(format!("upstream.base_url is not a valid URL: {e}")),
        }
        if self.upstream.timeout_secs == 0 {
            return Err("upstream.timeout_secs must be > 0".into());
        }
        // Aggregation validations
        let agg = &self.aggregation;
        if agg.max_concurrent == 0 {
            return Err("aggregation.max_concurrent must be > 0".into());
        }
        if agg.documents_per_agency == 0 || agg.documents_per_agency > MAX_PAGE_SIZE {
            return Err(format!(
                "aggregation.documents_per_agency must be between 1 and {MAX_PAGE_SIZE}"
            ));
        }
        if agg.recent_page_size == 0 || agg.recent_page_size > MAX_PAGE_SIZE {
            return Err(format!(
                "aggregation.recent_page_size must be between 1 and {MAX_PAGE_SIZE}"
            ));
        }
        if agg.lookback_days == 0 {
            return Err("aggregation.lookback_days must be > 0".into());
        }
        // Cache validation
        if self.cache.ttl_secs == Some(0) {
            return Err("cache.ttl_secs must be > 0 when set".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    /// `None` means snapshots never expire.
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache.ttl_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8000
}
fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout applied by the HTTP client
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Extra attempts for a failed per-agency document fetch (0 disables retries)
    #[serde(default)]
    pub max_retries: u32,
    /// Backoff before the first retry; doubles on each further attempt
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_user_agent() -> String {
    format!("fedreg/{}", env!("CARGO_PKG_VERSION"))
}
fn default_retry_backoff_ms() -> u64 {
    500
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            max_retries: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Maximum in-flight per-agency document fetches
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    #[serde(default = "default_documents_per_agency")]
    pub documents_per_agency: u32,
    /// How far back the per-agency document search reaches
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    /// Page size for the all-agencies recent documents listing
    #[serde(default = "default_recent_page_size")]
    pub recent_page_size: u32,
}

fn default_max_concurrent() -> usize {
    10
}
fn default_documents_per_agency() -> u32 {
    20
}
fn default_lookback_days() -> u32 {
    30
}
fn default_recent_page_size() -> u32 {
    100
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            documents_per_agency: default_documents_per_agency(),
            lookback_days: default_lookback_days(),
            recent_page_size: default_recent_page_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheConfig {
    /// Snapshot lifetime in seconds; unset keeps a snapshot until the next refresh
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub const DEFAULT_CONFIG_FILE: &str = "fedreg.toml";
    pub const CONFIG_PATH_ENV: &str = "FEDREG_CONFIG";
    pub const ENV_PREFIX: &str = "FEDREG";

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if pathbuf.exists() {
                    builder = builder.add_source(File::from(pathbuf));
                }
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g., FEDREG__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}
