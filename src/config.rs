//! Application configuration loaded from `config.yaml` and the environment.
//!
//! Every section is optional; defaults reproduce the public endpoints the
//! front-end used before the gateway existed.

use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level application configuration.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ecos: EcosConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub yahoo: YahooConfig,
}

/// Server configuration settings.
///
/// Defines how the HTTP server should bind and what CORS origins to allow.
#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on (default: 3010)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Comma-separated list of allowed CORS origins (default: "*")
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

/// Bank of Korea ECOS statistics API
#[derive(Deserialize, Debug, Clone)]
pub struct EcosConfig {
    #[serde(default = "default_ecos_base_url")]
    pub base_url: String,
    /// Rows requested per page (ECOS caps this server-side)
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Maximum page requests in flight for one series
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// Rows requested from KeyStatisticList
    #[serde(default = "default_key_stats_limit")]
    pub key_stats_limit: usize,
}

impl Default for EcosConfig {
    fn default() -> Self {
        Self {
            base_url: default_ecos_base_url(),
            page_size: default_page_size(),
            max_in_flight: default_max_in_flight(),
            key_stats_limit: default_key_stats_limit(),
        }
    }
}

/// Settings shared by every outbound HTTP request
#[derive(Deserialize, Debug, Clone)]
pub struct UpstreamConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// OpenAI-compatible chat completion endpoint (OpenAI, Groq, LM Studio...)
#[derive(Deserialize, Debug, Clone)]
pub struct OpenAiConfig {
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Used by the prompt endpoint only
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            default_model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct YahooConfig {
    #[serde(default = "default_yahoo_base_url")]
    pub base_url: String,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: default_yahoo_base_url(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3010
}
fn default_allowed_origins() -> String {
    "*".to_string()
}
fn default_ecos_base_url() -> String {
    "https://ecos.bok.or.kr/api".to_string()
}
fn default_page_size() -> usize {
    100
}
fn default_max_in_flight() -> usize {
    8
}
fn default_key_stats_limit() -> usize {
    100
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_connect_timeout_secs() -> u64 {
    5
}
fn default_user_agent() -> String {
    format!("macro-data-gateway/{}", env!("CARGO_PKG_VERSION"))
}
fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_max_tokens() -> u32 {
    1000
}
fn default_temperature() -> f64 {
    0.7
}
fn default_yahoo_base_url() -> String {
    "https://query1.finance.yahoo.com".to_string()
}

impl AppConfig {
    /// Load from a YAML file; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!("{} not found, using default configuration", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse {} - check YAML syntax and structure", path.display()))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut config: Self = serde_yaml::from_str(content)?;
        config.normalize();
        Ok(config)
    }

    /// Apply `PORT`, `ALLOWED_ORIGINS` and `OPENAI_BASE_URL` overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Some(port) = env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.server.port = port;
        }
        if let Ok(origins) = env::var("ALLOWED_ORIGINS") {
            if !origins.trim().is_empty() {
                self.server.allowed_origins = origins;
            }
        }
        if let Ok(base_url) = env::var("OPENAI_BASE_URL") {
            if !base_url.trim().is_empty() {
                self.openai.base_url = base_url;
            }
        }
        self.normalize();
    }

    fn normalize(&mut self) {
        self.ecos.page_size = self.ecos.page_size.max(1);
        self.ecos.max_in_flight = self.ecos.max_in_flight.max(1);
        self.ecos.base_url = self.ecos.base_url.trim_end_matches('/').to_string();
        self.openai.base_url = self.openai.base_url.trim_end_matches('/').to_string();
        self.yahoo.base_url = self.yahoo.base_url.trim_end_matches('/').to_string();
    }
}
