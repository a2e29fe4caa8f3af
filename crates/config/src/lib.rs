//! Configuration loading, validation, and management for Mellivora.
//!
//! Loads configuration from `~/.mellivora/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.mellivora/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key required on inbound requests (`x-api-key` header).
    /// None = auth disabled (local development only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// LLM provider settings (classifier + reply generator)
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Engine thresholds and timeouts
    #[serde(default)]
    pub engine: EngineConfig,

    /// Pattern extractor vocabulary
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Final-report collector settings
    #[serde(default)]
    pub collector: CollectorConfig,

    /// Gateway (HTTP server) settings
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("engine", &self.engine)
            .field("extractor", &self.extractor)
            .field("collector", &self.collector)
            .field("gateway", &self.gateway)
            .finish()
    }
}

/// LLM provider settings. Both collaborators (classifier and reply
/// generator) talk to the same OpenAI-compatible endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider API key (env: `GROQ_API_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// HTTP request timeout for provider calls
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".into()
}
fn default_model() -> String {
    "llama-3.3-70b-versatile".into()
}
fn default_request_timeout() -> u64 {
    30
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Engine thresholds. The defaults encode the engagement policy: engage
/// only above 0.7 confidence, hold at least 8 post-engagement messages,
/// and cap any conversation at 15 total messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Classification confidence required to engage
    #[serde(default = "default_engage_threshold")]
    pub engage_threshold: f32,

    /// Minimum messages after engagement before concluding
    #[serde(default = "default_min_engagement")]
    pub min_engagement_messages: usize,

    /// Total message count that forces conclusion regardless of evidence
    #[serde(default = "default_max_total")]
    pub max_total_messages: usize,

    /// Prior messages supplied to the classifier as context
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Per-call timeout for classifier and reply-generator invocations
    #[serde(default = "default_collaborator_timeout")]
    pub collaborator_timeout_secs: u64,
}

fn default_engage_threshold() -> f32 {
    0.7
}
fn default_min_engagement() -> usize {
    8
}
fn default_max_total() -> usize {
    15
}
fn default_history_window() -> usize {
    5
}
fn default_collaborator_timeout() -> u64 {
    20
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            engage_threshold: default_engage_threshold(),
            min_engagement_messages: default_min_engagement(),
            max_total_messages: default_max_total(),
            history_window: default_history_window(),
            collaborator_timeout_secs: default_collaborator_timeout(),
        }
    }
}

/// Pattern extractor vocabulary. All lists are extendable via config;
/// the defaults target the Indian payments ecosystem the honeypot was
/// built for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Domain suffixes that mark an `x@y` token as a payment handle
    /// rather than a generic e-mail address
    #[serde(default = "default_payment_suffixes")]
    pub payment_suffixes: Vec<String>,

    /// Link-shortener domains matched in addition to http(s)/www URLs
    #[serde(default = "default_url_shorteners")]
    pub url_shorteners: Vec<String>,

    /// Scam-indicator vocabulary (case-insensitive containment)
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
}

fn default_payment_suffixes() -> Vec<String> {
    [
        "paytm",
        "phonepe",
        "gpay",
        "ybl",
        "okaxis",
        "okhdfcbank",
        "oksbi",
        "okicici",
        "upi",
        "apl",
        "ibl",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_url_shorteners() -> Vec<String> {
    ["bit.ly", "tinyurl.com", "t.co", "cutt.ly", "rb.gy"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_keywords() -> Vec<String> {
    [
        // banking jargon
        "kyc", "update", "verify", "account", "blocked", "suspended", "otp", "cvv", "pin",
        "password", "aadhaar", "pan", "bank", "axis", "hdfc", "sbi", "icici", "paytm", "phonepe",
        "googlepay", "refund", "tax", "cashback", "reward", "loan approved", "credit card",
        // urgency
        "urgent", "immediately", "expire", "cancel", "offer",
        // lures
        "prize", "lottery", "won", "congratulations", "click here", "download", "apk", "install",
        "delivery", "courier", "parcel", "custom duty",
        // threats
        "police", "arrest", "court", "legal action",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            payment_suffixes: default_payment_suffixes(),
            url_shorteners: default_url_shorteners(),
            keywords: default_keywords(),
        }
    }
}

/// Where concluded-session reports are delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Collector endpoint URL (env: `MELLIVORA_COLLECTOR_URL`).
    /// None = reports are logged but not delivered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Delivery request timeout
    #[serde(default = "default_collector_timeout")]
    pub timeout_secs: u64,
}

fn default_collector_timeout() -> u64 {
    30
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: default_collector_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allow any origin (the original service ran behind a hackathon
    /// harness with open CORS). Disable for locked-down deployments.
    #[serde(default = "default_true")]
    pub cors_allow_any: bool,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8000
}
fn default_true() -> bool {
    true
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_allow_any: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.mellivora/config.toml).
    ///
    /// Environment variable overrides (highest priority):
    /// - `MELLIVORA_API_KEY` — inbound auth key
    /// - `GROQ_API_KEY` — provider key
    /// - `MELLIVORA_COLLECTOR_URL` — report collector endpoint
    /// - `PORT` — gateway port
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(key) = std::env::var("MELLIVORA_API_KEY") {
            config.api_key = Some(key);
        }
        if config.provider.api_key.is_none() {
            config.provider.api_key = std::env::var("GROQ_API_KEY").ok();
        }
        if let Ok(url) = std::env::var("MELLIVORA_COLLECTOR_URL") {
            config.collector.url = Some(url);
        }
        if let Ok(port) = std::env::var("PORT") {
            config.gateway.port = port.parse().map_err(|_| {
                ConfigError::ValidationError(format!("PORT is not a valid port number: {port}"))
            })?;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".mellivora")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.engine.engage_threshold) {
            return Err(ConfigError::ValidationError(
                "engine.engage_threshold must be between 0.0 and 1.0".into(),
            ));
        }

        if self.engine.min_engagement_messages == 0 {
            return Err(ConfigError::ValidationError(
                "engine.min_engagement_messages must be at least 1".into(),
            ));
        }

        if self.engine.max_total_messages < self.engine.min_engagement_messages {
            return Err(ConfigError::ValidationError(
                "engine.max_total_messages must be >= engine.min_engagement_messages".into(),
            ));
        }

        if self.extractor.payment_suffixes.is_empty() {
            return Err(ConfigError::ValidationError(
                "extractor.payment_suffixes must not be empty".into(),
            ));
        }

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: ProviderConfig::default(),
            engine: EngineConfig::default(),
            extractor: ExtractorConfig::default(),
            collector: CollectorConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine.engage_threshold, 0.7);
        assert_eq!(config.engine.min_engagement_messages, 8);
        assert_eq!(config.engine.max_total_messages, 15);
        assert_eq!(config.gateway.port, 8000);
        assert!(config.extractor.payment_suffixes.contains(&"paytm".into()));
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.engine.max_total_messages, 15);
        assert_eq!(parsed.provider.model, config.provider.model);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
            api_key = "secret"

            [engine]
            engage_threshold = 0.85
        "#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.engine.engage_threshold, 0.85);
        // Everything else falls back to defaults
        assert_eq!(config.engine.min_engagement_messages, 8);
        assert!(!config.extractor.keywords.is_empty());
    }

    #[test]
    fn invalid_threshold_rejected() {
        let toml_str = r#"
            [engine]
            engage_threshold = 1.5
        "#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn ceiling_below_minimum_rejected() {
        let toml_str = r#"
            [engine]
            min_engagement_messages = 10
            max_total_messages = 5
        "#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_missing_path_uses_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.gateway.port, 8000);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_key = \"from-file\"").unwrap();
        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = AppConfig {
            api_key: Some("super-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
