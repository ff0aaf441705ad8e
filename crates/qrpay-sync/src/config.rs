//! # Client Configuration
//!
//! Configuration for the remote service connection and QR display policy.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     QRPAY_ENV=production                                               │
//! │     QRPAY_BASE_URL=http://10.0.0.5:5000                                │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path>, or the platform config dir:                       │
//! │     ~/.config/qrpay/terminal.toml (Linux)                              │
//! │     ~/Library/Application Support/com.qrpay.terminal/... (macOS)       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     development → http://localhost:5000                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [service]
//! environment = "development"   # development | production
//! base_url = "http://localhost:5000"
//! request_timeout_secs = 10
//! connect_timeout_secs = 5
//!
//! [retry]
//! max_retries = 2
//! initial_backoff_ms = 200
//! max_backoff_secs = 5
//!
//! [display]
//! ordering = "discard_stale"    # discard_stale | last_resolved_wins
//! currency_symbol = "₹"
//! qr_output_path = "qrcode.png"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{SyncError, SyncResult};

/// Service URL used in production deployments.
pub const PRODUCTION_BASE_URL: &str = "https://qr-genrator.onrender.com";

/// Service URL used during local development.
pub const DEVELOPMENT_BASE_URL: &str = "http://localhost:5000";

// =============================================================================
// Environment
// =============================================================================

/// Deployment environment; picks the service URL when none is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// The service URL for this environment.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Environment::Development => DEVELOPMENT_BASE_URL,
            Environment::Production => PRODUCTION_BASE_URL,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(SyncError::InvalidConfig(format!(
                "Unknown environment: '{}'. Valid options: development, production",
                other
            ))),
        }
    }
}

// =============================================================================
// Ordering Policy
// =============================================================================

/// How the coordinator treats QR responses that arrive out of order.
///
/// ## Policy Comparison
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Fetch A (seq 1, total 10) issued, then fetch B (seq 2, total 25).     │
/// │  B resolves first, A resolves later.                                    │
/// │                                                                         │
/// │  DISCARD_STALE (Default)            │  LAST_RESOLVED_WINS               │
/// │  ───────────────────────            │  ──────────────────               │
/// │  B → display seq 2                  │  B → display seq 2                │
/// │  A → older than seq 2, dropped      │  A → display seq 1 (stale!)       │
/// │  final: QR for 25                   │  final: QR for 10                 │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingPolicy {
    /// Drop responses older than the displayed one.
    #[default]
    DiscardStale,

    /// Display whatever resolves last, regardless of issue order.
    LastResolvedWins,
}

impl std::fmt::Display for OrderingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderingPolicy::DiscardStale => write!(f, "discard_stale"),
            OrderingPolicy::LastResolvedWins => write!(f, "last_resolved_wins"),
        }
    }
}

impl std::str::FromStr for OrderingPolicy {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "discard_stale" => Ok(OrderingPolicy::DiscardStale),
            "last_resolved_wins" => Ok(OrderingPolicy::LastResolvedWins),
            other => Err(SyncError::InvalidConfig(format!(
                "Unknown ordering policy: '{}'. Valid options: discard_stale, last_resolved_wins",
                other
            ))),
        }
    }
}

// =============================================================================
// Service Settings
// =============================================================================

/// Where the QR / total service lives and how long to wait for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSettings {
    #[serde(default)]
    pub environment: Environment,

    /// Explicit service URL; overrides the environment default.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Whole-request timeout (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// TCP/TLS connect timeout (seconds).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    10
}

fn default_connect_timeout() -> u64 {
    5
}

impl Default for ServiceSettings {
    fn default() -> Self {
        ServiceSettings {
            environment: Environment::default(),
            base_url: None,
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl ServiceSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

// =============================================================================
// Retry Settings
// =============================================================================

/// Retry behavior for transport failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Extra attempts after the first one. 0 disables retries.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First backoff interval (milliseconds).
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Backoff ceiling (seconds).
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,
}

fn default_max_retries() -> u32 {
    2
}

fn default_initial_backoff() -> u64 {
    200
}

fn default_max_backoff() -> u64 {
    5
}

impl Default for RetrySettings {
    fn default() -> Self {
        RetrySettings {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_secs: default_max_backoff(),
        }
    }
}

impl RetrySettings {
    /// No retries at all.
    pub fn disabled() -> Self {
        RetrySettings {
            max_retries: 0,
            ..Default::default()
        }
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs)
    }
}

// =============================================================================
// Display Settings
// =============================================================================

/// How the QR code and amounts are presented.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplaySettings {
    #[serde(default)]
    pub ordering: OrderingPolicy,

    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    /// File the live QR image is written to, if any.
    #[serde(default)]
    pub qr_output_path: Option<PathBuf>,
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

impl Default for DisplaySettings {
    fn default() -> Self {
        DisplaySettings {
            ordering: OrderingPolicy::default(),
            currency_symbol: default_currency_symbol(),
            qr_output_path: None,
        }
    }
}

// =============================================================================
// Main Client Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub service: ServiceSettings,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub display: DisplaySettings,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (terminal.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let explicit = config_path.is_some();
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else if explicit {
                return Err(SyncError::ConfigLoadFailed(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Client config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        self.base_url()?;

        if self.service.request_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.service.connect_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "connect_timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Resolves the service URL: explicit `base_url`, else the environment default.
    pub fn base_url(&self) -> SyncResult<Url> {
        let raw = self
            .service
            .base_url
            .as_deref()
            .unwrap_or_else(|| self.service.environment.default_base_url());

        let url = Url::parse(raw)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(SyncError::InvalidUrl(format!(
                "Service URL must start with http:// or https://, got: {}",
                raw
            )));
        }

        Ok(url)
    }

    /// Applies `QRPAY_*` overrides read through `lookup`.
    ///
    /// Takes the lookup as a function so tests do not have to touch the
    /// process environment.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(env) = lookup("QRPAY_ENV") {
            match env.parse() {
                Ok(parsed) => {
                    debug!(environment = %env, "Overriding environment from environment");
                    self.service.environment = parsed;
                }
                Err(e) => warn!(%e, "Ignoring QRPAY_ENV"),
            }
        }

        if let Some(url) = lookup("QRPAY_BASE_URL") {
            debug!(url = %url, "Overriding service URL from environment");
            self.service.base_url = Some(url);
        }

        if let Some(secs) = lookup("QRPAY_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.service.request_timeout_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring non-numeric QRPAY_TIMEOUT_SECS"),
            }
        }

        if let Some(retries) = lookup("QRPAY_MAX_RETRIES") {
            match retries.parse::<u32>() {
                Ok(r) => self.retry.max_retries = r,
                Err(_) => warn!(value = %retries, "Ignoring non-numeric QRPAY_MAX_RETRIES"),
            }
        }

        if let Some(ordering) = lookup("QRPAY_ORDERING") {
            match ordering.parse() {
                Ok(parsed) => self.display.ordering = parsed,
                Err(e) => warn!(%e, "Ignoring QRPAY_ORDERING"),
            }
        }

        if let Some(path) = lookup("QRPAY_QR_OUTPUT") {
            self.display.qr_output_path = Some(PathBuf::from(path));
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "qrpay", "terminal")
            .map(|dirs| dirs.config_dir().join("terminal.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.service.environment, Environment::Development);
        assert_eq!(config.base_url().unwrap().as_str(), "http://localhost:5000/");
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.display.ordering, OrderingPolicy::DiscardStale);
        assert_eq!(config.display.currency_symbol, "₹");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_environment_selects_base_url() {
        let mut config = ClientConfig::default();
        config.service.environment = Environment::Production;
        assert_eq!(
            config.base_url().unwrap().as_str(),
            "https://qr-genrator.onrender.com/"
        );

        config.service.base_url = Some("http://10.0.0.5:5000".into());
        assert_eq!(config.base_url().unwrap().as_str(), "http://10.0.0.5:5000/");
    }

    #[test]
    fn test_parsing_enums() {
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("Development".parse::<Environment>().unwrap(), Environment::Development);
        assert!("staging".parse::<Environment>().is_err());

        assert_eq!(
            "last-resolved-wins".parse::<OrderingPolicy>().unwrap(),
            OrderingPolicy::LastResolvedWins
        );
        assert!("newest".parse::<OrderingPolicy>().is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClientConfig::default();

        config.service.base_url = Some("ftp://example.com".into());
        assert!(matches!(config.validate(), Err(SyncError::InvalidUrl(_))));

        config.service.base_url = Some("not a url".into());
        assert!(matches!(config.validate(), Err(SyncError::InvalidUrl(_))));

        config.service.base_url = None;
        config.service.request_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(SyncError::InvalidConfig(_))));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ClientConfig::default();
        config.apply_overrides(lookup_from(&[
            ("QRPAY_ENV", "production"),
            ("QRPAY_TIMEOUT_SECS", "3"),
            ("QRPAY_MAX_RETRIES", "nope"),
            ("QRPAY_ORDERING", "last_resolved_wins"),
            ("QRPAY_QR_OUTPUT", "/tmp/qr.png"),
        ]));

        assert_eq!(config.service.environment, Environment::Production);
        assert_eq!(config.service.request_timeout_secs, 3);
        assert_eq!(config.retry.max_retries, 2); // invalid value ignored
        assert_eq!(config.display.ordering, OrderingPolicy::LastResolvedWins);
        assert_eq!(config.display.qr_output_path, Some(PathBuf::from("/tmp/qr.png")));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            [service]
            environment = "production"

            [display]
            ordering = "last_resolved_wins"
            "#,
        )
        .unwrap();

        assert_eq!(config.service.environment, Environment::Production);
        assert_eq!(config.service.request_timeout_secs, 10);
        assert_eq!(config.retry.initial_backoff_ms, 200);
        assert_eq!(config.display.ordering, OrderingPolicy::LastResolvedWins);
        assert_eq!(config.display.currency_symbol, "₹");
    }

    #[test]
    fn test_toml_serialization() {
        let config = ClientConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[service]"));
        assert!(toml_str.contains("[retry]"));
        assert!(toml_str.contains("[display]"));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let path = std::env::temp_dir().join("qrpay-definitely-missing-config.toml");
        assert!(matches!(
            ClientConfig::load(Some(path)),
            Err(SyncError::ConfigLoadFailed(_))
        ));
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir()
            .join(format!("qrpay-config-{}", uuid::Uuid::new_v4()))
            .join("terminal.toml");

        let mut config = ClientConfig::default();
        config.service.base_url = Some("http://127.0.0.1:5000".into());
        config.display.currency_symbol = "$".into();
        config.save(Some(path.clone())).unwrap();

        let loaded: ClientConfig =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.service.base_url.as_deref(), Some("http://127.0.0.1:5000"));
        assert_eq!(loaded.display.currency_symbol, "$");

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
