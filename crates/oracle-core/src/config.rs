//! Configuration for the gateway and the dashboard around it.
//!
//! Everything is resolved once at startup. The gateway only ever sees a
//! [`GatewayConfig`]; the rest of [`AppConfig`] drives defaults and display.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::types::Timeframe;

pub const PRODUCTION_ANALYSIS_URL: &str = "https://marketoracle-1.onrender.com";
pub const DEVELOPMENT_ANALYSIS_URL: &str = "http://localhost:8000";
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Connection settings injected into the request gateway
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// Host serving the analysis endpoint
    pub analysis_base_url: String,
    /// Prefix for auth, usage, preferences and trade endpoints
    pub api_base_url: String,
    /// Serve canned data instead of calling the network, where supported
    pub use_mocks: bool,
    /// `None` means no client-side timeout
    pub request_timeout: Option<Duration>,
}

impl GatewayConfig {
    pub fn new(analysis_base_url: impl Into<String>, api_base_url: impl Into<String>) -> Self {
        Self {
            analysis_base_url: trim_base(analysis_base_url.into()),
            api_base_url: trim_base(api_base_url.into()),
            use_mocks: false,
            request_timeout: None,
        }
    }

    pub fn with_mocks(mut self, use_mocks: bool) -> Self {
        self.use_mocks = use_mocks;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let production = lookup("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);
        let analysis_default = if production {
            PRODUCTION_ANALYSIS_URL
        } else {
            DEVELOPMENT_ANALYSIS_URL
        };

        let request_timeout = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(raw) if !raw.trim().is_empty() => {
                let secs: u64 = parse_value("REQUEST_TIMEOUT_SECS", &raw)?;
                Some(Duration::from_secs(secs))
            }
            _ => None,
        };

        Ok(Self {
            analysis_base_url: trim_base(
                lookup("ANALYSIS_BASE_URL").unwrap_or_else(|| analysis_default.to_string()),
            ),
            api_base_url: trim_base(
                lookup("API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            ),
            use_mocks: lookup("USE_MOCKS").map(|v| v.trim() == "true").unwrap_or(false),
            request_timeout,
        })
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new(DEVELOPMENT_ANALYSIS_URL, DEFAULT_API_BASE_URL)
    }
}

fn trim_base(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn parse_value<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradingDefaults {
    pub default_pair: String,
    pub default_timeframe: Timeframe,
    pub default_amount: f64,
    pub available_pairs: Vec<String>,
    pub available_timeframes: Vec<Timeframe>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveModeConfig {
    pub enabled: bool,
    pub update_interval: Duration,
    /// Polling stops after this many updates
    pub max_updates: u32,
}

/// Score boundaries for confidence levels (inclusive lower bounds)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceThresholds {
    pub excellent: f64,
    pub good: f64,
    pub acceptable: f64,
    pub poor: f64,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            excellent: 90.0,
            good: 80.0,
            acceptable: 70.0,
            poor: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskManagementConfig {
    pub min_risk_reward_ratio: f64,
    /// Fraction of the portfolio
    pub max_position_size: f64,
}

impl RiskManagementConfig {
    /// Default stop-loss distance, as a fraction of entry, for a timeframe.
    pub fn default_stop_loss(&self, timeframe: Timeframe) -> f64 {
        timeframe.default_stop_loss()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadConstraints {
    pub max_file_size: u64,
    pub allowed_types: Vec<String>,
    pub max_files: u32,
}

impl Default for UploadConstraints {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            allowed_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/webp".to_string(),
            ],
            max_files: 1,
        }
    }
}

/// Fixed user-facing strings
#[derive(Debug, Clone, PartialEq)]
pub struct Messages {
    pub file_too_large: &'static str,
    pub invalid_file_type: &'static str,
    pub api_error: &'static str,
    pub no_file_selected: &'static str,
    pub analysis_failed: &'static str,
    pub login_failed: &'static str,
    pub registration_failed: &'static str,
    pub analysis_complete: &'static str,
    pub live_mode_enabled: &'static str,
    pub live_mode_disabled: &'static str,
    pub analyzing: &'static str,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            file_too_large: "File size must be less than 10MB",
            invalid_file_type: "Please upload a valid image file (PNG, JPG, WebP)",
            api_error: "Error connecting to trading bot. Please try again.",
            no_file_selected: "Please select a chart image to analyze",
            analysis_failed: "Analysis failed. Please check your input and try again.",
            login_failed: "Login failed. Please check your credentials.",
            registration_failed: "Registration failed. Please try again.",
            analysis_complete: "Analysis completed successfully!",
            live_mode_enabled: "Live mode enabled",
            live_mode_disabled: "Live mode disabled",
            analyzing: "Analyzing market data...",
        }
    }
}

/// Full dashboard configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub app: AppInfo,
    pub gateway: GatewayConfig,
    pub trading: TradingDefaults,
    pub live_mode: LiveModeConfig,
    pub confidence: ConfidenceThresholds,
    pub risk: RiskManagementConfig,
    pub upload: UploadConstraints,
    pub messages: Messages,
    /// Where the dashboard keeps the current login between runs
    pub token_file: PathBuf,
}

const DEFAULT_PAIRS: [&str; 8] = [
    "BTCUSDT", "ETHUSDT", "SOLUSDT", "ADAUSDT", "DOGEUSDT", "LINKUSDT", "MATICUSDT", "DOTUSDT",
];

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gateway = GatewayConfig::from_lookup(&lookup)?;

        let available_pairs: Vec<String> = lookup("AVAILABLE_PAIRS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_uppercase())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| DEFAULT_PAIRS.iter().map(|s| s.to_string()).collect());

        let default_timeframe = match lookup("DEFAULT_TIMEFRAME") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "DEFAULT_TIMEFRAME",
                value: raw.clone(),
            })?,
            None => Timeframe::Hour1,
        };

        let default_amount = match lookup("DEFAULT_AMOUNT") {
            Some(raw) => parse_value("DEFAULT_AMOUNT", &raw)?,
            None => 1000.0,
        };

        let update_interval_ms: u64 = match lookup("LIVE_UPDATE_INTERVAL") {
            Some(raw) => parse_value("LIVE_UPDATE_INTERVAL", &raw)?,
            None => 30_000,
        };

        let max_updates = match lookup("LIVE_MAX_UPDATES") {
            Some(raw) => parse_value("LIVE_MAX_UPDATES", &raw)?,
            None => 100,
        };

        let token_file = lookup("TOKEN_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(default_token_file);

        Ok(Self {
            app: AppInfo {
                name: lookup("APP_NAME").unwrap_or_else(|| "MarketOracle Dashboard".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: "Multi-timeframe crypto trade analysis dashboard".to_string(),
            },
            gateway,
            trading: TradingDefaults {
                default_pair: lookup("DEFAULT_PAIR")
                    .map(|p| p.trim().to_uppercase())
                    .unwrap_or_else(|| "BTCUSDT".to_string()),
                default_timeframe,
                default_amount,
                available_pairs,
                available_timeframes: Timeframe::ALL.to_vec(),
            },
            live_mode: LiveModeConfig {
                enabled: lookup("ENABLE_LIVE_MODE").map(|v| v.trim() != "false").unwrap_or(true),
                update_interval: Duration::from_millis(update_interval_ms),
                max_updates,
            },
            confidence: ConfidenceThresholds::default(),
            risk: RiskManagementConfig {
                min_risk_reward_ratio: 1.5,
                max_position_size: 0.1,
            },
            upload: UploadConstraints::default(),
            messages: Messages::default(),
            token_file,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trading.available_pairs.is_empty() {
            return Err(ConfigError::Invalid("At least one trading pair required".into()));
        }
        if !self
            .trading
            .available_pairs
            .iter()
            .any(|p| p == &self.trading.default_pair)
        {
            return Err(ConfigError::Invalid(format!(
                "Default pair {} is not in the available pairs",
                self.trading.default_pair
            )));
        }
        if self.trading.default_amount <= 0.0 {
            return Err(ConfigError::Invalid("DEFAULT_AMOUNT must be positive".into()));
        }
        if self.live_mode.update_interval.is_zero() {
            return Err(ConfigError::Invalid("LIVE_UPDATE_INTERVAL must be positive".into()));
        }
        let c = &self.confidence;
        if !(c.excellent >= c.good && c.good >= c.acceptable && c.acceptable >= c.poor) {
            return Err(ConfigError::Invalid("Confidence thresholds must be descending".into()));
        }
        Ok(())
    }
}

fn default_token_file() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("marketoracle")
        .join("token.json")
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
    fn test_gateway_defaults() {
        let config = GatewayConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.analysis_base_url, DEVELOPMENT_ANALYSIS_URL);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert!(!config.use_mocks);
        assert_eq!(config.request_timeout, None);
    }

    #[test]
    fn test_production_analysis_host() {
        let config = GatewayConfig::from_lookup(lookup_from(&[("APP_ENV", "production")])).unwrap();
        assert_eq!(config.analysis_base_url, PRODUCTION_ANALYSIS_URL);
    }

    #[test]
    fn test_mock_flag_is_exact_true() {
        let on = GatewayConfig::from_lookup(lookup_from(&[("USE_MOCKS", "true")])).unwrap();
        let off = GatewayConfig::from_lookup(lookup_from(&[("USE_MOCKS", "yes")])).unwrap();
        assert!(on.use_mocks);
        assert!(!off.use_mocks);
    }

    #[test]
    fn test_base_urls_are_trimmed() {
        let config = GatewayConfig::from_lookup(lookup_from(&[
            ("ANALYSIS_BASE_URL", "http://analysis.local/"),
            ("API_BASE_URL", "http://api.local/api/"),
            ("REQUEST_TIMEOUT_SECS", "15"),
        ]))
        .unwrap();
        assert_eq!(config.analysis_base_url, "http://analysis.local");
        assert_eq!(config.api_base_url, "http://api.local/api");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_invalid_timeout_names_key() {
        let err = GatewayConfig::from_lookup(lookup_from(&[("REQUEST_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "REQUEST_TIMEOUT_SECS",
                value: "soon".to_string()
            }
        );
    }

    #[test]
    fn test_app_config_defaults_validate() {
        let config = AppConfig::from_lookup(lookup_from(&[("TOKEN_FILE", "/tmp/token.json")])).unwrap();
        assert_eq!(config.trading.default_pair, "BTCUSDT");
        assert_eq!(config.trading.default_timeframe, Timeframe::Hour1);
        assert_eq!(config.trading.default_amount, 1000.0);
        assert_eq!(config.trading.available_pairs.len(), 8);
        assert_eq!(config.live_mode.update_interval, Duration::from_secs(30));
        assert_eq!(config.live_mode.max_updates, 100);
        assert!(config.live_mode.enabled);
        assert_eq!(config.token_file, PathBuf::from("/tmp/token.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_app_config_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("AVAILABLE_PAIRS", "ethusdt, solusdt,"),
            ("DEFAULT_PAIR", "solusdt"),
            ("DEFAULT_TIMEFRAME", "4h"),
            ("DEFAULT_AMOUNT", "250"),
            ("LIVE_UPDATE_INTERVAL", "5000"),
            ("ENABLE_LIVE_MODE", "false"),
        ]))
        .unwrap();
        assert_eq!(config.trading.available_pairs, vec!["ETHUSDT", "SOLUSDT"]);
        assert_eq!(config.trading.default_pair, "SOLUSDT");
        assert_eq!(config.trading.default_timeframe, Timeframe::Hour4);
        assert_eq!(config.live_mode.update_interval, Duration::from_secs(5));
        assert!(!config.live_mode.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_default_pair() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("AVAILABLE_PAIRS", "ETHUSDT"),
            ("DEFAULT_PAIR", "BTCUSDT"),
        ]))
        .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = AppConfig::from_lookup(lookup_from(&[("LIVE_UPDATE_INTERVAL", "0")])).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_stop_loss_by_timeframe() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.risk.default_stop_loss(Timeframe::Min5), 0.005);
        assert_eq!(config.risk.default_stop_loss(Timeframe::Hour1), 0.01);
        assert_eq!(config.risk.default_stop_loss(Timeframe::Daily), 0.02);
    }
}
