//! Configuration management for subscan.
//!
//! Settings are layered: built-in defaults, then `SUBSCAN_*` environment
//! variables, then command-line flags. `validate` runs once on the merged
//! result before a scanner is built.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::errors::ScanError;
use crate::providers::ProviderKind;

/// Default per-provider time budget.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(5);

/// Main configuration structure for subscan.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Scan engine settings
    pub scan: ScanConfig,

    /// Which providers run and where they are reached
    pub providers: ProvidersConfig,

    /// Transport settings shared by all providers
    pub http: HttpConfig,

    /// Human-oriented rendering options
    pub output: OutputConfig,

    /// Optional scan history store
    pub history: HistoryConfig,
}

#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Time budget for each provider; providers run concurrently
    pub provider_timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }
}

/// Per-provider toggle and endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub enabled: bool,
    pub base_url: String,
}

/// Provider registry in registration order.
#[derive(Debug, Clone)]
pub struct ProvidersConfig {
    pub entries: Vec<ProviderSettings>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            entries: ProviderKind::ALL
                .iter()
                .map(|kind| ProviderSettings {
                    kind: *kind,
                    enabled: true,
                    base_url: kind.default_base_url().to_string(),
                })
                .collect(),
        }
    }
}

impl ProvidersConfig {
    pub fn get(&self, kind: ProviderKind) -> Option<&ProviderSettings> {
        self.entries.iter().find(|p| p.kind == kind)
    }

    pub fn get_mut(&mut self, kind: ProviderKind) -> Option<&mut ProviderSettings> {
        self.entries.iter_mut().find(|p| p.kind == kind)
    }

    pub fn set_enabled(&mut self, kind: ProviderKind, enabled: bool) {
        if let Some(p) = self.get_mut(kind) {
            p.enabled = enabled;
        }
    }

    /// Enabled providers, in registration order.
    pub fn enabled(&self) -> impl Iterator<Item = &ProviderSettings> {
        self.entries.iter().filter(|p| p.enabled)
    }
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// User-Agent header sent to every provider
    pub user_agent: String,

    /// TCP/TLS connect timeout
    pub connect_timeout: Duration,

    /// Optional proxy URL applied to all providers
    pub proxy: Option<String>,

    /// Upper bound on a single response body
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("subscan/{}", env!("CARGO_PKG_VERSION")),
            connect_timeout: Duration::from_secs(3),
            proxy: None,
            max_body_bytes: 32 * 1024 * 1024, // 32MB; crt.sh answers for big zones are large
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether styled text output may use colors
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { color: true }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HistoryConfig {
    /// JSON-lines file that receives one entry per scan
    pub path: Option<PathBuf>,
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from `SUBSCAN_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unparsable numeric values are ignored and the default is kept.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(secs) = lookup("SUBSCAN_TIMEOUT_SECS")
            && let Ok(secs) = secs.trim().parse::<u64>()
        {
            config.scan.provider_timeout = Duration::from_secs(secs);
        }

        if let Some(list) = lookup("SUBSCAN_PROVIDERS") {
            let wanted: Vec<String> = list
                .split(',')
                .map(|s| s.trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
            for entry in &mut config.providers.entries {
                entry.enabled = wanted.iter().any(|w| w == entry.kind.name());
            }
        }

        for entry in &mut config.providers.entries {
            if let Some(url) = lookup(&entry.kind.env_url_key()) {
                entry.base_url = url.trim().trim_end_matches('/').to_string();
            }
        }

        if let Some(agent) = lookup("SUBSCAN_USER_AGENT") {
            config.http.user_agent = agent;
        }

        if let Some(proxy) = lookup("SUBSCAN_PROXY")
            && !proxy.trim().is_empty()
        {
            config.http.proxy = Some(proxy.trim().to_string());
        }

        if let Some(max) = lookup("SUBSCAN_MAX_BODY_BYTES")
            && let Ok(max) = max.trim().parse::<usize>()
        {
            config.http.max_body_bytes = max;
        }

        // https://no-color.org: any non-empty value disables color
        if let Some(no_color) = lookup("NO_COLOR")
            && !no_color.is_empty()
        {
            config.output.color = false;
        }

        if let Some(path) = lookup("SUBSCAN_HISTORY_FILE")
            && !path.trim().is_empty()
        {
            config.history.path = Some(PathBuf::from(path.trim()));
        }

        config
    }

    /// Merge with CLI arguments, giving CLI precedence
    pub fn merge_with_cli(&mut self, cli: &crate::cli::Cli) {
        if let Some(secs) = cli.timeout {
            self.scan.provider_timeout = Duration::from_secs(secs);
        }

        for kind in cli.disabled_providers() {
            self.providers.set_enabled(kind, false);
        }

        if let Some(ref proxy) = cli.proxy {
            self.http.proxy = Some(proxy.clone());
        }

        if let Some(ref path) = cli.history {
            self.history.path = Some(path.clone());
        }

        if cli.no_color {
            self.output.color = false;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.provider_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "scan.provider_timeout".to_string(),
                value: "0".to_string(),
                reason: "Timeout must be greater than 0".to_string(),
            });
        }

        if self.providers.enabled().next().is_none() {
            return Err(ConfigError::NoProviders);
        }

        for provider in self.providers.enabled() {
            check_http_url(&provider.base_url).map_err(|reason| ConfigError::InvalidValue {
                field: format!("providers.{}.base_url", provider.kind.name()),
                value: provider.base_url.clone(),
                reason,
            })?;
        }

        if self.http.max_body_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "http.max_body_bytes".to_string(),
                value: "0".to_string(),
                reason: "Body limit must be greater than 0".to_string(),
            });
        }

        if let Some(ref proxy) = self.http.proxy {
            url::Url::parse(proxy).map_err(|e| ConfigError::InvalidValue {
                field: "http.proxy".to_string(),
                value: proxy.clone(),
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }
}

fn check_http_url(raw: &str) -> Result<(), String> {
    let parsed = url::Url::parse(raw).map_err(|e| e.to_string())?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported scheme '{other}'")),
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Every provider is disabled
    #[error("No providers enabled; at least one source is required")]
    NoProviders,
}

impl From<ConfigError> for ScanError {
    fn from(e: ConfigError) -> Self {
        ScanError::configuration(e.to_string())
    }
}
