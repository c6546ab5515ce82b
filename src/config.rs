//! Configuration management
//!
//! Settings come from three layers, later ones winning: built-in defaults,
//! an optional TOML file, then command line / environment overrides. The
//! provider API key is only ever taken from the environment.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Text-improvement provider
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Background job workers
    #[serde(default)]
    pub jobs: JobsConfig,
    /// Input text bounds
    #[serde(default)]
    pub validation: ValidationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Requests still running after this many seconds get a 408
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// How long in-flight jobs may keep running after a shutdown signal
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_request_timeout() -> u64 {
    60
}

fn default_shutdown_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

/// Which improver backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible chat completions API
    #[serde(rename = "openai")]
    #[value(name = "openai")]
    OpenAi,
    /// Local stand-in, no network and no credential
    Simulated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_kind")]
    pub kind: ProviderKind,
    /// Read from `OPENAI_API_KEY`, never from or to the file
    #[serde(skip)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Per-call timeout; a timeout counts as a provider failure
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
    /// Artificial latency of the simulated provider
    #[serde(default = "default_simulated_delay")]
    pub simulated_delay_ms: u64,
}

fn default_provider_kind() -> ProviderKind {
    ProviderKind::OpenAi
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_system_prompt() -> String {
    "Improve the grammar and style of the following text.".to_string()
}

fn default_provider_timeout() -> u64 {
    30
}

fn default_simulated_delay() -> u64 {
    1000
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: default_provider_kind(),
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            system_prompt: default_system_prompt(),
            max_tokens: None,
            timeout_secs: default_provider_timeout(),
            simulated_delay_ms: default_simulated_delay(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Jobs allowed to run at once; extra submissions wait their turn
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_max_concurrent() -> usize {
    4
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
        }
    }
}

/// Bounds in characters, measured after trimming
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

fn default_min_chars() -> usize {
    5
}

fn default_max_chars() -> usize {
    1000
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_chars: default_min_chars(),
            max_chars: default_max_chars(),
        }
    }
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub provider: Option<ProviderKind>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl Config {
    /// Load configuration from `path`, or from the default location.
    ///
    /// An explicit path must exist. A missing default file means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = config_path()?;
                if default_path.exists() {
                    Self::from_file(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Layer overrides on top of the loaded values
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(key) = overrides.api_key {
            self.provider.api_key = Some(key);
        }
        if let Some(kind) = overrides.provider {
            self.provider.kind = kind;
        }
        if let Some(base_url) = overrides.base_url {
            self.provider.base_url = base_url;
        }
        if let Some(model) = overrides.model {
            self.provider.model = model;
        }
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
    }

    /// Reject configurations the service cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.provider.kind == ProviderKind::OpenAi
            && self.provider.api_key.as_deref().map_or(true, |k| k.trim().is_empty())
        {
            bail!("OPENAI_API_KEY is not set. Set it in the environment or a .env file.");
        }
        if self.validation.min_chars == 0 {
            bail!("validation.min_chars must be at least 1");
        }
        if self.validation.min_chars > self.validation.max_chars {
            bail!(
                "validation.min_chars ({}) is greater than validation.max_chars ({})",
                self.validation.min_chars,
                self.validation.max_chars
            );
        }
        if self.jobs.max_concurrent == 0 {
            bail!("jobs.max_concurrent must be at least 1");
        }
        Ok(())
    }

    /// Render as TOML (the API key is never included)
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

/// Get the default configuration file path
pub fn config_path() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "textsmith", "textsmith")
        .context("Failed to get project directories")?;
    Ok(base.config_dir().join("config.toml"))
}

/// Get default configuration as TOML string
pub fn default_config_toml() -> String {
    Config::default()
        .to_toml()
        .unwrap_or_else(|_| "# Default configuration\n".to_string())
}

/// Show the effective configuration
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.to_toml()?);
    let key_status = match config.provider.api_key.as_deref() {
        Some(key) if !key.trim().is_empty() => mask_key(key),
        _ => "not set".to_string(),
    };
    println!("# OPENAI_API_KEY: {}", key_status);
    Ok(())
}

/// Keep only the last four characters of a secret
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.trim().chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.provider.kind, ProviderKind::OpenAi);
        assert_eq!(config.provider.model, "gpt-3.5-turbo");
        assert_eq!(config.validation.min_chars, 5);
        assert_eq!(config.validation.max_chars, 1000);
        assert_eq!(config.jobs.max_concurrent, 4);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[provider]\nkind = \"simulated\"\nsimulated_delay_ms = 10\n\n[server]\nport = 9100").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.provider.kind, ProviderKind::Simulated);
        assert_eq!(config.provider.simulated_delay_ms, 10);
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.provider.model, "gpt-3.5-turbo");
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Config::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();
        assert!(Config::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_missing_api_key_fails_validation() {
        let config = Config::default();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));

        let mut blank = Config::default();
        blank.provider.api_key = Some("   ".to_string());
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_simulated_provider_needs_no_key() {
        let mut config = Config::default();
        config.provider.kind = ProviderKind::Simulated;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides_win() {
        let mut config = Config::default();
        config.apply(ConfigOverrides {
            api_key: Some("sk-test-1234".to_string()),
            port: Some(9000),
            model: Some("gpt-4o-mini".to_string()),
            ..Default::default()
        });
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.provider.model, "gpt-4o-mini");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut config = Config::default();
        config.provider.kind = ProviderKind::Simulated;
        config.validation.min_chars = 50;
        config.validation.max_chars = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_key_never_serialized() {
        let mut config = Config::default();
        config.provider.api_key = Some("sk-secret".to_string());
        let toml = config.to_toml().unwrap();
        assert!(!toml.contains("sk-secret"));
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("sk-abcdef1234"), "****1234");
        assert_eq!(mask_key("abc"), "****");
    }
}
