//! Client configuration and optional file-based defaults.
//!
//! [`ClientConfig`] holds everything the client needs before it talks to the
//! site. Defaults reproduce the stock behavior; a `config.toml` under the
//! user's config directory can override them:
//!
//! ```text
//! # ~/.config/tacobell/config.toml
//! base_url = "https://www.tacobell.com/"
//! store_id = 4321
//! retry_max_attempts = 3
//! retry_delay_ms = 2000
//! ```

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::cart::RetryPolicy;

/// Default site base URL.
pub const DEFAULT_BASE_URL: &str = "https://www.tacobell.com/";

/// Default HTTP connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default HTTP request timeout in seconds.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

/// Runtime configuration for [`TacoBellClient`](crate::TacoBellClient).
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Site root; endpoint paths are joined onto it.
    pub base_url: String,
    /// TCP/TLS connect timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout.
    pub read_timeout: Duration,
    /// User-Agent override (defaults to a desktop Firefox string).
    pub user_agent: Option<String>,
    /// Store used to scope customization lookups during customized adds.
    pub store_id: Option<u32>,
    /// Retry policy for plain add-to-cart requests rejected with 403.
    pub retry_policy: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
            user_agent: None,
            store_id: None,
            retry_policy: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Replaces the base URL (used by tests to point at a mock server).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Replaces both HTTP timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, connect_timeout: Duration, read_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.read_timeout = read_timeout;
        self
    }

    /// Sets a User-Agent override.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets the store used for customization lookups.
    #[must_use]
    pub fn with_store_id(mut self, store_id: u32) -> Self {
        self.store_id = Some(store_id);
        self
    }

    /// Replaces the add-to-cart retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Builds a config from defaults plus the user's config file, if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error when the config file exists but cannot be read or parsed.
    pub fn from_default_file() -> Result<Self> {
        let loaded = load_default_file_config()?;
        Ok(match loaded.config {
            Some(file_config) => file_config.apply(Self::default()),
            None => Self::default(),
        })
    }
}

/// Values read from a config file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Site base URL.
    pub base_url: Option<String>,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Request timeout in seconds.
    pub read_timeout_secs: Option<u64>,
    /// User-Agent override.
    pub user_agent: Option<String>,
    /// Default store for customization lookups.
    pub store_id: Option<u32>,
    /// Attempts for plain add-to-cart (1 disables retry).
    pub retry_max_attempts: Option<u32>,
    /// Delay before the first retry in milliseconds.
    pub retry_delay_ms: Option<u64>,
}

impl FileConfig {
    /// Validates config values against runtime constraints.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first out-of-range field.
    pub fn validate(&self) -> Result<()> {
        if let Some(base_url) = &self.base_url {
            let parsed = url::Url::parse(base_url)
                .with_context(|| format!("Invalid config value for `base_url`: '{base_url}'"))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                bail!("Invalid config value for `base_url`: expected an http(s) URL");
            }
        }
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        if let Some(attempts) = self.retry_max_attempts
            && !(1..=10).contains(&attempts)
        {
            bail!("Invalid config value for `retry_max_attempts`: {attempts}. Expected range: 1..=10");
        }
        if let Some(delay) = self.retry_delay_ms
            && delay > 60_000
        {
            bail!("Invalid config value for `retry_delay_ms`: {delay}. Expected range: 0..=60000");
        }
        Ok(())
    }

    /// Overlays the set fields onto `base`.
    #[must_use]
    pub fn apply(&self, mut base: ClientConfig) -> ClientConfig {
        if let Some(base_url) = &self.base_url {
            base.base_url.clone_from(base_url);
        }
        if let Some(secs) = self.connect_timeout_secs {
            base.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.read_timeout_secs {
            base.read_timeout = Duration::from_secs(secs);
        }
        if let Some(user_agent) = &self.user_agent {
            base.user_agent = Some(user_agent.clone());
        }
        if let Some(store_id) = self.store_id {
            base.store_id = Some(store_id);
        }
        if let Some(attempts) = self.retry_max_attempts {
            base.retry_policy = base.retry_policy.with_attempt_limit(attempts);
        }
        if let Some(delay_ms) = self.retry_delay_ms {
            base.retry_policy = base
                .retry_policy
                .with_base_delay(Duration::from_millis(delay_ms));
        }
        base
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/tacobell/config.toml`
/// 2. `$HOME/.config/tacobell/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    config_path_from(
        env_var_non_empty_os("XDG_CONFIG_HOME"),
        env_var_non_empty_os("HOME"),
    )
}

fn config_path_from(xdg_config_home: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    if let Some(xdg_config_home) = xdg_config_home {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("tacobell")
                .join("config.toml"),
        );
    }
    let home = home?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("tacobell")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from the default path if present.
///
/// # Errors
///
/// Returns an error when the file exists but cannot be read or parsed.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let Some(path_ref) = path.as_deref().filter(|p| p.exists()) else {
        debug!(path = ?path, "no config file found, using defaults");
        return Ok(LoadedConfig { path, config: None });
    };

    let config = load_file_config(path_ref)?;
    debug!(path = %path_ref.display(), "loaded config file");
    Ok(LoadedConfig {
        path,
        config: Some(config),
    })
}

/// Reads and parses a config file.
///
/// # Errors
///
/// Returns an error when the file cannot be read or contains invalid lines.
pub fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_number = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_number}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let invalid = || format!("Invalid `{key}` value on line {line_number}");

        match key {
            "base_url" => cfg.base_url = Some(parse_string_literal(value).with_context(invalid)?),
            "user_agent" => {
                cfg.user_agent = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "read_timeout_secs" => {
                cfg.read_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "retry_delay_ms" => {
                cfg.retry_delay_ms = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "store_id" => cfg.store_id = Some(parse_integer_u32(value).with_context(invalid)?),
            "retry_max_attempts" => {
                cfg.retry_max_attempts = Some(parse_integer_u32(value).with_context(invalid)?);
            }
            unknown => bail!("Unknown configuration key: '{unknown}' on line {line_number}"),
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    let Some(inner) = raw_value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        bail!("Expected double-quoted string");
    };
    Ok(inner.to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_integer_u32(raw_value: &str) -> Result<u32> {
    let value = parse_integer_u64(raw_value)?;
    u32::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u32"))
}
