//! Configuration module for doddns
//!
//! This module handles loading and validating the JSON configuration file and
//! its environment variable overrides.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context as _, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::warn;
use zeroize::Zeroizing;

use crate::constants::{
    DEFAULT_CONFIG_FILE, DEFAULT_IPV4_URL, DEFAULT_IPV6_URL, DEFAULT_TIMEOUT_SECS,
    DIGITALOCEAN_API_BASE, ENV_TIMEOUT, ENV_VERBOSE, MAX_TIMEOUT_SECS, MIN_TIMEOUT_SECS,
};
use crate::validation::{normalize_record_type, validate_domain_name, validate_record_name};

//==============================================================================
// Config
//==============================================================================

/// Configuration for a reconciliation run
///
/// # Configuration Loading Priority
///
/// 1. Environment variables (highest priority, `timeout` and `verbose` only)
/// 2. Config file (`config.json` next to the executable or a custom path)
/// 3. Defaults (lowest priority)
#[derive(Debug, Clone)]
pub struct Config {
    /// Domains in file order
    pub domains: IndexMap<String, DomainConfig>,
    /// HTTP request timeout
    ///
    /// Default: 30 seconds
    pub timeout: Duration,
    /// Enable verbose logging
    pub verbose: bool,
    /// Provider API base, always ending with `/`
    pub api_base: String,
    /// IPv4 reflection endpoint
    pub ipv4_url: String,
    /// IPv6 reflection endpoint
    pub ipv6_url: String,
}

/// Credential and desired records of one domain
#[derive(Clone)]
pub struct DomainConfig {
    api_key: Option<Zeroizing<String>>,
    /// Desired records in file order
    pub records: Vec<RecordConfig>,
}

impl DomainConfig {
    pub fn new(api_key: Option<&str>, records: Vec<RecordConfig>) -> Self {
        Self {
            api_key: api_key.map(|k| Zeroizing::new(k.to_string())),
            records,
        }
    }

    /// API key, or `None` when it is missing or blank
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
    }
}

impl fmt::Debug for DomainConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainConfig")
            .field("api_key", &self.api_key().map(|_| "***REDACTED***"))
            .field("records", &self.records)
            .finish()
    }
}

/// A desired record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordConfig {
    /// Upper-cased record type
    pub record_type: String,
    /// Host name relative to the domain
    pub name: String,
    /// Where the desired value comes from
    pub source: ValueSource,
}

/// Source of a record's desired value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Literal configured value; `None` means the record should not exist
    Literal(Option<String>),
    /// The current public IPv4 address
    CurrentIpv4,
    /// The current public IPv6 address, if the host has one
    CurrentIpv6,
}

impl ValueSource {
    /// Effective desired value; `None` or empty means "absent"
    pub fn resolve<'a>(&'a self, ipv4: &'a str, ipv6: Option<&'a str>) -> Option<&'a str> {
        let value = match self {
            ValueSource::Literal(data) => data.as_deref(),
            ValueSource::CurrentIpv4 => Some(ipv4),
            ValueSource::CurrentIpv6 => ipv6,
        };
        value.filter(|v| !v.is_empty())
    }
}

impl Config {
    /// Loads configuration from `config_path` or the default location
    ///
    /// A missing or malformed file is an error. Missing API keys are not:
    /// such domains are skipped at reconciliation time.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let path = match config_path {
            Some(path) => path,
            None => default_config_path()?,
        };
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let mut config = Self::from_json_str(&content)
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        Self::override_with_env(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a configuration document without consulting the environment
    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: JsonConfig =
            serde_json::from_str(content).context("Failed to parse config file")?;

        let mut domains = IndexMap::with_capacity(raw.domains.len());
        for (domain, raw_domain) in raw.domains {
            validate_domain_name(&domain)?;
            let mut records = Vec::with_capacity(raw_domain.records.len());
            for (index, raw_record) in raw_domain.records.into_iter().enumerate() {
                let record = raw_record
                    .into_record_config()
                    .with_context(|| format!("{}: record #{}", domain, index + 1))?;
                records.push(record);
            }
            domains.insert(
                domain,
                DomainConfig::new(raw_domain.api_key.as_deref(), records),
            );
        }

        let mut api_base = raw
            .api_base
            .unwrap_or_else(|| DIGITALOCEAN_API_BASE.to_string());
        if !api_base.ends_with('/') {
            api_base.push('/');
        }

        let config = Self {
            domains,
            timeout: Duration::from_secs(raw.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            verbose: raw.verbose.unwrap_or(false),
            api_base,
            ipv4_url: raw.ipv4_url.unwrap_or_else(|| DEFAULT_IPV4_URL.to_string()),
            ipv6_url: raw.ipv6_url.unwrap_or_else(|| DEFAULT_IPV6_URL.to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    fn override_with_env(config: &mut Self) -> Result<()> {
        if let Ok(v) = env::var(ENV_TIMEOUT) {
            if !v.is_empty() {
                let secs: u64 = v
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid {} value", ENV_TIMEOUT))?;
                config.timeout = Duration::from_secs(secs);
            }
        }
        if let Ok(v) = env::var(ENV_VERBOSE) {
            if !v.is_empty() {
                config.verbose =
                    parse_bool_env(&v).with_context(|| format!("Invalid {} value", ENV_VERBOSE))?;
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let timeout_secs = self.timeout.as_secs();
        if !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&timeout_secs) {
            bail!(
                "timeout must be between {} and {} seconds, got {}",
                MIN_TIMEOUT_SECS,
                MAX_TIMEOUT_SECS,
                timeout_secs
            );
        }

        for (field, url) in [
            ("apiBase", &self.api_base),
            ("ipv4Url", &self.ipv4_url),
            ("ipv6Url", &self.ipv6_url),
        ] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                bail!("{} must be an http(s) URL, got: {}", field, url);
            }
        }

        Ok(())
    }
}

/// `config.json` in the directory holding the running executable
pub fn default_config_path() -> Result<PathBuf> {
    let exe = env::current_exe().context("Cannot locate the running executable")?;
    let dir = exe.parent().unwrap_or_else(|| Path::new("."));
    Ok(dir.join(DEFAULT_CONFIG_FILE))
}

/// Parses a boolean value from an environment variable
///
/// - `true`: "1", "true", "yes", "on"
/// - `false`: "0", "false", "no", "off"
fn parse_bool_env(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow::anyhow!(
            "expected boolean (true/false/1/0/yes/no/on/off)"
        )),
    }
}

//==============================================================================
// File format
//==============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonConfig {
    #[serde(default)]
    domains: IndexMap<String, JsonDomain>,
    timeout: Option<u64>,
    verbose: Option<bool>,
    api_base: Option<String>,
    ipv4_url: Option<String>,
    ipv6_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonDomain {
    api_key: Option<String>,
    #[serde(default)]
    records: Vec<JsonRecord>,
}

impl fmt::Debug for JsonDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonDomain")
            .field("records", &self.records)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonRecord {
    #[serde(rename = "type")]
    record_type: String,
    name: String,
    data: Option<String>,
    #[serde(default)]
    current_ip4: bool,
    #[serde(default)]
    current_ip6: bool,
}

impl JsonRecord {
    fn into_record_config(self) -> Result<RecordConfig> {
        let record_type = normalize_record_type(&self.record_type)?;
        validate_record_name(&self.name)?;
        // Stored the way the provider reports names: relative, lowercase
        let trimmed = self.name.trim();
        let name = trimmed
            .strip_suffix('.')
            .unwrap_or(trimmed)
            .to_ascii_lowercase();

        if self.current_ip4 || self.current_ip6 {
            if let Some(data) = &self.data {
                warn!(
                    "{} {}: data {:?} is ignored because a current IP flag is set",
                    record_type, name, data
                );
            }
        }

        let source = match (self.current_ip4, self.current_ip6) {
            (true, true) => bail!(
                "{} {}: currentIp4 and currentIp6 are mutually exclusive",
                record_type,
                name
            ),
            (true, false) => ValueSource::CurrentIpv4,
            (false, true) => ValueSource::CurrentIpv6,
            (false, false) => ValueSource::Literal(self.data),
        };

        Ok(RecordConfig {
            record_type,
            name,
            source,
        })
    }
}

//==============================================================================
// Tests
//==============================================================================
