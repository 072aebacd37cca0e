//! Installer settings.
//!
//! Every fixed path, the agent release to install, and the default policy
//! values live in [`SetupConfig`]. The built-in defaults match a stock
//! GitHub-hosted runner; an optional TOML file overrides any of them.
//!
//! # Example settings file
//!
//! ```toml
//! [paths]
//! binary = "/opt/bouheki/bin/bouheki"
//!
//! [agent]
//! version = "0.0.6"
//!
//! [policy]
//! default_domains = ["github.com", "ghcr.io"]
//!
//! [privileged]
//! use_sudo = false
//! ```

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SetupError};
use crate::policy::builder::{
    PolicyDefaults, DEFAULT_ALLOWED_DOMAINS, DEFAULT_LOG_FORMAT, DEFAULT_LOG_OUTPUT,
};

pub const DEFAULT_BINARY_PATH: &str = "/usr/local/bin/bouheki";
pub const DEFAULT_CONFIG_FILE: &str = "/tmp/bouheki/hardening-github-actions.yaml";
pub const DEFAULT_UNIT_FILE: &str = "/etc/systemd/system/bouheki.service";
pub const DEFAULT_STAGING_DIR: &str = "/tmp/bouheki";
pub const DEFAULT_AGENT_VERSION: &str = "0.0.5";
pub const DEFAULT_DOWNLOAD_URL: &str = "https://github.com/mrtc0/bouheki/releases/download/v{version}/bouheki_{version}_Linux_x86_64.tar.gz";
pub const DEFAULT_BINARY_NAME: &str = "bouheki";
pub const DEFAULT_SERVICE_NAME: &str = "bouheki";

/// Filesystem locations (`[paths]` section).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Where the agent executable is installed.
    pub binary: PathBuf,
    /// Where the generated policy YAML is written.
    pub config_file: PathBuf,
    /// Where the systemd unit is installed.
    pub unit_file: PathBuf,
    /// Unprivileged scratch directory for files later copied with sudo.
    pub staging_dir: PathBuf,
    /// The `log.output` value written into the policy.
    pub log_output: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_BINARY_PATH),
            config_file: PathBuf::from(DEFAULT_CONFIG_FILE),
            unit_file: PathBuf::from(DEFAULT_UNIT_FILE),
            staging_dir: PathBuf::from(DEFAULT_STAGING_DIR),
            log_output: DEFAULT_LOG_OUTPUT.to_string(),
        }
    }
}

/// Agent release settings (`[agent]` section).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AgentConfig {
    pub version: String,
    /// Release archive URL; the installer replaces `{version}` with [`AgentConfig::version`].
    pub download_url: String,
    /// File name of the executable inside the archive.
    pub binary_name: String,
    /// systemd service name, without the `.service` suffix.
    pub service_name: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_AGENT_VERSION.to_string(),
            download_url: DEFAULT_DOWNLOAD_URL.to_string(),
            binary_name: DEFAULT_BINARY_NAME.to_string(),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
        }
    }
}

/// Policy seed values (`[policy]` section).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicySection {
    /// Domains always allowed, placed before any user-supplied domain.
    pub default_domains: Vec<String>,
    pub log_format: String,
}

impl Default for PolicySection {
    fn default() -> Self {
        Self {
            default_domains: DEFAULT_ALLOWED_DOMAINS.iter().map(|d| d.to_string()).collect(),
            log_format: DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

/// Privileged command settings (`[privileged]` section).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PrivilegedConfig {
    /// Prefix privileged commands with `sudo`. Turn off when already root.
    pub use_sudo: bool,
}

impl Default for PrivilegedConfig {
    fn default() -> Self {
        Self { use_sudo: true }
    }
}

/// Top-level installer settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SetupConfig {
    pub paths: PathsConfig,
    pub agent: AgentConfig,
    pub policy: PolicySection,
    pub privileged: PrivilegedConfig,
}

impl SetupConfig {
    /// Load and parse settings from a TOML file at the given path.
    ///
    /// `${VAR}` and `$VAR` placeholders are replaced with environment
    /// variable values before parsing. An unset variable is an error.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML text, substituting environment variables.
    pub fn from_toml(content: &str) -> Result<Self> {
        let content = substitute_env_vars(content)?;
        Ok(toml::from_str(&content)?)
    }

    /// Built-in settings, or the file at `path` when one is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Ok(Self::default()),
        }
    }

    /// The seed values handed to the policy builder.
    pub fn policy_defaults(&self) -> PolicyDefaults {
        PolicyDefaults {
            allowed_domains: self.policy.default_domains.clone(),
            log_format: self.policy.log_format.clone(),
            log_output: self.paths.log_output.clone(),
        }
    }
}

// `${NAME}` (any case) or bare `$NAME` (uppercase only, to avoid false positives)
static ENV_VAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Z_][A-Z0-9_]*)").expect("static pattern")
});

/// Replace `${VAR_NAME}` and `$VAR_NAME` placeholders with environment variable values.
///
/// Substituted values are not scanned again.
fn substitute_env_vars(input: &str) -> Result<String> {
    let var_name = |cap: &regex::Captures<'_>| {
        cap.get(1)
            .or_else(|| cap.get(2))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    };

    for cap in ENV_VAR_RE.captures_iter(input) {
        let name = var_name(&cap);
        if std::env::var(&name).is_err() {
            return Err(SetupError::ConfigEnvVar(name));
        }
    }

    Ok(ENV_VAR_RE
        .replace_all(input, |cap: &regex::Captures<'_>| {
            std::env::var(var_name(cap)).unwrap_or_default()
        })
        .into_owned())
}
