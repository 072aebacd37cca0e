//! The bouheki policy document.
//!
//! [`PolicyConfig`] mirrors the YAML file bouheki reads at startup:
//!
//! ```yaml
//! network:
//!   mode: block
//!   target: host
//!   cidr:
//!     allow:
//!       - 10.0.0.0/8
//!     deny: []
//!   domain:
//!     allow:
//!       - github.com
//!       - example.com
//!     deny: []
//! files:
//!   enable: false
//! mount:
//!   enable: false
//! log:
//!   format: json
//!   output: /var/log/bouheki.log.json
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

/// How bouheki treats traffic that matches no allow rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Drop the connection.
    Block,
    /// Log the connection and let it through.
    Monitor,
}

/// Which processes the policy applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// Only processes running inside containers.
    Container,
    /// Every process on the host.
    Host,
}

impl FromStr for Mode {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "block" => Ok(Mode::Block),
            "monitor" => Ok(Mode::Monitor),
            other => Err(ValidationError::InvalidMode(other.to_string())),
        }
    }
}

impl FromStr for Target {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "container" => Ok(Target::Container),
            "host" => Ok(Target::Host),
            other => Err(ValidationError::InvalidTarget(other.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Block => "block",
            Mode::Monitor => "monitor",
        })
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Target::Container => "container",
            Target::Host => "host",
        })
    }
}

/// An allow/deny pair of address or name lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowDeny {
    pub allow: Vec<String>,
    pub deny: Vec<String>,
}

/// The `network` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub mode: Mode,
    pub target: Target,
    pub cidr: AllowDeny,
    pub domain: AllowDeny,
}

/// A section that only carries an on/off switch (`files`, `mount`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toggle {
    pub enable: bool,
}

/// The `log` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    pub format: String,
    pub output: String,
}

/// The complete bouheki configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub network: NetworkConfig,
    pub files: Toggle,
    pub mount: Toggle,
    pub log: LogConfig,
}

impl PolicyConfig {
    /// Render the document as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Parse a document previously produced by [`PolicyConfig::to_yaml`].
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }
}
