use tracing::debug;

use super::classify::{classify, split_endpoints, Classification};
use super::config::{AllowDeny, LogConfig, Mode, NetworkConfig, PolicyConfig, Target, Toggle};
use crate::error::{Result, SetupError};

/// GitHub infrastructure hosts a runner needs no matter what the user allows.
pub const DEFAULT_ALLOWED_DOMAINS: [&str; 8] = [
    "github.com",
    "api.github.com",
    "codeload.github.com",
    "objects.githubusercontent.com",
    "raw.githubusercontent.com",
    "pipelines.actions.githubusercontent.com",
    "vstoken.actions.githubusercontent.com",
    "results-receiver.actions.githubusercontent.com",
];

pub const DEFAULT_LOG_FORMAT: &str = "json";
pub const DEFAULT_LOG_OUTPUT: &str = "/var/log/bouheki.log.json";

/// Values every generated document starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDefaults {
    /// Always placed first in `network.domain.allow`, in this order.
    pub allowed_domains: Vec<String>,
    pub log_format: String,
    pub log_output: String,
}

impl Default for PolicyDefaults {
    fn default() -> Self {
        Self {
            allowed_domains: DEFAULT_ALLOWED_DOMAINS.iter().map(|d| d.to_string()).collect(),
            log_format: DEFAULT_LOG_FORMAT.to_string(),
            log_output: DEFAULT_LOG_OUTPUT.to_string(),
        }
    }
}

/// Check the raw `mode` and `target` inputs.
///
/// Both values are always checked; if both are wrong, both errors are
/// returned together (mode first).
pub fn validate(mode: &str, target: &str) -> Result<(Mode, Target)> {
    let mode = mode.parse::<Mode>();
    let target = target.parse::<Target>();
    match (mode, target) {
        (Ok(mode), Ok(target)) => Ok((mode, target)),
        (mode, target) => Err(SetupError::Validation(
            [mode.err(), target.err()].into_iter().flatten().collect(),
        )),
    }
}

/// Turns a raw endpoint list into a [`PolicyConfig`].
#[derive(Debug, Clone, Default)]
pub struct PolicyConfigBuilder {
    defaults: PolicyDefaults,
}

impl PolicyConfigBuilder {
    pub fn new(defaults: PolicyDefaults) -> Self {
        Self { defaults }
    }

    /// Build the document for already-validated `mode` and `target`.
    ///
    /// Never fails: empty pieces are skipped and every other piece is either
    /// a CIDR or a domain. Input order and duplicates are preserved.
    pub fn build(&self, raw_endpoints: &str, mode: Mode, target: Target) -> PolicyConfig {
        let mut cidrs = Vec::new();
        let mut domains = self.defaults.allowed_domains.clone();

        for token in split_endpoints(raw_endpoints) {
            match classify(token) {
                Classification::Cidr(net) => {
                    debug!(token, cidr = %net, "classified endpoint as CIDR");
                    cidrs.push(net.to_string());
                }
                Classification::Domain(name) => {
                    debug!(token, "classified endpoint as domain");
                    domains.push(name);
                }
            }
        }

        PolicyConfig {
            network: NetworkConfig {
                mode,
                target,
                cidr: AllowDeny {
                    allow: cidrs,
                    deny: Vec::new(),
                },
                domain: AllowDeny {
                    allow: domains,
                    deny: Vec::new(),
                },
            },
            files: Toggle { enable: false },
            mount: Toggle { enable: false },
            log: LogConfig {
                format: self.defaults.log_format.clone(),
                output: self.defaults.log_output.clone(),
            },
        }
    }

    /// [`validate`] the raw inputs, then [`build`](Self::build).
    pub fn build_from_inputs(
        &self,
        raw_endpoints: &str,
        mode: &str,
        target: &str,
    ) -> Result<PolicyConfig> {
        let (mode, target) = validate(mode, target)?;
        Ok(self.build(raw_endpoints, mode, target))
    }
}
