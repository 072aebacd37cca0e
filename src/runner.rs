//! One installer run: platform check, optional stop, policy synthesis,
//! config write, binary install, unit install, service start.

use tracing::info;

use crate::config::SetupConfig;
use crate::error::{Result, SetupError};
use crate::install::BinaryProvider;
use crate::output::FileWriter;
use crate::policy::{PolicyConfig, PolicyConfigBuilder};
use crate::service::{ServiceControl, UnitSpec};

/// What the caller asked the service to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceAction {
    /// Configure, install and start the agent.
    #[default]
    Start,
    /// Stop the running agent and do nothing else.
    Stop,
}

impl ServiceAction {
    /// `"stop"` selects [`ServiceAction::Stop`]; anything else, including
    /// an empty value, means a normal run.
    pub fn from_input(value: &str) -> Self {
        if value.trim() == "stop" {
            ServiceAction::Stop
        } else {
            ServiceAction::Start
        }
    }
}

/// Raw values supplied by the invoking environment.
#[derive(Debug, Clone, Default)]
pub struct ActionInputs {
    pub allowed_endpoints: String,
    pub mode: String,
    pub target: String,
    pub service_action: ServiceAction,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Stopped,
    Started { config: PolicyConfig },
}

/// Fail unless running on Linux.
pub fn ensure_supported_platform(os: &str) -> Result<()> {
    if os == "linux" {
        Ok(())
    } else {
        Err(SetupError::UnsupportedPlatform(os.to_string()))
    }
}

/// Drives a run against its collaborators.
pub struct Runner<B, S, W> {
    settings: SetupConfig,
    builder: PolicyConfigBuilder,
    binaries: B,
    service: S,
    writer: W,
    platform: String,
}

impl<B, S, W> Runner<B, S, W>
where
    B: BinaryProvider,
    S: ServiceControl,
    W: FileWriter,
{
    pub fn new(settings: SetupConfig, binaries: B, service: S, writer: W) -> Self {
        let builder = PolicyConfigBuilder::new(settings.policy_defaults());
        Self {
            settings,
            builder,
            binaries,
            service,
            writer,
            platform: std::env::consts::OS.to_string(),
        }
    }

    /// Pretend to run on `os` instead of the host platform.
    pub fn with_platform(mut self, os: impl Into<String>) -> Self {
        self.platform = os.into();
        self
    }

    pub fn settings(&self) -> &SetupConfig {
        &self.settings
    }

    /// Validate the inputs and build the policy without side effects.
    pub fn render(&self, inputs: &ActionInputs) -> Result<PolicyConfig> {
        self.builder
            .build_from_inputs(&inputs.allowed_endpoints, &inputs.mode, &inputs.target)
    }

    pub async fn run(&self, inputs: &ActionInputs) -> Result<RunOutcome> {
        ensure_supported_platform(&self.platform)?;

        if inputs.service_action == ServiceAction::Stop {
            self.service.stop()?;
            return Ok(RunOutcome::Stopped);
        }

        let config = self.render(inputs)?;
        info!(
            mode = %config.network.mode,
            target = %config.network.target,
            cidrs = config.network.cidr.allow.len(),
            domains = config.network.domain.allow.len(),
            "Built bouheki policy"
        );

        let paths = &self.settings.paths;
        self.writer
            .write_file(&paths.config_file, config.to_yaml()?.as_bytes())?;
        info!("Wrote {}", paths.config_file.display());

        let binary = self
            .binaries
            .ensure_binary_installed(&self.settings.agent.version, &paths.binary)
            .await?;

        let unit = UnitSpec::new(&self.settings.agent.service_name, &binary, &paths.config_file);
        self.service.install_service(&unit)?;
        self.service.start()?;

        Ok(RunOutcome::Started { config })
    }

    /// Stop the service regardless of inputs.
    pub fn stop(&self) -> Result<()> {
        ensure_supported_platform(&self.platform)?;
        self.service.stop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_exact_stop_selects_stop() {
        assert_eq!(ServiceAction::from_input("stop"), ServiceAction::Stop);
        assert_eq!(ServiceAction::from_input(" stop\n"), ServiceAction::Stop);
        assert_eq!(ServiceAction::from_input(""), ServiceAction::Start);
        assert_eq!(ServiceAction::from_input("start"), ServiceAction::Start);
        assert_eq!(ServiceAction::from_input("STOP"), ServiceAction::Start);
    }

    #[test]
    fn only_linux_is_supported() {
        assert!(ensure_supported_platform("linux").is_ok());
        for os in ["macos", "windows", "freebsd"] {
            assert!(matches!(
                ensure_supported_platform(os),
                Err(SetupError::UnsupportedPlatform(_))
            ));
        }
    }
}
