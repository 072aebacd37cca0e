pub mod report;
pub mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::runner::{ActionInputs, ServiceAction};

/// Inputs can be passed as flags or through the `INPUT_*` variables GitHub
/// Actions sets for an action's `with:` block.
#[derive(Parser, Debug)]
#[command(name = "bouheki-setup")]
#[command(about = "Install bouheki as a systemd service and generate its network policy")]
#[command(version)]
pub struct Cli {
    /// Path to a settings file overriding built-in paths and versions
    #[arg(short, long, env = "BOUHEKI_SETUP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Comma-separated IPs, CIDRs and domains to allow
    #[arg(long, env = "INPUT_ALLOWED-ENDPOINTS", global = true)]
    pub allowed_endpoints: Option<String>,

    /// Enforcement mode: block or monitor
    #[arg(long, env = "INPUT_MODE", default_value = "block", global = true)]
    pub mode: String,

    /// Enforcement target: container or host
    #[arg(long, env = "INPUT_TARGET", default_value = "host", global = true)]
    pub target: String,

    /// Set to "stop" to stop the running agent and exit
    #[arg(long, env = "INPUT_SERVICE_ACTION", global = true)]
    pub service_action: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Write the policy, install bouheki and start it (default)
    Run,
    /// Stop the bouheki service
    Stop,
    /// Print the generated policy without installing anything
    Render,
    /// Show installation and service state
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Whether the command touches the host and so only runs on Linux.
    pub fn requires_linux(self) -> bool {
        matches!(self, Commands::Run | Commands::Stop)
    }
}

impl Cli {
    /// The subcommand to execute; `run` when none was given.
    pub fn selected_command(&self) -> Commands {
        self.command.unwrap_or(Commands::Run)
    }

    /// The action inputs, trimmed but unvalidated.
    pub fn inputs(&self) -> ActionInputs {
        ActionInputs {
            allowed_endpoints: self.allowed_endpoints.clone().unwrap_or_default(),
            mode: self.mode.trim().to_string(),
            target: self.target.trim().to_string(),
            service_action: self
                .service_action
                .as_deref()
                .map(ServiceAction::from_input)
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{validate, Mode, Target};

    #[test]
    fn defaults_to_run_with_block_host() {
        let cli = Cli::try_parse_from(["bouheki-setup"]).unwrap();
        assert_eq!(cli.selected_command(), Commands::Run);
        let inputs = cli.inputs();
        assert_eq!(inputs.mode, "block");
        assert_eq!(inputs.target, "host");
        assert_eq!(inputs.allowed_endpoints, "");
        assert_eq!(inputs.service_action, ServiceAction::Start);
    }

    #[test]
    fn flags_populate_inputs() {
        let cli = Cli::try_parse_from([
            "bouheki-setup",
            "--allowed-endpoints",
            "10.0.0.0/8,example.com",
            "--mode",
            "monitor",
            "--target",
            "container",
            "render",
        ])
        .unwrap();
        assert_eq!(cli.selected_command(), Commands::Render);
        let inputs = cli.inputs();
        assert_eq!(inputs.allowed_endpoints, "10.0.0.0/8,example.com");
        assert_eq!(inputs.mode, "monitor");
        assert_eq!(inputs.target, "container");
    }

    #[test]
    fn unknown_mode_is_left_for_validation() {
        let cli = Cli::try_parse_from(["bouheki-setup", "--mode", "allow"]).unwrap();
        assert_eq!(cli.inputs().mode, "allow");
    }

    #[test]
    fn service_action_stop_is_recognized() {
        let cli = Cli::try_parse_from(["bouheki-setup", "--service-action", "stop"]).unwrap();
        assert_eq!(cli.inputs().service_action, ServiceAction::Stop);
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let cli = Cli::try_parse_from([
            "bouheki-setup",
            "--mode",
            "block\n",
            "--target",
            " host",
            "--service-action",
            " stop\n",
        ])
        .unwrap();
        let inputs = cli.inputs();
        assert_eq!(inputs.mode, "block");
        assert_eq!(inputs.target, "host");
        assert_eq!(inputs.service_action, ServiceAction::Stop);
        assert_eq!(
            validate(&inputs.mode, &inputs.target).unwrap(),
            (Mode::Block, Target::Host)
        );
    }

    #[test]
    fn only_host_commands_require_linux() {
        assert!(Commands::Run.requires_linux());
        assert!(Commands::Stop.requires_linux());
        assert!(!Commands::Render.requires_linux());
        assert!(!Commands::Status { json: false }.requires_linux());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["bouheki-setup", "status", "--json", "-c", "x.toml"]).unwrap();
        assert_eq!(cli.selected_command(), Commands::Status { json: true });
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
