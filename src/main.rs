use std::process::ExitCode;

use bouheki_setup::cli::report::report_failure;
use bouheki_setup::cli::status::StatusReport;
use bouheki_setup::cli::{Cli, Commands};
use bouheki_setup::config::SetupConfig;
use bouheki_setup::exec::SudoExec;
use bouheki_setup::install::ReleaseInstaller;
use bouheki_setup::output::LocalFileWriter;
use bouheki_setup::runner::{ensure_supported_platform, RunOutcome, Runner};
use bouheki_setup::service::SystemdService;
use clap::Parser;
use tracing_subscriber::EnvFilter;

type HostRunner<'a> =
    Runner<ReleaseInstaller<&'a SudoExec>, SystemdService<&'a SudoExec>, LocalFileWriter>;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match dispatch(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_failure(&e);
            ExitCode::FAILURE
        }
    }
}

fn systemd_service<'a>(settings: &SetupConfig, exec: &'a SudoExec) -> SystemdService<&'a SudoExec> {
    SystemdService::new(
        exec,
        settings.agent.service_name.clone(),
        settings.paths.unit_file.clone(),
        settings.paths.staging_dir.clone(),
    )
}

async fn dispatch(cli: &Cli) -> anyhow::Result<()> {
    if cli.selected_command().requires_linux() {
        ensure_supported_platform(std::env::consts::OS)?;
    }

    let settings = SetupConfig::load(cli.config.as_deref())?;
    let exec = SudoExec::new(settings.privileged.use_sudo);

    let installer = ReleaseInstaller::new(
        &exec,
        settings.agent.download_url.clone(),
        settings.agent.binary_name.clone(),
    )?;
    let service = systemd_service(&settings, &exec);
    let runner = Runner::new(settings.clone(), installer, service, LocalFileWriter);

    match cli.selected_command() {
        Commands::Run => cmd_run(&runner, cli).await?,
        Commands::Stop => {
            runner.stop()?;
            println!("Stopped {}", settings.agent.service_name);
        }
        Commands::Render => {
            let config = runner.render(&cli.inputs())?;
            print!("{}", config.to_yaml()?);
        }
        Commands::Status { json } => {
            let report = StatusReport::collect(&settings, &systemd_service(&settings, &exec))?;
            if json {
                println!("{}", report.to_json()?);
            } else {
                println!("{}", report);
            }
        }
    }

    Ok(())
}

async fn cmd_run(runner: &HostRunner<'_>, cli: &Cli) -> anyhow::Result<()> {
    match runner.run(&cli.inputs()).await? {
        RunOutcome::Stopped => {
            println!("Stopped {}", runner.settings().agent.service_name);
        }
        RunOutcome::Started { config } => {
            let paths = &runner.settings().paths;
            println!("bouheki is running");
            println!("  Policy:  {}", paths.config_file.display());
            println!("  Binary:  {}", paths.binary.display());
            println!("  Mode:    {} ({})", config.network.mode, config.network.target);
            println!(
                "  Allowed: {} CIDRs, {} domains",
                config.network.cidr.allow.len(),
                config.network.domain.allow.len()
            );
        }
    }
    Ok(())
}
