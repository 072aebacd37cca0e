use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::config::SetupConfig;
use crate::error::Result;
use crate::service::ServiceControl;

/// Snapshot of what a previous run left on the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub binary_path: PathBuf,
    pub binary_installed: bool,
    pub unit_path: PathBuf,
    pub unit_installed: bool,
    pub config_path: PathBuf,
    pub config_written: bool,
    pub service_active: bool,
}

impl StatusReport {
    pub fn collect<S: ServiceControl>(settings: &SetupConfig, service: &S) -> Result<Self> {
        let paths = &settings.paths;
        Ok(Self {
            binary_path: paths.binary.clone(),
            binary_installed: paths.binary.exists(),
            unit_path: paths.unit_file.clone(),
            unit_installed: paths.unit_file.exists(),
            config_path: paths.config_file.clone(),
            config_written: paths.config_file.exists(),
            service_active: service.is_active()?,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "bouheki Status")?;
        writeln!(f, "──────────────")?;
        writeln!(
            f,
            "Binary:  {:<4} {}",
            yes_no(self.binary_installed),
            self.binary_path.display()
        )?;
        writeln!(
            f,
            "Unit:    {:<4} {}",
            yes_no(self.unit_installed),
            self.unit_path.display()
        )?;
        writeln!(
            f,
            "Policy:  {:<4} {}",
            yes_no(self.config_written),
            self.config_path.display()
        )?;
        write!(f, "Active:  {}", yes_no(self.service_active))
    }
}
