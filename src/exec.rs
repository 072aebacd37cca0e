//! Privileged command execution.
//!
//! Every command that needs root (copying into `/usr/local/bin` or
//! `/etc/systemd/system`, `chmod`, `systemctl`) goes through
//! [`PrivilegedExec`], so failure reporting lives in one place.

use std::process::{Command, Output};

use tracing::debug;

use crate::error::{Result, SetupError};

/// Runs commands with elevated privileges.
pub trait PrivilegedExec {
    /// Run `program args...`; a non-zero exit status is an error.
    fn run(&self, program: &str, args: &[&str]) -> Result<()>;

    /// Run `program args...` and report whether it exited successfully.
    ///
    /// Only a failure to launch the command is an error.
    fn probe(&self, program: &str, args: &[&str]) -> Result<bool>;
}

impl<T: PrivilegedExec + ?Sized> PrivilegedExec for &T {
    fn run(&self, program: &str, args: &[&str]) -> Result<()> {
        (**self).run(program, args)
    }

    fn probe(&self, program: &str, args: &[&str]) -> Result<bool> {
        (**self).probe(program, args)
    }
}

/// Executes commands through `sudo`, or directly when `use_sudo` is off.
#[derive(Debug, Clone)]
pub struct SudoExec {
    use_sudo: bool,
}

impl SudoExec {
    pub fn new(use_sudo: bool) -> Self {
        Self { use_sudo }
    }

    fn command(&self, program: &str, args: &[&str]) -> Command {
        if self.use_sudo {
            let mut cmd = Command::new("sudo");
            cmd.arg(program).args(args);
            cmd
        } else {
            let mut cmd = Command::new(program);
            cmd.args(args);
            cmd
        }
    }

    fn output(&self, program: &str, args: &[&str]) -> Result<Output> {
        let line = self.command_line(program, args);
        debug!("exec: {}", line);
        self.command(program, args)
            .output()
            .map_err(|e| SetupError::Command {
                command: line,
                message: e.to_string(),
            })
    }

    /// The command as it would be typed in a shell, for messages.
    pub fn command_line(&self, program: &str, args: &[&str]) -> String {
        let mut parts = Vec::with_capacity(args.len() + 2);
        if self.use_sudo {
            parts.push("sudo");
        }
        parts.push(program);
        parts.extend_from_slice(args);
        parts.join(" ")
    }
}

impl PrivilegedExec for SudoExec {
    fn run(&self, program: &str, args: &[&str]) -> Result<()> {
        let output = self.output(program, args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SetupError::Command {
                command: self.command_line(program, args),
                message: format!("{} {}", output.status, stderr.trim()).trim().to_string(),
            });
        }
        Ok(())
    }

    fn probe(&self, program: &str, args: &[&str]) -> Result<bool> {
        Ok(self.output(program, args)?.status.success())
    }
}
