use thiserror::Error;

/// A rejected `mode` or `target` input value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("mode must be either 'block' or 'monitor' (got '{0}')")]
    InvalidMode(String),

    #[error("target must be either 'container' or 'host' (got '{0}')")]
    InvalidTarget(String),
}

/// Unified error type for bouheki-setup.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("{}", join_validation(.0))]
    Validation(Vec<ValidationError>),

    #[error("This action only runs on Linux (detected platform: {0})")]
    UnsupportedPlatform(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Environment variable not set: {0}")]
    ConfigEnvVar(String),

    #[error("Download error: {0}")]
    Download(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Command `{command}` failed: {message}")]
    Command { command: String, message: String },
}

impl SetupError {
    /// True for failures raised by a collaborator (filesystem, network,
    /// privileged commands) rather than by user input or the host platform.
    pub fn is_operational(&self) -> bool {
        !matches!(
            self,
            SetupError::Validation(_) | SetupError::UnsupportedPlatform(_)
        )
    }
}

impl From<reqwest::Error> for SetupError {
    fn from(e: reqwest::Error) -> Self {
        SetupError::Download(e.to_string())
    }
}

fn join_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, SetupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SetupError = io_err.into();
        assert!(matches!(err, SetupError::Io(_)));
        assert!(err.to_string().contains("IO error"));
        assert!(err.is_operational());
    }

    #[test]
    fn validation_errors_are_joined() {
        let err = SetupError::Validation(vec![
            ValidationError::InvalidMode("allow".to_string()),
            ValidationError::InvalidTarget("vm".to_string()),
        ]);
        assert_eq!(
            err.to_string(),
            "mode must be either 'block' or 'monitor' (got 'allow'); \
             target must be either 'container' or 'host' (got 'vm')"
        );
        assert!(!err.is_operational());
    }

    #[test]
    fn command_error_displays_command() {
        let err = SetupError::Command {
            command: "sudo systemctl start bouheki".to_string(),
            message: "exit status 1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Command `sudo systemctl start bouheki` failed: exit status 1"
        );
    }

    #[test]
    fn platform_error_is_not_operational() {
        let err = SetupError::UnsupportedPlatform("macos".to_string());
        assert!(err.to_string().starts_with("This action only runs on Linux"));
        assert!(!err.is_operational());
    }

    #[test]
    fn config_parse_error_converts() {
        let toml_err = toml::from_str::<toml::Value>("[invalid").unwrap_err();
        let err: SetupError = toml_err.into();
        assert!(matches!(err, SetupError::ConfigParse(_)));
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SetupError>();
    }
}
