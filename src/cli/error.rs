//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::exitcode;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => exitcode::IOERR,
                InfraError::Application(app) => match app {
                    ApplicationError::UnknownParameter(_) => exitcode::USAGE,
                    ApplicationError::Config { .. } => exitcode::CONFIG,
                    ApplicationError::Dataset { .. } | ApplicationError::Domain(_) => {
                        exitcode::DATAERR
                    }
                    ApplicationError::OperationFailed { .. } => exitcode::IOERR,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn given_unknown_parameter_when_mapping_then_usage_exit_code() {
        let err: CliError = ApplicationError::UnknownParameter("p9".into()).into();
        assert_eq!(err.exit_code(), exitcode::USAGE);
    }

    #[test]
    fn given_bad_dataset_when_mapping_then_data_error_exit_code() {
        let err: CliError = ApplicationError::Dataset {
            path: PathBuf::from("x.json"),
            message: "expected value".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exitcode::DATAERR);
        assert!(err.to_string().contains("x.json"));
    }

    #[test]
    fn given_io_failure_when_mapping_then_io_exit_code() {
        let err = CliError::Infra(InfraError::io(
            "read stdin",
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"),
        ));
        assert_eq!(err.exit_code(), exitcode::IOERR);
    }
}
