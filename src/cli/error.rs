//! CLI-level errors (wraps application errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("{0}")]
    Usage(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl From<InfraError> for CliError {
    fn from(e: InfraError) -> Self {
        CliError::Application(e.into())
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::NotFound(_) => crate::exitcode::NOINPUT,
            CliError::Application(e) => match e {
                ApplicationError::Domain(DomainError::NotFound(_)) => crate::exitcode::NOINPUT,
                ApplicationError::Domain(_) => crate::exitcode::DATAERR,
                ApplicationError::Infra(InfraError::Io { .. }) => crate::exitcode::IOERR,
                ApplicationError::Infra(InfraError::Parse { .. })
                | ApplicationError::Infra(InfraError::UniqueViolation(_)) => {
                    crate::exitcode::DATAERR
                }
                ApplicationError::Infra(_) => crate::exitcode::SOFTWARE,
                ApplicationError::Config { .. } => crate::exitcode::CONFIG,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CodeId;

    #[test]
    fn given_domain_errors_when_mapping_then_uses_sysexits_codes() {
        let not_found = CliError::from(ApplicationError::from(DomainError::NotFound(CodeId(1))));
        let duplicate = CliError::from(ApplicationError::from(DomainError::Duplicate("A".into())));

        assert_eq!(not_found.exit_code(), crate::exitcode::NOINPUT);
        assert_eq!(duplicate.exit_code(), crate::exitcode::DATAERR);
        assert_eq!(
            CliError::Usage("x".into()).exit_code(),
            crate::exitcode::USAGE
        );
    }

    #[test]
    fn given_io_failure_when_mapping_then_ioerr() {
        let err = CliError::from(InfraError::io(
            "write codes.toml",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        ));

        assert_eq!(err.exit_code(), crate::exitcode::IOERR);
    }
}
