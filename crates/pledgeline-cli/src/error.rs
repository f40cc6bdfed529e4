use anyhow::Error;
use pledgeline_config::ConfigError;
use pledgeline_core::time::TimeParseError;
use pledgeline_core::CoreError;
use pledgeline_import::ImportError;
use pledgeline_store::error::{StoreError, StoreErrorKind};
use std::process::ExitCode;
use thiserror::Error as ThisError;

pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_NOT_FOUND: u8 = 2;
pub const EXIT_INVALID_INPUT: u8 = 3;

#[derive(Debug, ThisError)]
pub enum CliError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),
}

pub fn invalid_input(message: impl Into<String>) -> Error {
    CliError::InvalidInput(message.into()).into()
}

pub fn not_found(message: impl Into<String>) -> Error {
    CliError::NotFound(message.into()).into()
}

pub fn report_error(err: &Error, verbose: bool) {
    if verbose {
        eprintln!("error: {:#}", err);
    } else {
        eprintln!("error: {}", err);
    }
}

pub fn exit_code_for(err: &Error) -> ExitCode {
    ExitCode::from(exit_status_for(err))
}

fn exit_status_for(err: &Error) -> u8 {
    for cause in err.chain() {
        if let Some(cli_err) = cause.downcast_ref::<CliError>() {
            return match cli_err {
                CliError::InvalidInput(_) => EXIT_INVALID_INPUT,
                CliError::NotFound(_) => EXIT_NOT_FOUND,
            };
        }
        if let Some(store_err) = cause.downcast_ref::<StoreError>() {
            return store_exit_code(store_err);
        }
        if let Some(config_err) = cause.downcast_ref::<ConfigError>() {
            return config_exit_code(config_err);
        }
        if let Some(import_err) = cause.downcast_ref::<ImportError>() {
            return import_exit_code(import_err);
        }
        if cause.downcast_ref::<CoreError>().is_some()
            || cause.downcast_ref::<TimeParseError>().is_some()
        {
            return EXIT_INVALID_INPUT;
        }
    }
    EXIT_FAILURE
}

fn store_exit_code(err: &StoreError) -> u8 {
    match err.kind() {
        StoreErrorKind::NotFound => EXIT_NOT_FOUND,
        StoreErrorKind::InvalidId
        | StoreErrorKind::InvalidBackupPath
        | StoreErrorKind::InvalidDataPath
        | StoreErrorKind::DuplicateDisposition
        | StoreErrorKind::DefaultDispositionLocked
        | StoreErrorKind::Core => EXIT_INVALID_INPUT,
        StoreErrorKind::MissingHomeDir
        | StoreErrorKind::MissingDefaultDisposition
        | StoreErrorKind::InvalidStatus
        | StoreErrorKind::Migration
        | StoreErrorKind::Sql
        | StoreErrorKind::Io => EXIT_FAILURE,
    }
}

fn config_exit_code(err: &ConfigError) -> u8 {
    match err {
        ConfigError::MissingHomeDir => EXIT_FAILURE,
        ConfigError::InvalidConfigPath(_)
        | ConfigError::MissingConfigFile(_)
        | ConfigError::EmptyValue { .. }
        | ConfigError::Read { .. }
        | ConfigError::Parse { .. } => EXIT_INVALID_INPUT,
    }
}

fn import_exit_code(err: &ImportError) -> u8 {
    match err {
        ImportError::Io(_) => EXIT_FAILURE,
        ImportError::Csv(_)
        | ImportError::Core(_)
        | ImportError::Time(_)
        | ImportError::MissingColumn(_)
        | ImportError::Parse(_) => EXIT_INVALID_INPUT,
    }
}

#[cfg(test)]
mod tests {
    use super::{exit_status_for, invalid_input, not_found};
    use anyhow::Context as _;
    use pledgeline_store::error::StoreError;

    #[test]
    fn exit_codes_follow_the_error_chain() {
        assert_eq!(exit_status_for(&invalid_input("bad")), 3);
        assert_eq!(exit_status_for(&not_found("gone")), 2);

        let wrapped = Err::<(), _>(StoreError::NotFound("customer".to_string()))
            .with_context(|| "show customer")
            .unwrap_err();
        assert_eq!(exit_status_for(&wrapped), 2);

        let locked = anyhow::Error::from(StoreError::DefaultDispositionLocked);
        assert_eq!(exit_status_for(&locked), 3);
        assert_eq!(exit_status_for(&anyhow::anyhow!("boom")), 1);
    }
}
