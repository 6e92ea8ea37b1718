//! Error taxonomy and exit-code mapping.

use thiserror::Error;

use crate::exitcode;

/// Errors returned by command registration.
///
/// These never abort the process; they are returned synchronously to the
/// registrar and leave the registry unchanged.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// A command was registered without a name.
    #[error("command name must not be empty")]
    InvalidCommand,

    /// The given flag scope instance is already owned by the app or by
    /// another registered command.
    #[error("flag scope for command \"{0}\" is already in use by this app")]
    DuplicateFlagScope(String),
}

/// Errors raised by a flag scope while parsing arguments.
#[derive(Error, Debug)]
pub enum FlagError {
    #[error(transparent)]
    Parse(#[from] clap::Error),
}

/// Run-time failures of a single `run` invocation.
///
/// These are what get written to the error sink before `run` returns the
/// mapped exit code.
#[derive(Error, Debug)]
pub enum RunError {
    /// The registered init hook failed before resolution.
    #[error("{0}")]
    Init(anyhow::Error),

    /// The flag scope rejected the arguments.
    #[error(transparent)]
    Parse(#[from] FlagError),

    /// The resolved executor returned a failure.
    #[error("{0}")]
    Execution(anyhow::Error),
}

impl RunError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Parse(_) => exitcode::USAGE,
            RunError::Init(_) | RunError::Execution(_) => exitcode::SOFTWARE,
        }
    }
}
