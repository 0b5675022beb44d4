//! Command error taxonomy and the process exit codes it maps onto.

use thiserror::Error;

use crate::records::ResourceKind;

/// Process exit codes. Stable contract for scripts wrapping the CLI.
pub mod exit_codes {
    /// Command completed and rendered at least one record (or nothing to do).
    pub const SUCCESS: i32 = 0;
    /// The coordinator answered correctly but no resource matched.
    pub const NO_RESOURCES: i32 = 1;
    /// The verb is not in the command registry.
    pub const UNSUPPORTED_COMMAND: i32 = 3;
    /// Bad arguments, bad filter, or missing coordinator address.
    pub const INVALID_USAGE: i32 = 64;
    /// Transport, server, decode, or any other runtime failure.
    pub const GENERAL_ERROR: i32 = 99;
}

/// Errors raised while validating and executing a single invocation.
///
/// Every variant is terminal: the message prints as one line on stdout and
/// the process exits with [`CommandError::exit_code`].
#[derive(Debug, Error)]
pub enum CommandError {
    /// Arity, filter, or coordinator-address violations caught before any
    /// network traffic.
    #[error("{0}")]
    InvalidUsage(String),

    /// The first positional word is not a registered verb.
    #[error("Unsupported command: {0}")]
    UnsupportedCommand(String),

    /// Well-formed empty reply from the coordinator.
    #[error("No {0} match the provided filters.")]
    NoResources(ResourceKind),

    /// The coordinator could not be reached at all.
    #[error("Unable to contact coordinator: {0}")]
    Transport(String),

    /// The coordinator answered with a non-success status.
    #[error("Coordinator request failed: {reason}")]
    Server { status: u16, reason: String },

    /// The reply arrived but could not be decoded into records.
    #[error("Invalid coordinator response: {0}")]
    Decode(String),

    /// Anything else, e.g. failing to launch the ssh process.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CommandError {
    /// The exit code this error terminates the process with.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidUsage(_) => exit_codes::INVALID_USAGE,
            Self::UnsupportedCommand(_) => exit_codes::UNSUPPORTED_COMMAND,
            Self::NoResources(_) => exit_codes::NO_RESOURCES,
            Self::Transport(_) | Self::Server { .. } | Self::Decode(_) | Self::Other(_) => {
                exit_codes::GENERAL_ERROR
            }
        }
    }
}
