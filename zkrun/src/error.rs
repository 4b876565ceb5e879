//! Error types for job supervision

use std::io;
use std::process::ExitStatus;
use thiserror::Error;
use zkrun_leader_election::CoordinationError;
use zkrun_shell::{describe_status, ShellError};

/// Why a run context could not be built
#[derive(Debug, Error)]
pub enum ContextError {
    /// The job name is empty or not a single node name
    #[error("Invalid job name '{name}': must be a non-empty single path segment")]
    InvalidJobName { name: String },

    /// The sync group is empty or not a single node name
    #[error("Invalid sync group '{group}': must be a non-empty single path segment")]
    InvalidSyncGroup { group: String },

    /// The chroot is not an absolute node path
    #[error("Invalid chroot '{chroot}': must be an absolute node path")]
    InvalidChroot { chroot: String },
}

/// Why a supervised run ended in a fault, or gave up leadership early
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The `active` marker node could not be created
    #[error("Failed to create active marker '{path}': {source}")]
    ActiveMarker {
        path: String,
        #[source]
        source: CoordinationError,
    },

    /// The command line could not be parsed or the process not spawned
    #[error("Failed to start command: {0}")]
    Start(#[source] ShellError),

    /// An after-start hook failed; the command was killed
    #[error("After-start hook failed: {0}")]
    StartHook(#[source] ShellError),

    /// Waiting on the supervised process failed
    #[error("Failed to wait for '{command}': {source}")]
    Wait {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The supervised process exited unsuccessfully
    #[error("Command '{command}' {}", describe_status(.status))]
    Exited { command: String, status: ExitStatus },
}
