//! Error types for command execution

use std::io;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors raised while preparing or running a command line
#[derive(Debug, Error)]
pub enum ShellError {
    /// The command line holds no words
    #[error("Empty command line")]
    EmptyCommand,

    /// The command line could not be tokenized
    #[error("Failed to parse command line '{line}': {source}")]
    Parse {
        line: String,
        #[source]
        source: shell_words::ParseError,
    },

    /// No local account has the requested name
    #[error("Unknown user '{user}'")]
    UnknownUser { user: String },

    /// The account database could not be read
    #[error("Failed to look up user '{user}': {source}")]
    UserLookup {
        user: String,
        #[source]
        source: nix::Error,
    },

    /// Switching users requires running as root
    #[error("Running as user '{user}' requires root privileges")]
    NotPrivileged { user: String },

    /// The process could not be started
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The process ran and exited unsuccessfully
    #[error("Command '{command}' {}", describe_status(.status))]
    Failed { command: String, status: ExitStatus },
}

/// Human readable account of how a process ended
pub fn describe_status(status: &ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;

    if let Some(code) = status.code() {
        return format!("exited with code {}", code);
    }
    match status.signal() {
        Some(signal) => match nix::sys::signal::Signal::try_from(signal) {
            Ok(named) => format!("was terminated by {}", named),
            Err(_) => format!("was terminated by signal {}", signal),
        },
        None => "exited with unknown status".to_string(),
    }
}

/// Result type for shell operations
pub type Result<T> = std::result::Result<T, ShellError>;
