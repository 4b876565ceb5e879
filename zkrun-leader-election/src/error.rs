//! Error types for coordination and leader election

use thiserror::Error;

/// Errors reported by a coordination service session
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinationError {
    /// The node already exists
    #[error("Node already exists: {path}")]
    NodeExists { path: String },

    /// The node (or its parent, on create) does not exist
    #[error("Node does not exist: {path}")]
    NoNode { path: String },

    /// The node still has children
    #[error("Node has children: {path}")]
    NotEmpty { path: String },

    /// The path is not an absolute slash-delimited node path
    #[error("Invalid node path: '{path}'")]
    InvalidPath { path: String },

    /// The session expired or was closed; its ephemeral nodes are gone
    #[error("Coordination session lost")]
    SessionLost,

    /// The connection to the ensemble dropped mid-request
    #[error("Coordination service connection lost")]
    ConnectionLoss,

    /// Any other failure reported by the backend
    #[error("Coordination service error: {0}")]
    Backend(String),
}

impl CoordinationError {
    /// Whether this error means the node was already there
    pub fn is_node_exists(&self) -> bool {
        matches!(self, CoordinationError::NodeExists { .. })
    }

    /// Whether this error means the node was not there
    pub fn is_no_node(&self) -> bool {
        matches!(self, CoordinationError::NoNode { .. })
    }
}

/// Errors that end an election attempt
#[derive(Debug, Error)]
pub enum ElectionError {
    /// Could not create this attempt's contender node
    #[error("Failed to create contender node under {lock_path}: {source}")]
    ContenderCreation {
        lock_path: String,
        #[source]
        source: CoordinationError,
    },

    /// The created node does not carry a sequence suffix
    #[error("Contender node has no sequence suffix: {path}")]
    MalformedContender { path: String },

    /// Our contender node disappeared while we were waiting
    #[error("Contender node vanished: {path}")]
    ContenderLost { path: String },

    /// The session was lost while contending
    #[error("Coordination session lost during election")]
    SessionLost,

    /// Listing or watching the lock subtree failed
    #[error("Election failed: {0}")]
    Coordination(#[source] CoordinationError),
}

impl From<CoordinationError> for ElectionError {
    fn from(error: CoordinationError) -> Self {
        match error {
            CoordinationError::SessionLost => ElectionError::SessionLost,
            other => ElectionError::Coordination(other),
        }
    }
}

/// Result type for coordination operations
pub type Result<T> = std::result::Result<T, CoordinationError>;
