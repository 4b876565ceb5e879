//! The narrow slice of a coordination service the election depends on

use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::oneshot;

/// How a node is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeMode {
    /// Survives the creating session
    Persistent,
    /// Removed when the creating session ends
    Ephemeral,
    /// Ephemeral, with a monotonically increasing sequence suffix appended
    /// to the requested path by the service
    EphemeralSequential,
}

/// What a one-shot node watch observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEvent {
    /// The watched node was deleted
    NodeDeleted,
    /// Something else about the node changed
    NodeChanged,
    /// The session ended before the node changed
    SessionLost,
}

/// A pending one-shot watch on a single node
///
/// Consumed by [`NodeWatch::fired`], so one watch backs exactly one wait.
#[derive(Debug)]
pub struct NodeWatch {
    receiver: oneshot::Receiver<WatchEvent>,
}

impl NodeWatch {
    /// Create a watch and the sender that fires it
    pub fn channel() -> (oneshot::Sender<WatchEvent>, NodeWatch) {
        let (sender, receiver) = oneshot::channel();
        (sender, NodeWatch { receiver })
    }

    /// Wait for the watch to fire
    ///
    /// A watch whose sender is dropped without firing belongs to a session
    /// that went away, and reports [`WatchEvent::SessionLost`].
    pub async fn fired(self) -> WatchEvent {
        self.receiver.await.unwrap_or(WatchEvent::SessionLost)
    }
}

/// Session to a ZooKeeper-class coordination service
///
/// Paths are absolute and slash-delimited. Implementations report session
/// expiry as [`CoordinationError::SessionLost`](crate::CoordinationError::SessionLost).
#[async_trait]
pub trait CoordinationClient: Send + Sync {
    /// Create a node and return its actual path (which carries the sequence
    /// suffix for [`NodeMode::EphemeralSequential`])
    async fn create(&self, path: &str, mode: NodeMode) -> Result<String>;

    /// Whether the node exists
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Delete a node regardless of its version
    async fn delete(&self, path: &str) -> Result<()>;

    /// Names (not paths) of the node's direct children
    async fn children(&self, path: &str) -> Result<Vec<String>>;

    /// Install a one-shot watch on an existing node
    ///
    /// Returns `None` when the node is already gone at installation time.
    async fn watch(&self, path: &str) -> Result<Option<NodeWatch>>;

    /// Resolves once the session is irrecoverably lost
    async fn session_lost(&self);
}
