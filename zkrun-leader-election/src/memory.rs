//! In-process coordination service
//!
//! [`MemoryEnsemble`] keeps a node tree with ZooKeeper semantics: per-parent
//! sequence counters rendered as ten zero-padded digits, ephemeral nodes that
//! belong to a session, one-shot watches, and session expiry that removes the
//! session's ephemeral nodes and fires the watches on them. Every
//! [`MemorySession`] obtained from one ensemble sees the same tree, which makes
//! it suitable for simulating several hosts contending for one lock.

use crate::client::{CoordinationClient, NodeMode, NodeWatch, WatchEvent};
use crate::error::{CoordinationError, Result};
use crate::paths::{node_name, parent_path, validate_path};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{oneshot, watch};
use tracing::debug;

type SessionId = u64;

struct MemoryNode {
    owner: Option<SessionId>,
    next_sequence: u64,
}

struct PendingWatch {
    session: SessionId,
    sender: oneshot::Sender<WatchEvent>,
}

struct EnsembleState {
    nodes: BTreeMap<String, MemoryNode>,
    watches: HashMap<String, Vec<PendingWatch>>,
    sessions: HashMap<SessionId, watch::Sender<bool>>,
    next_session: SessionId,
}

impl EnsembleState {
    fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            "/".to_string(),
            MemoryNode {
                owner: None,
                next_sequence: 0,
            },
        );
        Self {
            nodes,
            watches: HashMap::new(),
            sessions: HashMap::new(),
            next_session: 1,
        }
    }

    fn is_live(&self, session: SessionId) -> bool {
        self.sessions
            .get(&session)
            .is_some_and(|lost| !*lost.borrow())
    }

    fn child_names(&self, path: &str) -> Vec<String> {
        self.nodes
            .keys()
            .filter(|candidate| parent_path(candidate) == Some(path))
            .map(|candidate| node_name(candidate).to_string())
            .collect()
    }

    /// Remove the session's ephemeral nodes and fail its pending watches
    ///
    /// Returns the number of nodes removed, or `None` when the session had
    /// already ended.
    fn end_session(&mut self, session: SessionId) -> Option<usize> {
        if !self.is_live(session) {
            return None;
        }
        if let Some(lost) = self.sessions.get(&session) {
            lost.send_replace(true);
        }

        let owned: Vec<String> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.owner == Some(session))
            .map(|(path, _)| path.clone())
            .collect();
        for path in owned.iter().rev() {
            self.remove_node(path);
        }

        for watches in self.watches.values_mut() {
            let (ours, theirs): (Vec<_>, Vec<_>) = watches
                .drain(..)
                .partition(|pending| pending.session == session);
            *watches = theirs;
            for pending in ours {
                let _ = pending.sender.send(WatchEvent::SessionLost);
            }
        }
        Some(owned.len())
    }

    fn remove_node(&mut self, path: &str) {
        self.nodes.remove(path);
        if let Some(watches) = self.watches.remove(path) {
            for pending in watches {
                let _ = pending.sender.send(WatchEvent::NodeDeleted);
            }
        }
    }
}

/// A shared in-memory node tree
#[derive(Clone)]
pub struct MemoryEnsemble {
    state: Arc<Mutex<EnsembleState>>,
}

impl MemoryEnsemble {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(EnsembleState::new())),
        }
    }

    /// Open a new session
    pub fn connect(&self) -> MemorySession {
        let mut state = self.lock();
        let id = state.next_session;
        state.next_session += 1;

        let (sender, lost) = watch::channel(false);
        state.sessions.insert(id, sender);
        debug!(session = id, "Memory session opened");

        MemorySession {
            handle: Arc::new(SessionHandle {
                id,
                ensemble: self.clone(),
            }),
            lost,
        }
    }

    /// Whether a node exists, regardless of session
    pub fn contains(&self, path: &str) -> bool {
        self.lock().nodes.contains_key(path)
    }

    /// Child names of a node, sorted by name
    pub fn children_of(&self, path: &str) -> Vec<String> {
        self.lock().child_names(path)
    }

    fn lock(&self) -> MutexGuard<'_, EnsembleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryEnsemble {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared by every clone of one session; closes the session when the last
/// clone goes away
struct SessionHandle {
    id: SessionId,
    ensemble: MemoryEnsemble,
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        let mut state = self.ensemble.lock();
        let removed = state.end_session(self.id);
        state.sessions.remove(&self.id);
        debug!(session = self.id, ?removed, "Memory session closed");
    }
}

/// One client session against a [`MemoryEnsemble`]
///
/// Clones share the session. Dropping the last clone closes it, with the
/// same effect as [`MemorySession::expire`].
#[derive(Clone)]
pub struct MemorySession {
    handle: Arc<SessionHandle>,
    lost: watch::Receiver<bool>,
}

impl MemorySession {
    /// Session identifier, unique within the ensemble
    pub fn id(&self) -> u64 {
        self.handle.id
    }

    /// End the session the way a server-side expiry does
    ///
    /// Ephemeral nodes owned by the session are deleted (firing the watches
    /// other sessions hold on them) and this session's own pending watches
    /// report [`WatchEvent::SessionLost`].
    pub fn expire(&self) {
        if let Some(removed) = self.ensemble().lock().end_session(self.id()) {
            debug!(session = self.id(), removed, "Memory session expired");
        }
    }

    /// Whether the session is still usable
    pub fn is_live(&self) -> bool {
        self.ensemble().lock().is_live(self.id())
    }

    fn ensemble(&self) -> &MemoryEnsemble {
        &self.handle.ensemble
    }

    fn live_state(&self) -> Result<MutexGuard<'_, EnsembleState>> {
        let state = self.ensemble().lock();
        if state.is_live(self.id()) {
            Ok(state)
        } else {
            Err(CoordinationError::SessionLost)
        }
    }
}

#[async_trait]
impl CoordinationClient for MemorySession {
    async fn create(&self, path: &str, mode: NodeMode) -> Result<String> {
        validate_path(path)?;
        let mut state = self.live_state()?;

        let parent = parent_path(path).ok_or_else(|| CoordinationError::NodeExists {
            path: path.to_string(),
        })?;
        let parent_node = state
            .nodes
            .get_mut(parent)
            .ok_or_else(|| CoordinationError::NoNode {
                path: parent.to_string(),
            })?;
        if parent_node.owner.is_some() {
            return Err(CoordinationError::Backend(format!(
                "ephemeral node {} cannot have children",
                parent
            )));
        }

        let created = match mode {
            NodeMode::EphemeralSequential => {
                let sequence = parent_node.next_sequence;
                parent_node.next_sequence += 1;
                format!("{}{:010}", path, sequence)
            }
            NodeMode::Persistent | NodeMode::Ephemeral => path.to_string(),
        };

        if state.nodes.contains_key(&created) {
            return Err(CoordinationError::NodeExists { path: created });
        }

        let owner = match mode {
            NodeMode::Persistent => None,
            NodeMode::Ephemeral | NodeMode::EphemeralSequential => Some(self.id()),
        };
        state.nodes.insert(
            created.clone(),
            MemoryNode {
                owner,
                next_sequence: 0,
            },
        );
        Ok(created)
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        validate_path(path)?;
        Ok(self.live_state()?.nodes.contains_key(path))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        validate_path(path)?;
        let mut state = self.live_state()?;

        if !state.nodes.contains_key(path) {
            return Err(CoordinationError::NoNode {
                path: path.to_string(),
            });
        }
        if !state.child_names(path).is_empty() {
            return Err(CoordinationError::NotEmpty {
                path: path.to_string(),
            });
        }
        state.remove_node(path);
        Ok(())
    }

    async fn children(&self, path: &str) -> Result<Vec<String>> {
        validate_path(path)?;
        let state = self.live_state()?;

        if !state.nodes.contains_key(path) {
            return Err(CoordinationError::NoNode {
                path: path.to_string(),
            });
        }
        Ok(state.child_names(path))
    }

    async fn watch(&self, path: &str) -> Result<Option<NodeWatch>> {
        validate_path(path)?;
        let mut state = self.live_state()?;

        if !state.nodes.contains_key(path) {
            return Ok(None);
        }
        let (sender, node_watch) = NodeWatch::channel();
        state
            .watches
            .entry(path.to_string())
            .or_default()
            .push(PendingWatch {
                session: self.id(),
                sender,
            });
        Ok(Some(node_watch))
    }

    async fn session_lost(&self) {
        let mut lost = self.lost.clone();
        let _ = lost.wait_for(|lost| *lost).await;
    }
}
