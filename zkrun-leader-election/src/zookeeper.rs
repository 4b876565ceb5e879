//! [`CoordinationClient`] backed by a ZooKeeper ensemble

use crate::client::{CoordinationClient, NodeMode, NodeWatch, WatchEvent};
use crate::error::{CoordinationError, Result};
use crate::paths::validate_path;
use async_trait::async_trait;
use tracing::{debug, info};
use zookeeper_client as zk;

/// A ZooKeeper session
///
/// Connection loss is not retried here; callers treat it as a failure of
/// the current attempt.
#[derive(Clone)]
pub struct ZooKeeperClient {
    client: zk::Client,
}

impl ZooKeeperClient {
    /// Connect to a comma separated `host:port` list
    ///
    /// The chroot part of a connect string is applied by the caller as a
    /// path prefix, so `servers` must not carry one.
    pub async fn connect(servers: &str) -> Result<Self> {
        info!(servers = %servers, "Connecting to ZooKeeper");
        let client = zk::Client::connect(servers)
            .await
            .map_err(|e| map_error(servers, e))?;
        info!("ZooKeeper session established");
        Ok(Self { client })
    }
}

fn is_terminal(state: &zk::SessionState) -> bool {
    matches!(
        state,
        zk::SessionState::Expired | zk::SessionState::Closed | zk::SessionState::AuthFailed
    )
}

fn map_error(path: &str, error: zk::Error) -> CoordinationError {
    match error {
        zk::Error::NodeExists => CoordinationError::NodeExists {
            path: path.to_string(),
        },
        zk::Error::NoNode => CoordinationError::NoNode {
            path: path.to_string(),
        },
        zk::Error::NotEmpty => CoordinationError::NotEmpty {
            path: path.to_string(),
        },
        zk::Error::SessionExpired | zk::Error::ClientClosed => CoordinationError::SessionLost,
        zk::Error::ConnectionLoss => CoordinationError::ConnectionLoss,
        other => CoordinationError::Backend(other.to_string()),
    }
}

#[async_trait]
impl CoordinationClient for ZooKeeperClient {
    async fn create(&self, path: &str, mode: NodeMode) -> Result<String> {
        validate_path(path)?;
        let create_mode = match mode {
            NodeMode::Persistent => zk::CreateMode::Persistent,
            NodeMode::Ephemeral => zk::CreateMode::Ephemeral,
            NodeMode::EphemeralSequential => zk::CreateMode::EphemeralSequential,
        };
        let options = create_mode.with_acls(zk::Acls::anyone_all());

        let (_, sequence) = self
            .client
            .create(path, &[], &options)
            .await
            .map_err(|e| map_error(path, e))?;

        Ok(match mode {
            NodeMode::EphemeralSequential => format!("{}{}", path, sequence),
            NodeMode::Persistent | NodeMode::Ephemeral => path.to_string(),
        })
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        validate_path(path)?;
        let stat = self
            .client
            .check_stat(path)
            .await
            .map_err(|e| map_error(path, e))?;
        Ok(stat.is_some())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        validate_path(path)?;
        self.client
            .delete(path, None)
            .await
            .map_err(|e| map_error(path, e))
    }

    async fn children(&self, path: &str) -> Result<Vec<String>> {
        validate_path(path)?;
        self.client
            .list_children(path)
            .await
            .map_err(|e| map_error(path, e))
    }

    async fn watch(&self, path: &str) -> Result<Option<NodeWatch>> {
        validate_path(path)?;
        let (stat, watcher) = self
            .client
            .check_and_watch_stat(path)
            .await
            .map_err(|e| map_error(path, e))?;
        if stat.is_none() {
            return Ok(None);
        }

        let (sender, node_watch) = NodeWatch::channel();
        let watched = path.to_string();
        tokio::spawn(async move {
            let event = watcher.changed().await;
            let observed = match event.event_type {
                zk::EventType::NodeDeleted => WatchEvent::NodeDeleted,
                zk::EventType::Session if is_terminal(&event.session_state) => {
                    WatchEvent::SessionLost
                }
                _ => WatchEvent::NodeChanged,
            };
            debug!(path = %watched, ?observed, "ZooKeeper watch fired");
            let _ = sender.send(observed);
        });
        Ok(Some(node_watch))
    }

    async fn session_lost(&self) {
        let mut watcher = self.client.state_watcher();
        if is_terminal(&watcher.state()) {
            return;
        }
        loop {
            let state = watcher.changed().await;
            debug!(?state, "ZooKeeper session state changed");
            if is_terminal(&state) {
                return;
            }
        }
    }
}
