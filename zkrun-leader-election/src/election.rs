//! Leader election over sequential ephemeral nodes
//!
//! Every attempt creates one `contender-<sequence>` node below the lock
//! node. The contender holding the lowest live sequence number leads. Every
//! other contender watches only its immediate predecessor, so a departing
//! leader wakes exactly one waiter.

use crate::client::{CoordinationClient, NodeMode, WatchEvent};
use crate::error::{CoordinationError, ElectionError};
use crate::paths::{join_path, node_name};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Name prefix of contender nodes
pub const CONTENDER_PREFIX: &str = "contender-";

/// Proof that an election attempt holds the lowest live sequence number
///
/// Valid only while its contender node exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadershipToken {
    contender: String,
    sequence: u64,
}

impl LeadershipToken {
    /// Full path of the contender node backing this leadership
    pub fn contender_path(&self) -> &str {
        &self.contender
    }

    /// Sequence number the service assigned to the contender node
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Give up leadership by deleting the contender node
    ///
    /// A node that is already gone (session expiry) counts as released.
    pub async fn release(
        self,
        client: &dyn CoordinationClient,
    ) -> Result<(), CoordinationError> {
        match client.delete(&self.contender).await {
            Ok(()) => {
                info!(path = %self.contender, "Leadership released");
                Ok(())
            }
            Err(e) if e.is_no_node() => {
                debug!(path = %self.contender, "Contender node already gone");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Numeric sequence suffix of a contender node name
pub fn parse_sequence(name: &str) -> Option<u64> {
    let digits = name.len() - name.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    name[name.len() - digits..].parse().ok()
}

/// Where one contender stands in the sorted contender list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Standing {
    /// Lowest live sequence number
    Leader,
    /// Waiting behind the named predecessor
    Follower { predecessor: String },
    /// Our node is no longer among the children
    Vanished,
}

/// Decide where the contender with `own` sequence stands among `children`
///
/// Children without a numeric suffix are ignored; ordering uses the suffix
/// alone so contenders created with different prefixes still order by the
/// service-assigned sequence.
pub fn evaluate(children: &[String], own: u64) -> Standing {
    let mut contenders: Vec<(u64, &String)> = children
        .iter()
        .filter_map(|name| parse_sequence(name).map(|sequence| (sequence, name)))
        .collect();
    contenders.sort_unstable_by_key(|(sequence, _)| *sequence);

    let Some(position) = contenders.iter().position(|(sequence, _)| *sequence == own) else {
        return Standing::Vanished;
    };
    match position.checked_sub(1) {
        None => Standing::Leader,
        Some(previous) => Standing::Follower {
            predecessor: contenders[previous].1.clone(),
        },
    }
}

/// Runs election attempts against one lock node
pub struct ElectionCoordinator {
    client: Arc<dyn CoordinationClient>,
    lock_path: String,
}

impl ElectionCoordinator {
    pub fn new(client: Arc<dyn CoordinationClient>, lock_path: impl Into<String>) -> Self {
        Self {
            client,
            lock_path: lock_path.into(),
        }
    }

    /// Path of the lock node contenders are created under
    pub fn lock_path(&self) -> &str {
        &self.lock_path
    }

    /// Block until this attempt leads, or fail
    ///
    /// There is no bound on the wait. Losing the session while waiting
    /// fails the election; the contender node goes with the session.
    pub async fn elect(&self) -> Result<LeadershipToken, ElectionError> {
        let prefix = join_path(&self.lock_path, CONTENDER_PREFIX);
        let contender = self
            .client
            .create(&prefix, NodeMode::EphemeralSequential)
            .await
            .map_err(|source| match source {
                CoordinationError::SessionLost => ElectionError::SessionLost,
                source => ElectionError::ContenderCreation {
                    lock_path: self.lock_path.clone(),
                    source,
                },
            })?;
        let sequence = parse_sequence(node_name(&contender)).ok_or_else(|| {
            ElectionError::MalformedContender {
                path: contender.clone(),
            }
        })?;
        info!(path = %contender, sequence, "Contender node created");

        loop {
            let children = self.client.children(&self.lock_path).await?;

            let predecessor = match evaluate(&children, sequence) {
                Standing::Leader => {
                    info!(path = %contender, sequence, "Leadership acquired");
                    return Ok(LeadershipToken {
                        contender,
                        sequence,
                    });
                }
                Standing::Vanished => {
                    warn!(path = %contender, "Contender node vanished from lock");
                    return Err(ElectionError::ContenderLost { path: contender });
                }
                Standing::Follower { predecessor } => join_path(&self.lock_path, &predecessor),
            };

            let Some(watch) = self.client.watch(&predecessor).await? else {
                debug!(predecessor = %predecessor, "Predecessor gone before watch, re-checking");
                continue;
            };
            debug!(predecessor = %predecessor, sequence, "Waiting for predecessor");

            tokio::select! {
                event = watch.fired() => {
                    if event == WatchEvent::SessionLost {
                        warn!("Session lost while waiting for predecessor");
                        return Err(ElectionError::SessionLost);
                    }
                    debug!(predecessor = %predecessor, ?event, "Predecessor watch fired");
                }
                _ = self.client.session_lost() => {
                    warn!("Session lost while waiting for predecessor");
                    return Err(ElectionError::SessionLost);
                }
            }
        }
    }
}
