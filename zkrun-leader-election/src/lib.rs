//! Leader election primitives over a ZooKeeper-class coordination service.
//!
//! Exactly one contender across every host sharing a lock node holds
//! leadership at a time. The mutual exclusion lives entirely in the
//! coordination service; this crate is a client of it.
//!
//! # Overview
//!
//! - **Narrow client seam**: [`CoordinationClient`] covers create, exists,
//!   delete, list children, one-shot watches and session loss
//! - **ZooKeeper sessions**: [`ZooKeeperClient`] over `zookeeper-client`
//! - **In-memory ensemble**: [`MemoryEnsemble`] for simulations and tests
//! - **Hierarchy creation**: [`PathManager`] creates missing persistent nodes,
//!   tolerating concurrent creators
//! - **Election**: [`ElectionCoordinator`] blocks until the attempt holds the
//!   lowest live sequence number and hands back a [`LeadershipToken`]
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use zkrun_leader_election::{ElectionCoordinator, PathManager, ZooKeeperClient};
//!
//! let client = Arc::new(ZooKeeperClient::connect("zk1:2181,zk2:2181").await?);
//! PathManager::new(client.clone())
//!     .ensure_hierarchy("/zkrun/dc1/backup/lock", true)
//!     .await?;
//!
//! let election = ElectionCoordinator::new(client.clone(), "/zkrun/dc1/backup/lock");
//! let token = election.elect().await?;
//! // ... lead ...
//! token.release(client.as_ref()).await?;
//! ```

mod client;
mod election;
mod error;
pub mod memory;
mod paths;
mod zookeeper;

pub use client::{CoordinationClient, NodeMode, NodeWatch, WatchEvent};
pub use election::{
    evaluate, parse_sequence, ElectionCoordinator, LeadershipToken, Standing, CONTENDER_PREFIX,
};
pub use error::{CoordinationError, ElectionError, Result};
pub use memory::{MemoryEnsemble, MemorySession};
pub use paths::{join_path, node_name, parent_path, validate_path, PathManager};
pub use zookeeper::ZooKeeperClient;
