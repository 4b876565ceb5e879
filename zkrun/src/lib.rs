//! Run a command exactly once across a fleet of hosts
//!
//! Every host runs zkrun with the same job. The instances contend for a lock
//! in a ZooKeeper-class coordination service; the winner runs the job
//! command under supervision, running hooks around it, and the exit policy
//! decides whether to contend again.
//!
//! ```ignore
//! use std::sync::Arc;
//! use zkrun::{ControlLoop, RunContext};
//! use zkrun_leader_election::ZooKeeperClient;
//!
//! let client = Arc::new(ZooKeeperClient::connect(&ensemble.servers).await?);
//! let context = RunContext::new(&ensemble.chroot, "dc1", "backup", job, spawn)?;
//! std::process::exit(ControlLoop::new(client, context).run().await);
//! ```

mod context;
mod control_loop;
mod error;
mod supervisor;

pub use context::{JobPaths, RunContext, ACTIVE_NODE, LOCK_NODE, SERVICE_NODE};
pub use control_loop::{ControlLoop, EXIT_ERROR, EXIT_SUCCESS};
pub use error::{ContextError, SupervisorError};
pub use supervisor::{ExitOutcome, ProcessSupervisor, SupervisorState};
