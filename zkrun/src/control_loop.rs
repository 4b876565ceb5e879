//! Election and supervision, repeated according to the exit policy

use crate::context::RunContext;
use crate::supervisor::{ExitOutcome, ProcessSupervisor};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use zkrun_config::ExitPolicy;
use zkrun_leader_election::{
    CoordinationClient, CoordinationError, ElectionCoordinator, PathManager, WatchEvent,
};

/// Process exit code for a clean shutdown
pub const EXIT_SUCCESS: i32 = 0;

/// Process exit code for setup errors, election failure and faults
pub const EXIT_ERROR: i32 = 1;

/// Drives one job through election and supervision until the exit policy
/// says to stop
pub struct ControlLoop {
    client: Arc<dyn CoordinationClient>,
    context: Arc<RunContext>,
    max_rounds: Option<usize>,
}

impl ControlLoop {
    pub fn new(client: Arc<dyn CoordinationClient>, context: RunContext) -> Self {
        Self {
            client,
            context: Arc::new(context),
            max_rounds: None,
        }
    }

    /// Stop after `rounds` supervised runs even under `reacquire-lock`
    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = Some(rounds);
        self
    }

    /// Run until the exit policy ends the loop; returns the process exit code
    pub async fn run(&self) -> i32 {
        let paths = self.context.paths();
        let policy = self.context.job().exit_policy;

        if let Err(e) = PathManager::new(self.client.clone())
            .ensure_hierarchy(paths.lock_path(), true)
            .await
        {
            error!(path = %paths.lock_path(), "Failed to create node hierarchy: {}", e);
            return EXIT_ERROR;
        }

        let election = ElectionCoordinator::new(self.client.clone(), paths.lock_path());
        let mut supervisor = ProcessSupervisor::new(self.client.clone(), self.context.clone());
        let mut round = 0usize;

        loop {
            if self.max_rounds.is_some_and(|max| round >= max) {
                info!(rounds = round, "Reached round limit, stopping");
                return EXIT_SUCCESS;
            }
            round += 1;

            info!(job = %self.context.job_name(), round, "Contending for leadership");
            let token = match election.elect().await {
                Ok(token) => token,
                Err(e) => {
                    error!(job = %self.context.job_name(), "Election failed: {}", e);
                    return EXIT_ERROR;
                }
            };

            let outcome = supervisor.run().await;

            if let Err(e) = token.release(self.client.as_ref()).await {
                warn!("Failed to release leadership: {}", e);
            }

            match (policy, outcome) {
                (ExitPolicy::ReacquireLock, ExitOutcome::Fault(e)) => {
                    warn!(%policy, "Run faulted, contending again: {}", e);
                }
                (ExitPolicy::ReacquireLock, ExitOutcome::Clean) => {
                    info!(%policy, "Run finished, contending again");
                }
                (_, ExitOutcome::Fault(e)) => {
                    error!(%policy, "Run faulted: {}", e);
                    return EXIT_ERROR;
                }
                (_, ExitOutcome::Clean) => {
                    info!(%policy, "Run finished");
                    return EXIT_SUCCESS;
                }
            }

            if let Err(e) = self.await_marker_change(paths.active_path()).await {
                error!(
                    job = %self.context.job_name(),
                    "Failed waiting for active marker: {}", e
                );
                return EXIT_ERROR;
            }
        }
    }

    /// Wait until the `active` marker left by another session changes
    ///
    /// Returns at once when no marker exists, which is the case after every
    /// run this instance supervised itself.
    async fn await_marker_change(&self, active: &str) -> Result<(), CoordinationError> {
        let Some(watch) = self.client.watch(active).await? else {
            return Ok(());
        };
        info!(
            path = %active,
            "Active marker held elsewhere, waiting before contending again"
        );

        tokio::select! {
            event = watch.fired() => {
                if event == WatchEvent::SessionLost {
                    return Err(CoordinationError::SessionLost);
                }
                debug!(path = %active, ?event, "Active marker watch fired");
                Ok(())
            }
            _ = self.client.session_lost() => Err(CoordinationError::SessionLost),
        }
    }
}
