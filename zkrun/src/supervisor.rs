//! Supervision of one run of the job command while leadership is held
//!
//! A run moves through `Starting → Probation → Running` and ends in
//! `Succeeded` or `Faulted`. The outcome is handed back to the control loop,
//! which decides from the exit policy whether to contend again.

use crate::context::RunContext;
use crate::error::SupervisorError;
use std::io;
use std::process::ExitStatus;
use std::sync::Arc;
use tokio::process::Child;
use tracing::{debug, error, info, warn};
use zkrun_config::ExitPolicy;
use zkrun_leader_election::{CoordinationClient, NodeMode};
use zkrun_shell::{describe_status, run_best_effort, run_fatal, CommandLine, ShellError};

/// Lifecycle states of a supervised run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Starting,
    Probation,
    Running,
    Succeeded,
    Faulted,
}

/// Result of one supervised run
#[derive(Debug)]
pub enum ExitOutcome {
    /// The command succeeded, or leadership was given up without running it
    Clean,
    /// The run faulted
    Fault(SupervisorError),
}

impl ExitOutcome {
    pub fn is_fault(&self) -> bool {
        matches!(self, ExitOutcome::Fault(_))
    }
}

/// Runs the job command once per acquired leadership
pub struct ProcessSupervisor {
    client: Arc<dyn CoordinationClient>,
    context: Arc<RunContext>,
    history: Vec<SupervisorState>,
}

impl ProcessSupervisor {
    pub fn new(client: Arc<dyn CoordinationClient>, context: Arc<RunContext>) -> Self {
        Self {
            client,
            context,
            history: Vec::new(),
        }
    }

    /// States visited by the most recent run, in order
    pub fn history(&self) -> &[SupervisorState] {
        &self.history
    }

    /// Current state of the most recent run
    pub fn state(&self) -> Option<SupervisorState> {
        self.history.last().copied()
    }

    /// Run the command to completion, hooks included
    ///
    /// Must only be called while leadership is held.
    pub async fn run(&mut self) -> ExitOutcome {
        self.history.clear();
        self.transition(SupervisorState::Starting);

        let active = self.context.paths().active_path().to_string();
        if let Err(source) = self.client.create(&active, NodeMode::Ephemeral).await {
            let err = SupervisorError::ActiveMarker {
                path: active,
                source,
            };
            error!("{}, relinquishing leadership", err);
            return ExitOutcome::Clean;
        }
        debug!(path = %active, "Active marker created");

        let outcome = self.supervise().await;

        match self.client.delete(&active).await {
            Ok(()) => debug!(path = %active, "Active marker removed"),
            Err(e) if e.is_no_node() => debug!(path = %active, "Active marker already gone"),
            Err(e) => warn!(path = %active, "Failed to remove active marker: {}", e),
        }
        outcome
    }

    async fn supervise(&mut self) -> ExitOutcome {
        let context = self.context.clone();
        let job = context.job();

        let command_line = match CommandLine::parse(&job.command) {
            Ok(command_line) => command_line,
            Err(ShellError::EmptyCommand) => {
                warn!(job = %context.job_name(), "Command line is empty, nothing to run");
                return ExitOutcome::Clean;
            }
            Err(e) => return self.fault(SupervisorError::Start(e)),
        };

        let mut command = command_line.to_command(context.spawn_options());
        command.kill_on_drop(true);
        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(source) => {
                return self.fault(SupervisorError::Start(ShellError::Spawn {
                    program: command_line.program().to_string(),
                    source,
                }))
            }
        };
        info!(
            command = %command_line,
            pid = child.id(),
            user = context.spawn_options().credentials().map(|c| c.user.as_str()),
            "Started command"
        );

        self.transition(SupervisorState::Probation);
        let early_exit = tokio::select! {
            status = child.wait() => Some(status),
            _ = tokio::time::sleep(job.start_success_delay) => None,
        };

        let status = match early_exit {
            Some(Ok(status)) if !status.success() => {
                warn!(
                    command = %command_line,
                    "Command {} during start probation",
                    describe_status(&status)
                );
                Ok(status)
            }
            Some(Err(source)) => Err(source),
            early_exit => {
                // an early success is treated like a start that outlived probation
                self.transition(SupervisorState::Running);
                info!(command = %command_line, "Command start succeeded");

                if let Err(e) = run_fatal(&job.after_start).await {
                    error!("After-start hook failed, killing command: {}", e);
                    if early_exit.is_none() {
                        kill_and_reap(&mut child, &command_line).await;
                    }
                    return self.fault(SupervisorError::StartHook(e));
                }

                match early_exit {
                    Some(status) => status,
                    None => child.wait().await,
                }
            }
        };

        let outcome = classify(&command_line, status);
        match &outcome {
            ExitOutcome::Clean => {
                self.transition(SupervisorState::Succeeded);
                info!(command = %command_line, "Command exited successfully");
            }
            ExitOutcome::Fault(e) => {
                self.transition(SupervisorState::Faulted);
                error!("{}", e);
            }
        }

        if outcome.is_fault() && job.exit_policy == ExitPolicy::RunCommand {
            run_best_effort(&job.after_exit_failure, "after-exit-failure").await;
        }
        run_best_effort(&job.after_exit_always, "after-exit-always").await;

        outcome
    }

    fn fault(&mut self, err: SupervisorError) -> ExitOutcome {
        error!("{}", err);
        self.transition(SupervisorState::Faulted);
        ExitOutcome::Fault(err)
    }

    fn transition(&mut self, state: SupervisorState) {
        debug!(job = %self.context.job_name(), ?state, "Supervisor state");
        self.history.push(state);
    }
}

fn classify(command_line: &CommandLine, status: io::Result<ExitStatus>) -> ExitOutcome {
    match status {
        Ok(status) if status.success() => ExitOutcome::Clean,
        Ok(status) => ExitOutcome::Fault(SupervisorError::Exited {
            command: command_line.to_string(),
            status,
        }),
        Err(source) => ExitOutcome::Fault(SupervisorError::Wait {
            command: command_line.to_string(),
            source,
        }),
    }
}

/// SIGKILL the command and wait for it so no zombie is left behind
async fn kill_and_reap(child: &mut Child, command_line: &CommandLine) {
    debug!(command = %command_line, pid = child.id(), "Killing command");
    if let Err(e) = child.kill().await {
        warn!(command = %command_line, "Failed to kill command: {}", e);
        return;
    }
    match child.wait().await {
        Ok(status) => debug!(command = %command_line, "Command {}", describe_status(&status)),
        Err(e) => warn!(command = %command_line, "Failed to reap command: {}", e),
    }
}
