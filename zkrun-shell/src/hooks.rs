//! Hook execution
//!
//! Hooks are short commands run synchronously around the supervised process.
//! They always run under zkrun's own identity and must exit 0 to count as
//! successful.

use crate::command::CommandLine;
use crate::error::{describe_status, Result, ShellError};
use crate::identity::SpawnOptions;
use tracing::{debug, error, info};

/// Run one hook to completion
pub async fn run_hook(line: &str) -> Result<()> {
    let command_line = CommandLine::parse(line)?;
    debug!(hook = %command_line, "Running hook");

    let status = command_line
        .to_command(&SpawnOptions::inherit())
        .status()
        .await
        .map_err(|source| ShellError::Spawn {
            program: command_line.program().to_string(),
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        debug!(hook = %command_line, "Hook {}", describe_status(&status));
        Err(ShellError::Failed {
            command: command_line.to_string(),
            status,
        })
    }
}

/// Run hooks in order, stopping at the first failure
pub async fn run_fatal(hooks: &[String]) -> Result<()> {
    for hook in hooks {
        run_hook(hook).await?;
    }
    Ok(())
}

/// Run every hook in order regardless of failures
///
/// Failures are logged and counted; the count is returned.
pub async fn run_best_effort(hooks: &[String], category: &str) -> usize {
    let mut failures = 0;
    for hook in hooks {
        if let Err(e) = run_hook(hook).await {
            error!(category, "Hook failed: {}", e);
            failures += 1;
        }
    }
    if !hooks.is_empty() {
        info!(category, ran = hooks.len(), failures, "Finished hooks");
    }
    failures
}
