//! Everything that must succeed before the first election

use crate::cli::Cli;
use anyhow::{anyhow, Context, Result};
use zkrun::RunContext;
use zkrun_config::{
    job_name, load_job_spec, load_service_config, resolve_job_path, ServiceConfig,
};
use zkrun_shell::SpawnOptions;

/// Validated configuration ready to run
#[derive(Debug)]
pub struct Startup {
    pub service: ServiceConfig,
    pub servers: String,
    pub context: RunContext,
}

/// Load and validate the service config and job spec named on the command line
pub fn prepare(cli: &Cli) -> Result<Startup> {
    let service = load_service_config(&cli.config).with_context(|| {
        format!(
            "Failed to load service configuration {}",
            cli.config.display()
        )
    })?;
    service
        .validate()
        .context("Invalid service configuration")?;
    let ensemble = service.ensemble()?;

    let job_path = resolve_job_path(&cli.job);
    let name = job_name(&job_path)
        .ok_or_else(|| anyhow!("Cannot derive a job name from '{}'", cli.job))?;
    let job = load_job_spec(&job_path)
        .with_context(|| format!("Failed to load job specification {}", job_path.display()))?;

    let spawn = SpawnOptions::resolve(service.run_as_user.as_deref())
        .context("Invalid run-as user")?;
    let context = RunContext::new(&ensemble.chroot, &service.sync_group, &name, job, spawn)?;

    Ok(Startup {
        servers: ensemble.servers,
        service,
        context,
    })
}
