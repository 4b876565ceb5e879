//! Everything one zkrun instance needs to know about the job it runs

use crate::error::ContextError;
use zkrun_config::JobSpec;
use zkrun_leader_election::{join_path, validate_path};
use zkrun_shell::SpawnOptions;

/// Name of the node every zkrun hierarchy lives under
pub const SERVICE_NODE: &str = "zkrun";

/// Name of the node contenders are created under
pub const LOCK_NODE: &str = "lock";

/// Name of the ephemeral node marking the current leader
pub const ACTIVE_NODE: &str = "active";

/// Coordination node paths of one job
///
/// `<chroot>/zkrun/<syncGroup>/<job>/lock` and `<chroot>/zkrun/<syncGroup>/<job>/active`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPaths {
    job: String,
    lock: String,
    active: String,
}

impl JobPaths {
    pub fn new(chroot: &str, sync_group: &str, job_name: &str) -> Result<Self, ContextError> {
        if validate_path(chroot).is_err() {
            return Err(ContextError::InvalidChroot {
                chroot: chroot.to_string(),
            });
        }
        if !is_segment(sync_group) {
            return Err(ContextError::InvalidSyncGroup {
                group: sync_group.to_string(),
            });
        }
        if !is_segment(job_name) {
            return Err(ContextError::InvalidJobName {
                name: job_name.to_string(),
            });
        }

        let service = join_path(chroot, SERVICE_NODE);
        let job = join_path(&join_path(&service, sync_group), job_name);
        Ok(Self {
            lock: join_path(&job, LOCK_NODE),
            active: join_path(&job, ACTIVE_NODE),
            job,
        })
    }

    pub fn job_path(&self) -> &str {
        &self.job
    }

    pub fn lock_path(&self) -> &str {
        &self.lock
    }

    pub fn active_path(&self) -> &str {
        &self.active
    }
}

fn is_segment(name: &str) -> bool {
    !name.trim().is_empty() && !name.contains('/') && name != "." && name != ".."
}

/// Explicit context threaded from the control loop into the supervisor
#[derive(Debug, Clone)]
pub struct RunContext {
    job_name: String,
    paths: JobPaths,
    job: JobSpec,
    spawn: SpawnOptions,
}

impl RunContext {
    pub fn new(
        chroot: &str,
        sync_group: &str,
        job_name: &str,
        job: JobSpec,
        spawn: SpawnOptions,
    ) -> Result<Self, ContextError> {
        Ok(Self {
            job_name: job_name.to_string(),
            paths: JobPaths::new(chroot, sync_group, job_name)?,
            job,
            spawn,
        })
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn paths(&self) -> &JobPaths {
        &self.paths
    }

    pub fn job(&self) -> &JobSpec {
        &self.job
    }

    /// How the supervised command is spawned
    pub fn spawn_options(&self) -> &SpawnOptions {
        &self.spawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_without_chroot() {
        let paths = JobPaths::new("/", "dc1", "backup").unwrap();
        assert_eq!(paths.job_path(), "/zkrun/dc1/backup");
        assert_eq!(paths.lock_path(), "/zkrun/dc1/backup/lock");
        assert_eq!(paths.active_path(), "/zkrun/dc1/backup/active");
    }

    #[test]
    fn test_paths_with_chroot() {
        let paths = JobPaths::new("/infra/batch", "dc1", "backup").unwrap();
        assert_eq!(paths.lock_path(), "/infra/batch/zkrun/dc1/backup/lock");
        assert_eq!(paths.active_path(), "/infra/batch/zkrun/dc1/backup/active");
    }

    #[test]
    fn test_rejects_bad_segments() {
        assert!(matches!(
            JobPaths::new("/", "dc1/eu", "backup"),
            Err(ContextError::InvalidSyncGroup { .. })
        ));
        assert!(matches!(
            JobPaths::new("/", "", "backup"),
            Err(ContextError::InvalidSyncGroup { .. })
        ));
        assert!(matches!(
            JobPaths::new("/", "dc1", ""),
            Err(ContextError::InvalidJobName { .. })
        ));
        assert!(matches!(
            JobPaths::new("/", "dc1", ".."),
            Err(ContextError::InvalidJobName { .. })
        ));
    }

    #[test]
    fn test_rejects_relative_chroot() {
        assert!(matches!(
            JobPaths::new("infra", "dc1", "backup"),
            Err(ContextError::InvalidChroot { .. })
        ));
    }
}
