//! Job name to job spec path resolution

use std::path::{Path, PathBuf};

/// Default location of the service configuration
pub const DEFAULT_CONFIG_PATH: &str = "/etc/zkrun/zkrun.conf";

/// Directory relative job names are resolved against
pub const JOBSPEC_DIR: &str = "/etc/zkrun/jobspec";

const JOBSPEC_SUFFIX: &str = ".conf";

/// Resolve the `--job` argument to the job spec file
///
/// Absolute paths are used as given. Anything else is a job name below
/// [`JOBSPEC_DIR`], with `.conf` appended when missing.
pub fn resolve_job_path(job: &str) -> PathBuf {
    let path = Path::new(job);
    if path.is_absolute() {
        return path.to_path_buf();
    }

    let file = if job.ends_with(JOBSPEC_SUFFIX) {
        job.to_string()
    } else {
        format!("{}{}", job, JOBSPEC_SUFFIX)
    };
    Path::new(JOBSPEC_DIR).join(file)
}

/// Name of the job as used in the coordination node hierarchy
pub fn job_name(job_path: &Path) -> Option<String> {
    let file = job_path.file_name()?.to_str()?;
    let name = file.strip_suffix(JOBSPEC_SUFFIX).unwrap_or(file);
    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_plain_job_name() {
        assert_eq!(
            resolve_job_path("backup"),
            PathBuf::from("/etc/zkrun/jobspec/backup.conf")
        );
    }

    #[test]
    fn test_resolve_job_name_with_suffix() {
        assert_eq!(
            resolve_job_path("backup.conf"),
            PathBuf::from("/etc/zkrun/jobspec/backup.conf")
        );
    }

    #[test]
    fn test_resolve_absolute_path() {
        assert_eq!(
            resolve_job_path("/srv/jobs/backup.conf"),
            PathBuf::from("/srv/jobs/backup.conf")
        );
    }

    #[test]
    fn test_job_name() {
        assert_eq!(
            job_name(Path::new("/etc/zkrun/jobspec/backup.conf")).as_deref(),
            Some("backup")
        );
        assert_eq!(
            job_name(Path::new("/srv/jobs/report.yaml")).as_deref(),
            Some("report.yaml")
        );
        assert_eq!(job_name(Path::new("/etc/zkrun/jobspec/.conf")), None);
    }
}
