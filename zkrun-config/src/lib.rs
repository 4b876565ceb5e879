//! zkrun configuration management using Figment
//!
//! Two files drive a zkrun instance:
//!
//! - the **service configuration** (default `/etc/zkrun/zkrun.conf`) naming the
//!   coordination service ensemble, the sync group, the log file and an
//!   optional user to run the job as
//! - the **job specification** (`/etc/zkrun/jobspec/<job>.conf`) naming the
//!   command, its start success delay, the exit policy and the hook lists
//!
//! # Example TOML service configuration
//!
//! ```toml
//! ensemble = "zk1:2181,zk2:2181,zk3:2181/infra"
//! sync.group = "dc1"
//! log.file = "/var/log/zkrun/zkrun.log"
//! run.as.user = "batch"
//! ```
//!
//! # Example TOML job specification
//!
//! ```toml
//! command = "/usr/local/bin/backup --full"
//! start.success.delay = "5s"
//! exit.policy = "run-command"
//! after.start.success = ["/usr/local/bin/announce backup"]
//! after.exit.failure = ["/usr/local/bin/notify-fail backup"]
//! after.exit.always = ["/usr/local/bin/cleanup"]
//! ```
//!
//! `.conf` and `.toml` files are read as TOML, `.yaml`/`.yml` as YAML and
//! `.json` as JSON.

pub mod error;
pub mod format;
pub mod job;
pub mod provider;
pub mod types;

pub use error::{ConfigError, ConfigResult};
pub use format::ConfigFormat;
pub use job::{job_name, resolve_job_path, DEFAULT_CONFIG_PATH, JOBSPEC_DIR};
pub use provider::{ConfigProvider, ENV_PREFIX};
pub use types::{parse_delay, Ensemble, ExitPolicy, JobSpec, ServiceConfig};

/// Load the service configuration from `path`, honouring `ZKRUN_` overrides
pub fn load_service_config(path: &std::path::Path) -> ConfigResult<ServiceConfig> {
    ConfigProvider::new().load_service_config(path)
}

/// Load a job specification from `path`
pub fn load_job_spec(path: &std::path::Path) -> ConfigResult<JobSpec> {
    ConfigProvider::new().load_job_spec(path)
}
