//! Configuration provider using Figment for zkrun

use crate::{
    error::ConfigError,
    format::ConfigFormat,
    types::{parse_delay, ExitPolicy, JobSpec, ServiceConfig},
    ConfigResult,
};
use figment::{
    providers::{Env, Format, Json, Toml, Yaml},
    Figment,
};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Environment variable prefix for service config overrides
pub const ENV_PREFIX: &str = "ZKRUN_";

/// Configuration provider using figment
///
/// Files are read fresh on every call. Keys are addressed by their dotted
/// path (`sync.group`), so TOML files may spell them as bare dotted keys or
/// as nested tables.
pub struct ConfigProvider {
    env_prefix: Option<String>,
}

impl ConfigProvider {
    /// Create a provider that honours `ZKRUN_` environment overrides
    pub fn new() -> Self {
        Self {
            env_prefix: Some(ENV_PREFIX.to_string()),
        }
    }

    /// Create a provider that reads files only
    pub fn without_env() -> Self {
        Self { env_prefix: None }
    }

    /// Load the zkrun service configuration
    pub fn load_service_config(&self, path: &Path) -> ConfigResult<ServiceConfig> {
        let path = resolve_path(path)?;
        debug!("Loading service configuration from {}", path.display());

        let mut figment = load_file(&path)?;
        if let Some(prefix) = &self.env_prefix {
            figment = figment.merge(Env::prefixed(prefix).split("__"));
        }

        let config = ServiceConfig {
            ensemble: required(&figment, "ensemble")?,
            sync_group: required(&figment, "sync.group")?,
            log_file: required::<PathBuf>(&figment, "log.file")?,
            run_as_user: optional::<String>(&figment, "run.as.user")?
                .map(|user| user.trim().to_string())
                .filter(|user| !user.is_empty()),
        };

        trace!(?config, "Service configuration loaded");
        Ok(config)
    }

    /// Load a job specification
    pub fn load_job_spec(&self, path: &Path) -> ConfigResult<JobSpec> {
        let path = resolve_path(path)?;
        debug!("Loading job specification from {}", path.display());

        let figment = load_file(&path)?;

        let exit_policy = required::<String>(&figment, "exit.policy")?.parse::<ExitPolicy>()?;
        let start_success_delay = match optional::<String>(&figment, "start.success.delay")? {
            Some(value) => parse_delay("start.success.delay", &value)?,
            None => std::time::Duration::ZERO,
        };

        let spec = JobSpec {
            command: required(&figment, "command")?,
            start_success_delay,
            exit_policy,
            after_start: optional(&figment, "after.start.success")?.unwrap_or_default(),
            after_exit_failure: optional(&figment, "after.exit.failure")?.unwrap_or_default(),
            after_exit_always: optional(&figment, "after.exit.always")?.unwrap_or_default(),
        };

        trace!(?spec, "Job specification loaded");
        Ok(spec)
    }
}

impl Default for ConfigProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Make the path absolute and resolve symlinks before reading
fn resolve_path(path: &Path) -> ConfigResult<PathBuf> {
    std::fs::canonicalize(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        },
    })
}

/// Load a single configuration file based on its format
fn load_file(path: &Path) -> ConfigResult<Figment> {
    let figment = match ConfigFormat::from_path(path)? {
        ConfigFormat::Toml => Figment::from(Toml::file_exact(path)),
        ConfigFormat::Yaml => Figment::from(Yaml::file_exact(path)),
        ConfigFormat::Json => Figment::from(Json::file_exact(path)),
    };
    Ok(figment)
}

fn required<T: DeserializeOwned>(figment: &Figment, key: &str) -> ConfigResult<T> {
    optional(figment, key)?.ok_or_else(|| ConfigError::MissingKey {
        key: key.to_string(),
    })
}

fn optional<T: DeserializeOwned>(figment: &Figment, key: &str) -> ConfigResult<Option<T>> {
    match figment.extract_inner::<T>(key) {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.missing() => Ok(None),
        Err(e) => Err(ConfigError::parse_error(key, e)),
    }
}
