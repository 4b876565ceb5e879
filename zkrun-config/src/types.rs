//! Configuration value types

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Runtime configuration of the zkrun service itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Coordination service connect string `host:port,host:port/chroot`
    pub ensemble: String,
    /// Name of the sync group; jobs with the same name in different
    /// sync groups do not exclude each other
    pub sync_group: String,
    /// Full path of the log file
    pub log_file: PathBuf,
    /// User to run the command under. `None` inherits zkrun's identity
    pub run_as_user: Option<String>,
}

impl ServiceConfig {
    /// Check the values that cannot be expressed through types alone
    pub fn validate(&self) -> ConfigResult<()> {
        Ensemble::parse(&self.ensemble)?;

        if self.sync_group.trim().is_empty() {
            return Err(ConfigError::validation("sync.group must not be empty"));
        }
        if self.sync_group.contains('/') {
            return Err(ConfigError::invalid_value(
                "sync.group",
                format!("'{}' must be a single path segment", self.sync_group),
            ));
        }
        if self.log_file.as_os_str().is_empty() {
            return Err(ConfigError::validation("log.file must not be empty"));
        }
        Ok(())
    }

    /// Parsed form of [`ServiceConfig::ensemble`]
    pub fn ensemble(&self) -> ConfigResult<Ensemble> {
        Ensemble::parse(&self.ensemble)
    }
}

/// A coordination service connect string split into its server list and chroot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ensemble {
    /// Comma separated `host:port` list
    pub servers: String,
    /// Absolute node path every zkrun path is placed below; `/` when absent
    pub chroot: String,
}

impl Ensemble {
    /// Split `host:port[,host:port...][/chroot]`
    pub fn parse(connect: &str) -> ConfigResult<Self> {
        let connect = connect.trim();
        let (servers, chroot) = match connect.find('/') {
            Some(idx) => (&connect[..idx], &connect[idx..]),
            None => (connect, "/"),
        };

        if servers.split(',').all(|server| server.trim().is_empty()) {
            return Err(ConfigError::invalid_value(
                "ensemble",
                format!("'{}' contains no servers", connect),
            ));
        }

        let chroot = chroot.trim_end_matches('/');
        let chroot = if chroot.is_empty() { "/" } else { chroot };

        Ok(Self {
            servers: servers.to_string(),
            chroot: chroot.to_string(),
        })
    }
}

/// What to do once the supervised command has exited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExitPolicy {
    /// Contend for leadership again and rerun the command, forever
    #[serde(alias = "reaquire-lock")]
    ReacquireLock,
    /// Run the `after.exit.failure` hooks on fault, then exit
    RunCommand,
    /// Exit
    Terminate,
}

impl ExitPolicy {
    /// Canonical configuration spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitPolicy::ReacquireLock => "reacquire-lock",
            ExitPolicy::RunCommand => "run-command",
            ExitPolicy::Terminate => "terminate",
        }
    }
}

impl fmt::Display for ExitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExitPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "reacquire-lock" | "reaquire-lock" => Ok(ExitPolicy::ReacquireLock),
            "run-command" => Ok(ExitPolicy::RunCommand),
            "terminate" => Ok(ExitPolicy::Terminate),
            other => Err(ConfigError::invalid_value(
                "exit.policy",
                format!(
                    "unknown policy '{}', expected one of reacquire-lock, run-command, terminate",
                    other
                ),
            )),
        }
    }
}

/// Specification of the job zkrun runs under the distributed lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    /// Command line to run
    pub command: String,
    /// How long the command must stay up before its start counts as successful
    pub start_success_delay: Duration,
    /// What happens after the command exits
    pub exit_policy: ExitPolicy,
    /// Command lines run after a successful start. These must succeed
    pub after_start: Vec<String>,
    /// Command lines run after a faulted exit under [`ExitPolicy::RunCommand`]
    pub after_exit_failure: Vec<String>,
    /// Command lines run after every exit
    pub after_exit_always: Vec<String>,
}

impl JobSpec {
    /// Job spec with only a command line; everything else defaulted
    pub fn new(command: impl Into<String>, exit_policy: ExitPolicy) -> Self {
        Self {
            command: command.into(),
            start_success_delay: Duration::ZERO,
            exit_policy,
            after_start: Vec::new(),
            after_exit_failure: Vec::new(),
            after_exit_always: Vec::new(),
        }
    }

    pub fn with_start_success_delay(mut self, delay: Duration) -> Self {
        self.start_success_delay = delay;
        self
    }

    pub fn with_after_start(mut self, hooks: Vec<String>) -> Self {
        self.after_start = hooks;
        self
    }

    pub fn with_after_exit_failure(mut self, hooks: Vec<String>) -> Self {
        self.after_exit_failure = hooks;
        self
    }

    pub fn with_after_exit_always(mut self, hooks: Vec<String>) -> Self {
        self.after_exit_always = hooks;
        self
    }
}

/// Parse a duration string such as `100ms`, `2s` or `1m30s`
pub fn parse_delay(key: &str, value: &str) -> ConfigResult<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(Duration::ZERO);
    }
    humantime::parse_duration(value)
        .map_err(|e| ConfigError::invalid_value(key, format!("'{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(sync_group: &str) -> ServiceConfig {
        ServiceConfig {
            ensemble: "zk1:2181,zk2:2181/infra".to_string(),
            sync_group: sync_group.to_string(),
            log_file: PathBuf::from("/var/log/zkrun.log"),
            run_as_user: None,
        }
    }

    #[test]
    fn test_ensemble_with_chroot() {
        let ensemble = Ensemble::parse("zk1:2181,zk2:2181/infra/prod/").unwrap();
        assert_eq!(ensemble.servers, "zk1:2181,zk2:2181");
        assert_eq!(ensemble.chroot, "/infra/prod");
    }

    #[test]
    fn test_ensemble_without_chroot() {
        let ensemble = Ensemble::parse("localhost:2181").unwrap();
        assert_eq!(ensemble.servers, "localhost:2181");
        assert_eq!(ensemble.chroot, "/");

        let ensemble = Ensemble::parse("localhost:2181/").unwrap();
        assert_eq!(ensemble.chroot, "/");
    }

    #[test]
    fn test_ensemble_without_servers() {
        assert!(Ensemble::parse("/chroot").is_err());
        assert!(Ensemble::parse("").is_err());
        assert!(Ensemble::parse(" , ").is_err());
    }

    #[test]
    fn test_exit_policy_parsing() {
        assert_eq!(
            "reacquire-lock".parse::<ExitPolicy>().unwrap(),
            ExitPolicy::ReacquireLock
        );
        assert_eq!(
            "reaquire-lock".parse::<ExitPolicy>().unwrap(),
            ExitPolicy::ReacquireLock
        );
        assert_eq!(
            "run-command".parse::<ExitPolicy>().unwrap(),
            ExitPolicy::RunCommand
        );
        assert_eq!(
            "terminate".parse::<ExitPolicy>().unwrap(),
            ExitPolicy::Terminate
        );

        let err = "restart".parse::<ExitPolicy>().unwrap_err();
        assert!(err.to_string().contains("restart"));
    }

    #[test]
    fn test_exit_policy_display_roundtrips() {
        for policy in [
            ExitPolicy::ReacquireLock,
            ExitPolicy::RunCommand,
            ExitPolicy::Terminate,
        ] {
            assert_eq!(policy.to_string().parse::<ExitPolicy>().unwrap(), policy);
        }
    }

    #[test]
    fn test_parse_delay() {
        assert_eq!(
            parse_delay("start.success.delay", "100ms").unwrap(),
            Duration::from_millis(100)
        );
        assert_eq!(
            parse_delay("start.success.delay", "1m30s").unwrap(),
            Duration::from_secs(90)
        );
        assert_eq!(
            parse_delay("start.success.delay", "").unwrap(),
            Duration::ZERO
        );
        assert!(parse_delay("start.success.delay", "soon").is_err());
    }

    #[test]
    fn test_service_config_validation() {
        assert!(service("batch").validate().is_ok());
        assert!(service("").validate().is_err());
        assert!(service("a/b").validate().is_err());

        let mut config = service("batch");
        config.ensemble = "/only-chroot".to_string();
        assert!(config.validate().is_err());
    }
}
