//! Run-as identity resolution and process credential downgrade
//!
//! The run-as user is resolved to numeric ids once, into a [`SpawnOptions`]
//! value, before any process is created. Applying the options only sets the
//! uid and gid on the command; the kernel performs the switch in the child
//! (supplementary groups are cleared when the parent runs as root).

use crate::error::{Result, ShellError};
use nix::unistd::{geteuid, Uid, User};
use tokio::process::Command;
use tracing::debug;

/// Numeric identity of a local account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub uid: u32,
    pub gid: u32,
}

impl Credentials {
    /// Look up a local account by name
    pub fn resolve(user: &str) -> Result<Self> {
        let entry = User::from_name(user)
            .map_err(|source| ShellError::UserLookup {
                user: user.to_string(),
                source,
            })?
            .ok_or_else(|| ShellError::UnknownUser {
                user: user.to_string(),
            })?;
        Ok(Self::from(entry))
    }

    /// The account zkrun itself runs as
    pub fn current() -> Result<Self> {
        let uid = geteuid();
        let entry = User::from_uid(uid)
            .map_err(|source| ShellError::UserLookup {
                user: uid.to_string(),
                source,
            })?
            .ok_or_else(|| ShellError::UnknownUser {
                user: uid.to_string(),
            })?;
        Ok(Self::from(entry))
    }

    /// Whether spawning under these credentials needs a privileged parent
    pub fn requires_privilege(&self) -> bool {
        Uid::from_raw(self.uid) != geteuid()
    }
}

impl From<User> for Credentials {
    fn from(entry: User) -> Self {
        Self {
            user: entry.name,
            uid: entry.uid.as_raw(),
            gid: entry.gid.as_raw(),
        }
    }
}

/// Fail unless the current process may switch to `credentials`
pub fn ensure_can_switch(credentials: &Credentials) -> Result<()> {
    if credentials.requires_privilege() && !geteuid().is_root() {
        return Err(ShellError::NotPrivileged {
            user: credentials.user.clone(),
        });
    }
    Ok(())
}

/// How the supervised process is created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpawnOptions {
    run_as: Option<Credentials>,
}

impl SpawnOptions {
    /// Inherit zkrun's own identity
    pub fn inherit() -> Self {
        Self::default()
    }

    /// Run under already resolved credentials
    pub fn run_as(credentials: Credentials) -> Self {
        Self {
            run_as: Some(credentials),
        }
    }

    /// Resolve an optional user name and check the switch is permitted
    pub fn resolve(user: Option<&str>) -> Result<Self> {
        let Some(user) = user else {
            return Ok(Self::inherit());
        };
        let credentials = Credentials::resolve(user)?;
        ensure_can_switch(&credentials)?;
        debug!(
            user = %credentials.user,
            uid = credentials.uid,
            gid = credentials.gid,
            "Resolved run-as identity"
        );
        Ok(Self::run_as(credentials))
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.run_as.as_ref()
    }

    /// Apply the credential downgrade to a command about to be spawned
    pub fn apply(&self, command: &mut Command) {
        if let Some(credentials) = &self.run_as {
            command.uid(credentials.uid).gid(credentials.gid);
        }
    }
}
