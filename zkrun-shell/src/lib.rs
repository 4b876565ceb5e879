//! Command execution for zkrun
//!
//! Command lines from job specifications are tokenized with POSIX shell
//! quoting and executed directly, without an intermediate shell. The
//! supervised command may run under a different local account; hooks always
//! run under zkrun's own identity.

mod command;
mod error;
mod hooks;
mod identity;

pub use command::CommandLine;
pub use error::{describe_status, Result, ShellError};
pub use hooks::{run_best_effort, run_fatal, run_hook};
pub use identity::{ensure_can_switch, Credentials, SpawnOptions};
