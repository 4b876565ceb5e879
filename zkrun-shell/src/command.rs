//! Command line tokenization and process construction

use crate::error::{Result, ShellError};
use crate::identity::SpawnOptions;
use std::fmt;
use std::process::Stdio;
use tokio::process::Command;

/// A tokenized command line: program plus arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    /// Split a command line with POSIX shell quoting rules
    ///
    /// No shell is involved in running the result: there is no expansion,
    /// globbing or redirection.
    pub fn parse(line: &str) -> Result<Self> {
        let mut words = shell_words::split(line).map_err(|source| ShellError::Parse {
            line: line.to_string(),
            source,
        })?;
        if words.is_empty() {
            return Err(ShellError::EmptyCommand);
        }
        let program = words.remove(0);
        Ok(Self {
            program,
            args: words,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Build a process with stdio attached to the null device
    pub fn to_command(&self, options: &SpawnOptions) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        options.apply(&mut command);
        command
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let words = std::iter::once(&self.program).chain(self.args.iter());
        f.write_str(&shell_words::join(words))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let line = CommandLine::parse("/usr/bin/rsync -a /src /dst").unwrap();
        assert_eq!(line.program(), "/usr/bin/rsync");
        assert_eq!(line.args(), ["-a", "/src", "/dst"]);
    }

    #[test]
    fn test_parse_quoted() {
        let line = CommandLine::parse(r#"/bin/sh -c 'echo "hello world" > /tmp/x'"#).unwrap();
        assert_eq!(line.program(), "/bin/sh");
        assert_eq!(line.args(), ["-c", r#"echo "hello world" > /tmp/x"#]);
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(
            CommandLine::parse("   "),
            Err(ShellError::EmptyCommand)
        ));
    }

    #[test]
    fn test_parse_unterminated_quote() {
        let err = CommandLine::parse("/bin/echo 'oops").unwrap_err();
        assert!(matches!(err, ShellError::Parse { .. }));
        assert!(err.to_string().contains("oops"));
    }

    #[test]
    fn test_display_requotes() {
        let line = CommandLine::parse("/bin/echo 'a b' c").unwrap();
        assert_eq!(line.to_string(), "/bin/echo 'a b' c");
    }
}
