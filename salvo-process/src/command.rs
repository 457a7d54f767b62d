//! Program + argument vector descriptions of external commands

use crate::error::{ProcessError, ProcessResult};
use std::fmt;

/// An external command as an explicit program and argument vector.
///
/// Command lines coming from users are split with POSIX shell rules, so no
/// shell is involved unless [`CommandSpec::shell`] is used on purpose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Split a command line into words the way a POSIX shell would
    pub fn parse(line: &str) -> ProcessResult<Self> {
        let mut words = shlex::split(line)
            .ok_or_else(|| ProcessError::InvalidCommand(line.to_string()))?
            .into_iter();

        let program = words
            .next()
            .ok_or_else(|| ProcessError::InvalidCommand(line.to_string()))?;

        Ok(Self::new(program).args(words))
    }

    /// Run a command line through `sh -c`
    pub fn shell(line: impl Into<String>) -> Self {
        Self::new("sh").arg("-c").arg(line)
    }

    /// Either split `line` into words or hand it to the shell
    pub fn from_line(line: &str, use_shell: bool) -> ProcessResult<Self> {
        if use_shell {
            if line.trim().is_empty() {
                return Err(ProcessError::InvalidCommand(line.to_string()));
            }
            Ok(Self::shell(line))
        } else {
            Self::parse(line)
        }
    }

    /// Prefix the command with a privilege wrapper such as `sudo`
    pub fn elevated(self, wrapper: &str) -> ProcessResult<Self> {
        let wrapper = Self::parse(wrapper)?;
        Ok(wrapper.arg(self.program).args(self.args))
    }

    /// Replace `{name}` style placeholders in every argument
    pub fn substitute(&self, vars: &[(&str, &str)]) -> Self {
        let args = self
            .args
            .iter()
            .map(|arg| {
                vars.iter()
                    .fold(arg.clone(), |acc, (key, value)| acc.replace(key, value))
            })
            .collect();

        Self {
            program: self.program.clone(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub(crate) fn to_command(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let words = std::iter::once(&self.program).chain(self.args.iter());
        for (i, word) in words.enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match shlex::try_quote(word) {
                Ok(quoted) => f.write_str(&quoted)?,
                Err(_) => f.write_str(word)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_like_a_shell() {
        let spec = CommandSpec::parse(r#"./server --config "my config.json" -v"#).unwrap();
        assert_eq!(spec.program(), "./server");
        assert_eq!(spec.arguments(), &["--config", "my config.json", "-v"]);
    }

    #[test]
    fn test_parse_rejects_empty_and_unbalanced() {
        assert!(matches!(CommandSpec::parse(""), Err(ProcessError::InvalidCommand(_))));
        assert!(matches!(CommandSpec::parse("   "), Err(ProcessError::InvalidCommand(_))));
        assert!(matches!(CommandSpec::parse("echo 'oops"), Err(ProcessError::InvalidCommand(_))));
    }

    #[test]
    fn test_from_line_shell_mode() {
        let spec = CommandSpec::from_line("server | tee log", true).unwrap();
        assert_eq!(spec.program(), "sh");
        assert_eq!(spec.arguments(), &["-c", "server | tee log"]);
        assert!(CommandSpec::from_line(" ", true).is_err());
    }

    #[test]
    fn test_elevated_prefixes_wrapper() {
        let spec = CommandSpec::new("perf")
            .args(["record", "-g"])
            .elevated("sudo -n")
            .unwrap();
        assert_eq!(spec.program(), "sudo");
        assert_eq!(spec.arguments(), &["-n", "perf", "record", "-g"]);
    }

    #[test]
    fn test_substitute_placeholders() {
        let spec = CommandSpec::new("perf")
            .args(["record", "-o", "{output}", "-p", "{pid}", "--tag={pid}"])
            .substitute(&[("{pid}", "4242"), ("{output}", "perf.data")]);
        assert_eq!(
            spec.arguments(),
            &["record", "-o", "perf.data", "-p", "4242", "--tag=4242"]
        );
    }

    #[test]
    fn test_display_quotes_words() {
        let spec = CommandSpec::new("curl").arg("localhost:8080/api/v1/maps").arg("a b");
        let rendered = spec.to_string();
        assert!(rendered.starts_with("curl "));
        assert_eq!(CommandSpec::parse(&rendered).unwrap(), spec);
    }
}
