//! External command execution
//!
//! Every external tool (conversion, identification) runs through
//! [`CommandRunner::run`]. The command line is handed to the platform shell so
//! that argument fragments from style options pass through untouched.

use std::path::PathBuf;
use std::process::Stdio;

use affix_core::RuntimeConfig;
use thiserror::Error;
use tokio::process::Command;

/// Exit status a shell reports for a command it could not find.
const EXIT_COMMAND_NOT_FOUND: i32 = 127;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Command not found: {command}")]
    NotFound { command: String },

    #[error("Command {command} exited with status {exit_code}: {stderr}")]
    Execution {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("Failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command {command} was terminated by a signal")]
    Terminated { command: String },
}

#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
    command_path: Option<PathBuf>,
    swallow_stderr: bool,
}

impl CommandRunner {
    pub fn new(command_path: Option<PathBuf>, swallow_stderr: bool) -> Self {
        Self {
            command_path,
            swallow_stderr,
        }
    }

    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::new(config.command_path.clone(), config.swallow_stderr)
    }

    pub fn swallow_stderr(&self) -> bool {
        self.swallow_stderr
    }

    /// Full command line: the command, prefixed with the search path if configured.
    pub fn command_line(&self, command: &str, args: &str) -> String {
        let executable = match &self.command_path {
            Some(dir) => dir.join(command).to_string_lossy().into_owned(),
            None => command.to_string(),
        };

        if args.trim().is_empty() {
            executable
        } else {
            format!("{} {}", executable, args)
        }
    }

    /// Run `command args` and return its stdout.
    ///
    /// Exit status 127 is reported as [`CommandError::NotFound`]; any status not
    /// in `expected_exit_codes` as [`CommandError::Execution`].
    #[tracing::instrument(skip(self, expected_exit_codes))]
    pub async fn run(
        &self,
        command: &str,
        args: &str,
        expected_exit_codes: &[i32],
    ) -> Result<String, CommandError> {
        let line = self.command_line(command, args);
        let start = std::time::Instant::now();

        tracing::debug!(command_line = %line, "Running external command");

        let stderr = if self.swallow_stderr {
            Stdio::null()
        } else {
            Stdio::piped()
        };

        let output = shell(&line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(stderr)
            .output()
            .await
            .map_err(|source| CommandError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let exit_code = output.status.code().ok_or_else(|| CommandError::Terminated {
            command: command.to_string(),
        })?;

        if exit_code == EXIT_COMMAND_NOT_FOUND && !expected_exit_codes.contains(&exit_code) {
            return Err(CommandError::NotFound {
                command: command.to_string(),
            });
        }

        if !expected_exit_codes.contains(&exit_code) {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::error!(
                command = %command,
                exit_code = exit_code,
                stderr = %stderr,
                "External command failed"
            );
            return Err(CommandError::Execution {
                command: command.to_string(),
                exit_code,
                stderr,
            });
        }

        tracing::debug!(
            command = %command,
            exit_code = exit_code,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "External command finished"
        );

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(unix)]
fn shell(line: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(line);
    command
}

#[cfg(windows)]
fn shell(line: &str) -> Command {
    let mut command = Command::new("cmd");
    command.arg("/C").arg(line);
    command
}

/// Double-quote a single argument for the shell.
pub fn quote(arg: &str) -> String {
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
