//! External process execution.

use std::process::{Command, Stdio};

use crate::error::{Result, SwitchError};

/// Runs an external program and returns its captured stdout.
///
/// Implementations fail with [`SwitchError::ExternalToolFailure`] when the
/// program cannot be started, exits non-zero, or writes anything to stderr.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<String>;
}

/// [`CommandRunner`] backed by `std::process::Command`. Blocks until exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<String> {
        let command = command_line(program, args);
        log::debug!("running: {command}");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| SwitchError::ExternalToolFailure {
                command: command.clone(),
                message: format!("error starting process: {e}"),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !stderr.is_empty() {
            return Err(SwitchError::ExternalToolFailure {
                command,
                message: stderr,
            });
        }
        if !output.status.success() {
            return Err(SwitchError::ExternalToolFailure {
                command,
                message: format!("{} {}", output.status, stdout.trim()),
            });
        }

        Ok(stdout)
    }
}

/// Render a program and its arguments for messages, quoting where needed.
pub fn command_line(program: &str, args: &[String]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        if arg.is_empty() || arg.contains(char::is_whitespace) {
            line.push('"');
            line.push_str(arg);
            line.push('"');
        } else {
            line.push_str(arg);
        }
    }
    line
}
