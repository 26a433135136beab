use std::process::Stdio;

use crate::command::{Cmd, CommandError};

/// Abstraction over external process execution for testability.
///
/// Production code uses [`RealExecutor`], tests use mockall-generated mocks.
#[allow(async_fn_in_trait)]
pub trait CommandExecutor: Send + Sync {
    /// Run a command and capture stdout. Non-zero exit is an error.
    async fn exec(&self, cmd: &Cmd) -> Result<String, CommandError>;

    /// Run a command, streaming output to the terminal. Non-zero exit is an error.
    async fn exec_streaming(&self, cmd: &Cmd) -> Result<(), CommandError>;

    /// Run a command with data piped to stdin, streaming output to the terminal.
    async fn exec_with_stdin(&self, cmd: &Cmd, stdin_data: &[u8]) -> Result<(), CommandError>;

    /// Run a foreground process to completion and report its exit code.
    ///
    /// Only a failure to start is an error; `None` means killed by a signal.
    async fn exec_foreground(&self, cmd: &Cmd) -> Result<Option<i32>, CommandError>;
}

/// Real process executor on `tokio::process`.
pub struct RealExecutor;

fn command(cmd: &Cmd) -> tokio::process::Command {
    let mut command = tokio::process::Command::new(&cmd.program);
    command.args(&cmd.args);
    if let Some(dir) = &cmd.cwd {
        command.current_dir(dir);
    }
    command
}

fn not_found(cmd: &Cmd) -> impl FnOnce(std::io::Error) -> CommandError + '_ {
    move |e| CommandError::NotFound {
        program: cmd.program.clone(),
        source: e,
    }
}

impl CommandExecutor for RealExecutor {
    async fn exec(&self, cmd: &Cmd) -> Result<String, CommandError> {
        tracing::debug!(program = %cmd.program, args = ?cmd.args, "exec");
        let output = command(cmd)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(not_found(cmd))?;

        if output.status.success() {
            String::from_utf8(output.stdout).map_err(|e| CommandError::InvalidUtf8 {
                program: cmd.program.clone(),
                source: e,
            })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            Err(CommandError::CommandFailed {
                program: cmd.program.clone(),
                args: cmd.args.clone(),
                stderr,
            })
        }
    }

    async fn exec_streaming(&self, cmd: &Cmd) -> Result<(), CommandError> {
        tracing::debug!(program = %cmd.program, args = ?cmd.args, "exec (streaming)");
        let status = command(cmd)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(not_found(cmd))?;

        if status.success() {
            Ok(())
        } else {
            Err(CommandError::CommandFailed {
                program: cmd.program.clone(),
                args: cmd.args.clone(),
                stderr: format!("exit code: {status}"),
            })
        }
    }

    async fn exec_with_stdin(&self, cmd: &Cmd, stdin_data: &[u8]) -> Result<(), CommandError> {
        use tokio::io::AsyncWriteExt;

        tracing::debug!(program = %cmd.program, args = ?cmd.args, bytes = stdin_data.len(), "exec (stdin)");
        let mut child = command(cmd)
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(not_found(cmd))?;

        if let Some(mut stdin) = child.stdin.take() {
            let stdin_error = |e| CommandError::StdinWrite {
                program: cmd.program.clone(),
                source: e,
            };
            stdin.write_all(stdin_data).await.map_err(stdin_error)?;
            stdin.shutdown().await.map_err(stdin_error)?;
        }

        let status = child.wait().await.map_err(not_found(cmd))?;

        if status.success() {
            Ok(())
        } else {
            Err(CommandError::CommandFailed {
                program: cmd.program.clone(),
                args: cmd.args.clone(),
                stderr: format!("exit code: {status}"),
            })
        }
    }

    async fn exec_foreground(&self, cmd: &Cmd) -> Result<Option<i32>, CommandError> {
        tracing::debug!(program = %cmd.program, args = ?cmd.args, "exec (foreground)");
        let status = command(cmd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(not_found(cmd))?;
        Ok(status.code())
    }
}
