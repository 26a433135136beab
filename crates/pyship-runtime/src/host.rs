//! Runs the bootstrap pipeline directly on the current machine.
//!
//! This is what the image build does inside the container, performed
//! against a host directory instead: the installer is downloaded over
//! HTTP, and the installer, pip, and the application are started as child
//! processes.

use std::path::Path;

use pyship_build::{
    DependencyOptions, InstallerOptions, LaunchCommand, LaunchOutcome, ToolError, Toolchain,
};

use crate::command::{Cmd, CommandError};
use crate::executor::{CommandExecutor, RealExecutor};

/// [`Toolchain`] backed by the local machine.
pub struct HostToolchain<E: CommandExecutor = RealExecutor> {
    executor: E,
    http: reqwest::Client,
}

impl HostToolchain<RealExecutor> {
    pub fn new() -> Self {
        Self::with_executor(RealExecutor)
    }
}

impl Default for HostToolchain<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CommandExecutor> HostToolchain<E> {
    pub fn with_executor(executor: E) -> Self {
        Self {
            executor,
            http: reqwest::Client::new(),
        }
    }
}

fn tool_error(e: CommandError) -> ToolError {
    match e {
        CommandError::NotFound { program, source } => ToolError::Spawn { program, source },
        CommandError::StdinWrite { program, source } => ToolError::Spawn { program, source },
        CommandError::CommandFailed {
            program, stderr, ..
        } => ToolError::Failed {
            program,
            status: "non-zero exit".to_owned(),
            stderr,
        },
        CommandError::InvalidUtf8 { program, source } => ToolError::Failed {
            program,
            status: "unreadable output".to_owned(),
            stderr: source.to_string(),
        },
    }
}

impl<E: CommandExecutor> Toolchain for HostToolchain<E> {
    async fn prepare_base(&self, image: &str) -> Result<(), ToolError> {
        // The host is the base environment; the installer needs Windows.
        if cfg!(windows) {
            tracing::info!(image, "using the host as base environment");
            Ok(())
        } else {
            Err(ToolError::Unreachable {
                target: image.to_owned(),
                detail: format!(
                    "host bootstrap runs a Windows installer, but this host is {}",
                    std::env::consts::OS
                ),
            })
        }
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ToolError> {
        let unreachable = |e: reqwest::Error| ToolError::Unreachable {
            target: url.to_owned(),
            detail: e.to_string(),
        };

        tracing::info!(url, "downloading");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(unreachable)?;
        let bytes = response.bytes().await.map_err(unreachable)?;
        Ok(bytes.to_vec())
    }

    async fn run_installer(
        &self,
        artifact: &Path,
        options: &InstallerOptions,
    ) -> Result<(), ToolError> {
        let cmd = Cmd::new(artifact.to_string_lossy()).args(options.args());
        self.executor
            .exec_streaming(&cmd)
            .await
            .map_err(tool_error)
    }

    async fn install_dependencies(
        &self,
        workdir: &Path,
        options: &DependencyOptions,
    ) -> Result<(), ToolError> {
        let cmd = Cmd::new(&options.runtime)
            .args(options.args())
            .current_dir(workdir);
        self.executor
            .exec_streaming(&cmd)
            .await
            .map_err(tool_error)
    }

    async fn launch(
        &self,
        workdir: &Path,
        command: &LaunchCommand,
    ) -> Result<LaunchOutcome, ToolError> {
        let argv = command.argv();
        let cmd = Cmd::new(&command.runtime)
            .args(argv.into_iter().skip(1))
            .current_dir(workdir);
        let exit_code = self
            .executor
            .exec_foreground(&cmd)
            .await
            .map_err(tool_error)?;
        // Output went straight to the terminal.
        Ok(LaunchOutcome {
            exit_code,
            stdout: String::new(),
        })
    }
}
