use std::path::{Path, PathBuf};

/// External capabilities the pipeline needs from its environment.
///
/// Production code uses a host implementation that shells out and talks
/// HTTP; tests use mockall-generated mocks or hand-written fakes.
#[allow(async_fn_in_trait)]
pub trait Toolchain: Send + Sync {
    /// Confirm the base environment exists and is reachable.
    async fn prepare_base(&self, image: &str) -> Result<(), ToolError>;

    /// Download the resource at `url`.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ToolError>;

    /// Run the interpreter installer at `artifact` non-interactively.
    async fn run_installer(
        &self,
        artifact: &Path,
        options: &InstallerOptions,
    ) -> Result<(), ToolError>;

    /// Install the manifest's packages into the runtime, with `workdir` as cwd.
    async fn install_dependencies(
        &self,
        workdir: &Path,
        options: &DependencyOptions,
    ) -> Result<(), ToolError>;

    /// Start the application in the foreground and wait for it to exit.
    async fn launch(
        &self,
        workdir: &Path,
        command: &LaunchCommand,
    ) -> Result<LaunchOutcome, ToolError>;
}

/// Options passed to the interpreter installer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerOptions {
    pub install_all_users: bool,
    pub prepend_path: bool,
}

impl Default for InstallerOptions {
    fn default() -> Self {
        Self {
            install_all_users: true,
            prepend_path: true,
        }
    }
}

impl InstallerOptions {
    /// Installer command-line arguments, e.g. `/quiet InstallAllUsers=1 PrependPath=1`.
    pub fn args(&self) -> Vec<String> {
        vec![
            "/quiet".to_owned(),
            format!("InstallAllUsers={}", u8::from(self.install_all_users)),
            format!("PrependPath={}", u8::from(self.prepend_path)),
        ]
    }
}

/// Options passed to the package installer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyOptions {
    /// Interpreter executable (`python`)
    pub runtime: String,
    /// Manifest path relative to the working directory
    pub manifest: PathBuf,
    pub no_cache: bool,
}

impl DependencyOptions {
    /// Arguments for `<runtime>`: `-m pip install --no-cache-dir -r <manifest>`.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["-m".to_owned(), "pip".to_owned(), "install".to_owned()];
        if self.no_cache {
            args.push("--no-cache-dir".to_owned());
        }
        args.push("-r".to_owned());
        args.push(slash_path(&self.manifest));
        args
    }
}

/// The container's foreground command: `<runtime> <entry-point>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub runtime: String,
    /// Entry point relative to the working directory
    pub entry_point: PathBuf,
}

impl LaunchCommand {
    pub fn argv(&self) -> Vec<String> {
        vec![self.runtime.clone(), slash_path(&self.entry_point)]
    }
}

/// How the launched application ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOutcome {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
}

impl LaunchOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

// Relative paths are rendered with forward slashes on every host.
fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{target} is unreachable: {detail}")]
    Unreachable { target: String, detail: String },

    #[error("failed to start {program}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} exited with {status}\n{stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}
