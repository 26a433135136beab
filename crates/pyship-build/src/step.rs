use std::path::PathBuf;

use pyship_core::{FileSystem, Manifest, SourceTree};

use crate::context::{BuildContext, PipelineState, Stage};
use crate::error::{Fault, PipelineError};
use crate::toolchain::{DependencyOptions, InstallerOptions, LaunchCommand, ToolError, Toolchain};

/// When a step runs: while building the image, or when the container starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Build,
    Start,
}

/// One step of the bootstrap pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Confirm the base operating-system image is available.
    Base { image: String },
    /// Fetch the interpreter installer, run it, and delete it.
    InstallInterpreter {
        version: String,
        url: String,
        /// Where the installer artifact lives until cleanup
        artifact: PathBuf,
        options: InstallerOptions,
    },
    /// Copy only the dependency manifest into the working directory.
    StageManifest {
        /// Manifest path relative to both the build context and the working directory
        manifest: PathBuf,
    },
    /// Install the staged manifest's packages.
    InstallDependencies { options: DependencyOptions },
    /// Copy the whole build context into the working directory.
    MaterializeSources,
    /// Run the entry point as the container's foreground process.
    Launch { command: LaunchCommand },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Base { .. } => "base",
            Step::InstallInterpreter { .. } => "install-interpreter",
            Step::StageManifest { .. } => "stage-manifest",
            Step::InstallDependencies { .. } => "install-dependencies",
            Step::MaterializeSources => "materialize-sources",
            Step::Launch { .. } => "launch",
        }
    }

    /// Stage the pipeline must be at before this step may run.
    pub fn requires(&self) -> Stage {
        match self {
            Step::Base { .. } => Stage::Start,
            Step::InstallInterpreter { .. } => Stage::BaseReady,
            Step::StageManifest { .. } => Stage::RuntimeInstalled,
            Step::InstallDependencies { .. } => Stage::ManifestStaged,
            Step::MaterializeSources => Stage::DependenciesInstalled,
            Step::Launch { .. } => Stage::SourceStaged,
        }
    }

    /// Stage the pipeline moves to when this step succeeds.
    pub fn reaches(&self) -> Stage {
        match self {
            Step::Base { .. } => Stage::BaseReady,
            Step::InstallInterpreter { .. } => Stage::RuntimeInstalled,
            Step::StageManifest { .. } => Stage::ManifestStaged,
            Step::InstallDependencies { .. } => Stage::DependenciesInstalled,
            Step::MaterializeSources => Stage::SourceStaged,
            Step::Launch { .. } => Stage::Running,
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            Step::Launch { .. } => Phase::Start,
            _ => Phase::Build,
        }
    }

    /// Run this step against `ctx`.
    ///
    /// The step only runs if `ctx` is at [`requires`](Self::requires). On
    /// success `ctx` advances to [`reaches`](Self::reaches); on failure it
    /// becomes permanently failed.
    pub async fn run<F, T>(
        &self,
        ctx: &mut BuildContext<F>,
        source: &SourceTree,
        tools: &T,
    ) -> Result<(), PipelineError>
    where
        F: FileSystem,
        T: Toolchain,
    {
        match ctx.state() {
            PipelineState::Failed { at } => return Err(PipelineError::Halted { at }),
            PipelineState::At(actual) if actual != self.requires() => {
                return Err(PipelineError::OutOfOrder {
                    step: self.name(),
                    expected: self.requires(),
                    actual,
                });
            }
            PipelineState::At(_) => {}
        }

        tracing::info!(step = self.name(), from = %self.requires(), "step started");

        let result = match self {
            Step::Base { image } => prepare_base(image, tools).await,
            Step::InstallInterpreter {
                version,
                url,
                artifact,
                options,
            } => install_interpreter(ctx, tools, version, url, artifact, options).await,
            Step::StageManifest { manifest } => stage_manifest(ctx, source, manifest),
            Step::InstallDependencies { options } => {
                install_dependencies(ctx, tools, options).await
            }
            Step::MaterializeSources => materialize_sources(ctx, source),
            Step::Launch { command } => launch(ctx, tools, command).await,
        };

        match result {
            Ok(()) => {
                ctx.advance(self.reaches());
                tracing::info!(step = self.name(), to = %self.reaches(), "step finished");
                Ok(())
            }
            Err(e) => {
                ctx.fail();
                tracing::error!(step = self.name(), error = %e, "step failed");
                Err(e)
            }
        }
    }
}

async fn prepare_base<T: Toolchain>(image: &str, tools: &T) -> Result<(), PipelineError> {
    tools
        .prepare_base(image)
        .await
        .map_err(|e| PipelineError::BaseUnavailable {
            image: image.to_owned(),
            source: e.into(),
        })
}

async fn install_interpreter<F, T>(
    ctx: &mut BuildContext<F>,
    tools: &T,
    version: &str,
    url: &str,
    artifact: &std::path::Path,
    options: &InstallerOptions,
) -> Result<(), PipelineError>
where
    F: FileSystem,
    T: Toolchain,
{
    let bytes = tools
        .fetch(url)
        .await
        .map_err(|e| PipelineError::DownloadFailure {
            url: url.to_owned(),
            source: e.into(),
        })?;
    tracing::debug!(url, bytes = bytes.len(), "installer downloaded");

    let installed: Result<(), Fault> = match ctx.fs.write_file(artifact, &bytes) {
        Ok(()) => {
            let located = ctx.fs.locate(artifact);
            tools
                .run_installer(&located, options)
                .await
                .map_err(Fault::from)
        }
        Err(e) => Err(e.into()),
    };

    // The artifact never outlives this step, whatever the installer did.
    let cleanup = ctx.fs.remove_file(artifact);
    tracing::debug!(artifact = %artifact.display(), removed = cleanup.is_ok(), "installer artifact cleanup");

    installed.map_err(|e| PipelineError::InstallFailure {
        version: version.to_owned(),
        source: e,
    })?;
    cleanup.map_err(|e| PipelineError::InstallFailure {
        version: version.to_owned(),
        source: e.into(),
    })
}

fn stage_manifest<F: FileSystem>(
    ctx: &mut BuildContext<F>,
    source: &SourceTree,
    manifest: &std::path::Path,
) -> Result<(), PipelineError> {
    let file = source
        .get(manifest)
        .ok_or_else(|| PipelineError::CopyFailure {
            path: manifest.to_path_buf(),
            source: pyship_core::Error::NotFound(manifest.to_path_buf()).into(),
        })?;

    let target = ctx
        .write_into_workdir(manifest, &file.contents)
        .map_err(|e| PipelineError::CopyFailure {
            path: manifest.to_path_buf(),
            source: e.into(),
        })?;
    tracing::debug!(target = %target.display(), "manifest staged");
    Ok(())
}

async fn install_dependencies<F, T>(
    ctx: &mut BuildContext<F>,
    tools: &T,
    options: &DependencyOptions,
) -> Result<(), PipelineError>
where
    F: FileSystem,
    T: Toolchain,
{
    let staged = ctx.workdir().join(&options.manifest);
    let failure = |source: Fault| PipelineError::DependencyResolutionFailure {
        manifest: options.manifest.clone(),
        source,
    };

    let bytes = ctx
        .fs
        .read_file(&staged)
        .map_err(|e| failure(e.into()))?;
    // The summary is informational; pip is the judge of the manifest.
    match Manifest::from_bytes(&bytes) {
        Ok(manifest) => tracing::info!(
            packages = manifest.len(),
            names = ?manifest.names().collect::<Vec<_>>(),
            references = ?manifest.references(),
            "installing dependencies"
        ),
        Err(e) => tracing::warn!(error = %e, "manifest not summarized; handing it to pip as is"),
    }

    let workdir = ctx.fs.locate(ctx.workdir());
    tools
        .install_dependencies(&workdir, options)
        .await
        .map_err(|e| failure(e.into()))
}

fn materialize_sources<F: FileSystem>(
    ctx: &mut BuildContext<F>,
    source: &SourceTree,
) -> Result<(), PipelineError> {
    for file in source.files() {
        ctx.write_into_workdir(&file.path, &file.contents)
            .map_err(|e| PipelineError::CopyFailure {
                path: file.path.clone(),
                source: e.into(),
            })?;
    }
    tracing::debug!(files = source.len(), "sources materialized");
    Ok(())
}

async fn launch<F, T>(
    ctx: &mut BuildContext<F>,
    tools: &T,
    command: &LaunchCommand,
) -> Result<(), PipelineError>
where
    F: FileSystem,
    T: Toolchain,
{
    let entry = ctx.workdir().join(&command.entry_point);
    if !ctx.fs.exists(&entry) {
        return Err(PipelineError::LaunchFailure {
            entry_point: command.entry_point.clone(),
            source: pyship_core::Error::NotFound(entry).into(),
        });
    }

    let workdir = ctx.fs.locate(ctx.workdir());
    let outcome = tools
        .launch(&workdir, command)
        .await
        .map_err(|e| PipelineError::LaunchFailure {
            entry_point: command.entry_point.clone(),
            source: e.into(),
        })?;
    tracing::info!(exit_code = ?outcome.exit_code, "application exited");
    let status = match outcome.exit_code {
        Some(0) => None,
        Some(code) => Some(format!("exit code {code}")),
        None => Some("termination by signal".to_owned()),
    };
    // Kept even on failure so callers can pass the exit code on.
    ctx.record_launch(outcome);

    match status {
        None => Ok(()),
        Some(status) => Err(PipelineError::LaunchFailure {
            entry_point: command.entry_point.clone(),
            source: ToolError::Failed {
                program: command.runtime.clone(),
                status,
                stderr: String::new(),
            }
            .into(),
        }),
    }
}
