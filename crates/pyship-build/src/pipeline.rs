use std::path::PathBuf;

use pyship_core::{FileSystem, PyshipConfig, SourceTree};

use crate::context::{BuildContext, Stage};
use crate::error::PipelineError;
use crate::step::{Phase, Step};
use crate::toolchain::{
    DependencyOptions, InstallerOptions, LaunchCommand, LaunchOutcome, Toolchain,
};

/// An ordered, validated list of steps plus the working directory they target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    workdir: PathBuf,
    steps: Vec<Step>,
}

/// Where a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub reached: Stage,
    pub launch: Option<LaunchOutcome>,
}

/// Where and why a run stopped.
#[derive(Debug, thiserror::Error)]
#[error("pipeline halted at {halted_at} during step {step}")]
pub struct PipelineFailure {
    /// Last stage reached before the failing step
    pub halted_at: Stage,
    pub step: &'static str,
    #[source]
    pub error: PipelineError,
}

impl Pipeline {
    /// Build a pipeline from explicit steps.
    ///
    /// Each step must start where the previous one left off, beginning at
    /// [`Stage::Start`]. A plan may stop early but cannot skip or reorder.
    pub fn new(workdir: impl Into<PathBuf>, steps: Vec<Step>) -> Result<Self, PipelineError> {
        let mut at = Stage::Start;
        for step in &steps {
            if step.requires() != at {
                return Err(PipelineError::InvalidPlan {
                    step: step.name(),
                    after: at,
                });
            }
            at = step.reaches();
        }
        Ok(Self {
            workdir: workdir.into(),
            steps,
        })
    }

    /// The standard six-step bootstrap for `config`.
    pub fn from_config(config: &PyshipConfig) -> Self {
        let manifest = PathBuf::from(&config.app.requirements);
        Self {
            workdir: PathBuf::from(&config.app.workdir),
            steps: vec![
                Step::Base {
                    image: config.image.base_image.clone(),
                },
                Step::InstallInterpreter {
                    version: config.python.version.clone(),
                    url: config.python.resolved_installer_url(),
                    artifact: PathBuf::from(&config.python.installer_path),
                    options: InstallerOptions {
                        install_all_users: config.python.install_all_users,
                        prepend_path: config.python.prepend_path,
                    },
                },
                Step::StageManifest {
                    manifest: manifest.clone(),
                },
                Step::InstallDependencies {
                    options: DependencyOptions {
                        runtime: config.app.runtime.clone(),
                        manifest,
                        no_cache: true,
                    },
                },
                Step::MaterializeSources,
                Step::Launch {
                    command: LaunchCommand {
                        runtime: config.app.runtime.clone(),
                        entry_point: PathBuf::from(&config.app.entry_point),
                    },
                },
            ],
        }
    }

    pub fn workdir(&self) -> &std::path::Path {
        &self.workdir
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// A fresh context over `fs` targeting this pipeline's working directory.
    pub fn context<F: FileSystem>(&self, fs: F) -> BuildContext<F> {
        BuildContext::new(fs, self.workdir.clone())
    }

    /// Run the build-time steps (everything up to `SourceStaged`).
    pub async fn build<F, T>(
        &self,
        ctx: &mut BuildContext<F>,
        source: &SourceTree,
        tools: &T,
    ) -> Result<RunReport, PipelineFailure>
    where
        F: FileSystem,
        T: Toolchain,
    {
        self.drive(ctx, source, tools, Some(Phase::Build)).await
    }

    /// Run the container-start steps on an already built context.
    pub async fn start<F, T>(
        &self,
        ctx: &mut BuildContext<F>,
        tools: &T,
    ) -> Result<RunReport, PipelineFailure>
    where
        F: FileSystem,
        T: Toolchain,
    {
        self.drive(ctx, &SourceTree::default(), tools, Some(Phase::Start))
            .await
    }

    /// Run every step, in order, halting on the first failure.
    pub async fn run<F, T>(
        &self,
        ctx: &mut BuildContext<F>,
        source: &SourceTree,
        tools: &T,
    ) -> Result<RunReport, PipelineFailure>
    where
        F: FileSystem,
        T: Toolchain,
    {
        self.drive(ctx, source, tools, None).await
    }

    async fn drive<F, T>(
        &self,
        ctx: &mut BuildContext<F>,
        source: &SourceTree,
        tools: &T,
        phase: Option<Phase>,
    ) -> Result<RunReport, PipelineFailure>
    where
        F: FileSystem,
        T: Toolchain,
    {
        let selected = self
            .steps
            .iter()
            .filter(|s| phase.is_none_or(|p| s.phase() == p));

        for step in selected {
            // Resuming a partially driven context skips what already ran.
            if !ctx.is_failed() && ctx.stage() >= step.reaches() {
                tracing::debug!(step = step.name(), "already satisfied; skipping");
                continue;
            }
            let halted_at = ctx.stage();
            step.run(ctx, source, tools)
                .await
                .map_err(|error| PipelineFailure {
                    halted_at,
                    step: step.name(),
                    error,
                })?;
        }

        Ok(RunReport {
            reached: ctx.stage(),
            launch: ctx.launch_outcome().cloned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_orders_manifest_before_sources() {
        let pipeline = Pipeline::from_config(&PyshipConfig::default());
        let names: Vec<_> = pipeline.steps().iter().map(Step::name).collect();
        assert_eq!(
            names,
            [
                "base",
                "install-interpreter",
                "stage-manifest",
                "install-dependencies",
                "materialize-sources",
                "launch",
            ]
        );
    }

    #[test]
    fn from_config_plan_is_valid() {
        let pipeline = Pipeline::from_config(&PyshipConfig::default());
        let rebuilt = Pipeline::new(pipeline.workdir(), pipeline.steps().to_vec()).unwrap();
        assert_eq!(rebuilt, pipeline);
    }

    #[test]
    fn new_rejects_skipped_manifest_stage() {
        let steps: Vec<_> = Pipeline::from_config(&PyshipConfig::default())
            .steps()
            .iter()
            .filter(|s| !matches!(s, Step::StageManifest { .. }))
            .cloned()
            .collect();
        let err = Pipeline::new("/app", steps).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidPlan {
                step: "install-dependencies",
                after: Stage::RuntimeInstalled,
            }
        ));
    }

    #[test]
    fn new_rejects_sources_before_dependencies() {
        let mut steps = Pipeline::from_config(&PyshipConfig::default())
            .steps()
            .to_vec();
        steps.swap(3, 4);
        assert!(Pipeline::new("/app", steps).is_err());
    }

    #[test]
    fn new_accepts_prefix_plan() {
        let steps = Pipeline::from_config(&PyshipConfig::default()).steps()[..2].to_vec();
        assert!(Pipeline::new("/app", steps).is_ok());
    }

    #[test]
    fn launch_is_the_only_start_phase_step() {
        let pipeline = Pipeline::from_config(&PyshipConfig::default());
        let start: Vec<_> = pipeline
            .steps()
            .iter()
            .filter(|s| s.phase() == Phase::Start)
            .map(Step::name)
            .collect();
        assert_eq!(start, ["launch"]);
    }
}
