use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use pyship_core::FileSystem;

use crate::toolchain::LaunchOutcome;

/// Pipeline progress, in the only order it can advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Start,
    BaseReady,
    RuntimeInstalled,
    ManifestStaged,
    DependenciesInstalled,
    SourceStaged,
    Running,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Start,
        Stage::BaseReady,
        Stage::RuntimeInstalled,
        Stage::ManifestStaged,
        Stage::DependenciesInstalled,
        Stage::SourceStaged,
        Stage::Running,
    ];

    /// The stage a successful step moves to, or `None` from `Running`.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Start => Some(Stage::BaseReady),
            Stage::BaseReady => Some(Stage::RuntimeInstalled),
            Stage::RuntimeInstalled => Some(Stage::ManifestStaged),
            Stage::ManifestStaged => Some(Stage::DependenciesInstalled),
            Stage::DependenciesInstalled => Some(Stage::SourceStaged),
            Stage::SourceStaged => Some(Stage::Running),
            Stage::Running => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "Start",
            Stage::BaseReady => "BaseReady",
            Stage::RuntimeInstalled => "RuntimeInstalled",
            Stage::ManifestStaged => "ManifestStaged",
            Stage::DependenciesInstalled => "DependenciesInstalled",
            Stage::SourceStaged => "SourceStaged",
            Stage::Running => "Running",
        };
        f.write_str(name)
    }
}

/// Where the pipeline stands: advancing, or permanently failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    At(Stage),
    /// Terminal. `at` is the last stage reached before the failing step.
    Failed { at: Stage },
}

/// The working directory as an explicit value threaded through every step.
///
/// Holds the filesystem the steps write through, the fixed working
/// directory path, the set of files the pipeline has placed there, and the
/// current [`PipelineState`].
#[derive(Debug)]
pub struct BuildContext<F: FileSystem> {
    pub(crate) fs: F,
    workdir: PathBuf,
    materialized: BTreeSet<PathBuf>,
    state: PipelineState,
    launch: Option<LaunchOutcome>,
}

impl<F: FileSystem> BuildContext<F> {
    pub fn new(fs: F, workdir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            workdir: workdir.into(),
            materialized: BTreeSet::new(),
            state: PipelineState::At(Stage::Start),
            launch: None,
        }
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn into_fs(self) -> F {
        self.fs
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Files the pipeline has written into the working directory.
    pub fn materialized(&self) -> &BTreeSet<PathBuf> {
        &self.materialized
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Last stage reached, whether or not the pipeline has since failed.
    pub fn stage(&self) -> Stage {
        match self.state {
            PipelineState::At(stage) | PipelineState::Failed { at: stage } => stage,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, PipelineState::Failed { .. })
    }

    /// Outcome of the launched application, once `Running` has been reached.
    pub fn launch_outcome(&self) -> Option<&LaunchOutcome> {
        self.launch.as_ref()
    }

    pub(crate) fn write_into_workdir(
        &mut self,
        relative: &Path,
        contents: &[u8],
    ) -> pyship_core::Result<PathBuf> {
        let target = self.workdir.join(relative);
        self.fs.write_file(&target, contents)?;
        self.materialized.insert(target.clone());
        Ok(target)
    }

    pub(crate) fn advance(&mut self, to: Stage) {
        self.state = PipelineState::At(to);
    }

    pub(crate) fn fail(&mut self) {
        self.state = PipelineState::Failed { at: self.stage() };
    }

    pub(crate) fn record_launch(&mut self, outcome: LaunchOutcome) {
        self.launch = Some(outcome);
    }
}
