use std::path::PathBuf;

use crate::context::Stage;
use crate::toolchain::ToolError;

/// What went wrong underneath a failed step.
#[derive(Debug, thiserror::Error)]
pub enum Fault {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Fs(#[from] pyship_core::Error),
}

/// Step failures. Every variant is fatal to the pipeline; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("base image {image} is not available")]
    BaseUnavailable { image: String, source: Fault },

    #[error("failed to download interpreter installer from {url}")]
    DownloadFailure { url: String, source: Fault },

    #[error("failed to install Python {version}")]
    InstallFailure { version: String, source: Fault },

    #[error("failed to install dependencies from {manifest}")]
    DependencyResolutionFailure { manifest: PathBuf, source: Fault },

    #[error("failed to copy {path} into the working directory")]
    CopyFailure { path: PathBuf, source: Fault },

    #[error("failed to launch {entry_point}")]
    LaunchFailure { entry_point: PathBuf, source: Fault },

    #[error("step {step} requires stage {expected}, but the pipeline is at {actual}")]
    OutOfOrder {
        step: &'static str,
        expected: Stage,
        actual: Stage,
    },

    #[error("pipeline already failed at {at}; it cannot be resumed")]
    Halted { at: Stage },

    #[error("invalid pipeline plan: step {step} cannot follow stage {after}")]
    InvalidPlan { step: &'static str, after: Stage },
}
