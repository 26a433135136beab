//! Bootstrap pipeline, Dockerfile generation, and eject for pyship.
//!
//! # Pipeline
//!
//! ```text
//! Start
//!   1. Base                ── base image present            → BaseReady
//!   2. InstallInterpreter  ── fetch, install, delete artifact → RuntimeInstalled
//!   3. StageManifest       ── copy requirements file only    → ManifestStaged
//!   4. InstallDependencies ── pip install --no-cache-dir -r  → DependenciesInstalled
//!   5. MaterializeSources  ── copy the whole build context   → SourceStaged
//!   6. Launch              ── <runtime> <entry-point>        → Running
//! ```
//!
//! Steps 1–5 run at build time, step 6 at container start. Each transition
//! is gated on the previous step's success; the first failure halts the
//! pipeline for good.
//!
//! The manifest is staged and installed before the full source copy so the
//! dependency layer is reused as long as the requirements file is unchanged.
//!
//! # Rendering
//!
//! [`DockerfileGenerator`] turns the same step list into a Dockerfile, one
//! instruction group per step, so the image recipe and the in-process
//! pipeline cannot drift apart.

pub mod context;
pub mod dockerfile;
pub mod eject;
pub mod error;
pub mod pipeline;
pub mod step;
pub mod toolchain;

pub use context::{BuildContext, PipelineState, Stage};
pub use dockerfile::DockerfileGenerator;
pub use error::{Fault, PipelineError};
pub use pipeline::{Pipeline, PipelineFailure, RunReport};
pub use step::{Phase, Step};
pub use toolchain::{
    DependencyOptions, InstallerOptions, LaunchCommand, LaunchOutcome, ToolError, Toolchain,
};
