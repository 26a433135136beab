//! Hand-editable Dockerfile under `.pyship/`.
//!
//! The ejected file starts with a `# pyship-plan:` line describing the step
//! list it was rendered from. Builds keep using the file after
//! `pyship.toml` changes, so callers compare that line with the current
//! pipeline to tell the user the two have drifted.

use std::path::{Path, PathBuf};

use crate::dockerfile::DockerfileGenerator;
use crate::pipeline::Pipeline;
use crate::step::Step;

const PLAN_PREFIX: &str = "# pyship-plan: ";

/// `.pyship/Dockerfile` under `project_dir`.
pub fn ejected_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".pyship").join("Dockerfile")
}

/// Render `pipeline` into `.pyship/Dockerfile`, refusing to overwrite an
/// earlier eject.
pub fn eject(project_dir: &Path, pipeline: &Pipeline) -> Result<PathBuf, EjectError> {
    let path = ejected_path(project_dir);
    if path.exists() {
        return Err(EjectError::AlreadyEjected(path));
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| EjectError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;
    }

    let content = format!(
        "{PLAN_PREFIX}{}\n{}",
        plan_line(pipeline),
        DockerfileGenerator::new(pipeline).render()
    );
    std::fs::write(&path, content).map_err(|e| EjectError::Io {
        path: path.clone(),
        source: e,
    })?;

    tracing::debug!(path = %path.display(), steps = pipeline.steps().len(), "dockerfile ejected");
    Ok(path)
}

/// An ejected Dockerfile as found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EjectedDockerfile {
    pub path: PathBuf,
    pub content: String,
}

impl EjectedDockerfile {
    /// Load `.pyship/Dockerfile`, or `None` when nothing was ejected.
    pub fn load(project_dir: &Path) -> Result<Option<Self>, EjectError> {
        let path = ejected_path(project_dir);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path).map_err(|e| EjectError::Io {
            path: path.clone(),
            source: e,
        })?;
        Ok(Some(Self { path, content }))
    }

    /// The recorded plan, if the header survived editing.
    pub fn plan(&self) -> Option<&str> {
        self.content
            .lines()
            .find_map(|l| l.strip_prefix(PLAN_PREFIX))
            .map(str::trim)
    }

    /// Whether the file was rendered from a different plan than `pipeline`.
    ///
    /// A file without a plan line is never reported as stale.
    pub fn is_stale(&self, pipeline: &Pipeline) -> bool {
        self.plan().is_some_and(|p| p != plan_line(pipeline))
    }
}

/// One-line description of every step's inputs.
fn plan_line(pipeline: &Pipeline) -> String {
    let mut line = format!("workdir={}", pipeline.workdir().display());
    for step in pipeline.steps() {
        let detail = match step {
            Step::Base { image } => image.clone(),
            Step::InstallInterpreter {
                version,
                url,
                options,
                ..
            } => format!("{version} {url} {}", options.args().join(" ")),
            Step::StageManifest { manifest } => manifest.display().to_string(),
            Step::InstallDependencies { options } => options.args().join(" "),
            Step::MaterializeSources => ".".to_owned(),
            Step::Launch { command } => command.argv().join(" "),
        };
        line.push_str(&format!("; {}={detail}", step.name()));
    }
    line
}

#[derive(Debug, thiserror::Error)]
pub enum EjectError {
    #[error("Dockerfile already ejected at {0}; edit it directly or delete it to re-eject")]
    AlreadyEjected(PathBuf),

    #[error("I/O error on ejected Dockerfile at {path}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
