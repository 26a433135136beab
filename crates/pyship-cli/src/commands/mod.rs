mod bootstrap;
mod build;
mod doctor;
mod eject;
mod init;
mod plan;
mod run;

use std::path::Path;

use pyship_build::eject::EjectedDockerfile;
use pyship_build::{DockerfileGenerator, Pipeline};
use pyship_core::PyshipConfig;

pub use bootstrap::bootstrap;
pub use build::build;
pub use doctor::doctor;
pub use eject::eject;
pub use init::init_project;
pub use plan::{dockerfile, plan};
pub use run::run;

/// The ejected Dockerfile if present, otherwise one rendered from `config`.
pub(crate) fn resolve_dockerfile(
    project_dir: &Path,
    config: &PyshipConfig,
) -> anyhow::Result<String> {
    let pipeline = Pipeline::from_config(config);
    match EjectedDockerfile::load(project_dir)? {
        Some(ejected) => {
            tracing::info!(path = %ejected.path.display(), "using ejected Dockerfile");
            if ejected.is_stale(&pipeline) {
                tracing::warn!(
                    "pyship.toml changed since the Dockerfile was ejected; \
                     update .pyship/Dockerfile or delete it to render a fresh one"
                );
            }
            Ok(ejected.content)
        }
        None => Ok(DockerfileGenerator::new(&pipeline).render()),
    }
}

/// Exit with the application's status when it did not succeed.
pub(crate) fn propagate_exit(code: Option<i32>) {
    match code {
        Some(0) => {}
        Some(code) => std::process::exit(code),
        None => {
            eprintln!("application was terminated by a signal");
            std::process::exit(1);
        }
    }
}
