use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::command::{Cmd, CommandError};
use crate::executor::{CommandExecutor, RealExecutor};

/// Docker CLI operations, parameterized over the executor for testability.
pub struct DockerClient<E: CommandExecutor = RealExecutor> {
    executor: E,
}

impl DockerClient<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor,
        }
    }
}

impl Default for DockerClient<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CommandExecutor> DockerClient<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    // ── Images ──

    pub async fn image_exists(&self, image: &str) -> bool {
        self.executor
            .exec(&docker(["image", "inspect", "--format", "{{.Id}}", image]))
            .await
            .is_ok()
    }

    /// Make `image` available locally, pulling it if needed.
    pub async fn ensure_image(&self, image: &str) -> Result<(), DockerError> {
        if self.image_exists(image).await {
            tracing::debug!(image, "image already present");
            return Ok(());
        }
        self.executor
            .exec_streaming(&docker(["pull", image]))
            .await
            .map_err(|e| DockerError::Pull {
                image: image.to_owned(),
                source: e,
            })
    }

    /// `docker build -t <tag> -f - <context>` with the Dockerfile on stdin.
    pub async fn build_image(
        &self,
        context_dir: &Path,
        tag: &str,
        dockerfile: &str,
    ) -> Result<(), DockerError> {
        let context = context_dir
            .to_str()
            .ok_or_else(|| DockerError::InvalidPath(context_dir.to_path_buf()))?;

        tracing::info!(tag, context, "building image");
        self.executor
            .exec_with_stdin(
                &docker(["build", "-t", tag, "-f", "-", context]),
                dockerfile.as_bytes(),
            )
            .await
            .map_err(|e| DockerError::Build {
                tag: tag.to_owned(),
                source: e,
            })
    }

    /// `docker run --rm <tag>`; returns the container's exit code.
    pub async fn run_container(&self, tag: &str) -> Result<Option<i32>, DockerError> {
        tracing::info!(tag, "starting container");
        self.executor
            .exec_foreground(&docker(["run", "--rm", tag]))
            .await
            .map_err(|e| DockerError::Run {
                tag: tag.to_owned(),
                source: e,
            })
    }

    // ── Doctor ──

    /// Run all diagnostic checks without early return.
    pub async fn doctor(&self) -> DoctorReport {
        let mut report = DoctorReport::default();

        // 1. docker CLI
        match self.executor.exec(&docker(["--version"])).await {
            Ok(v) => {
                // "Docker version 27.1.1, build 6312585"
                let version = v
                    .trim()
                    .strip_prefix("Docker version ")
                    .and_then(|rest| rest.split(',').next())
                    .unwrap_or(v.trim());
                report.docker = CheckResult::ok(version);
            }
            Err(e) => {
                report.docker = CheckResult::fail(&e.to_string());
                report.daemon = CheckResult::fail("skipped: docker CLI unavailable");
                return report;
            }
        }

        // 2. daemon reachable, running Windows containers
        match self
            .executor
            .exec(&docker(["info", "--format", "{{json .}}"]))
            .await
        {
            Ok(raw) => match serde_json::from_str::<DaemonInfo>(raw.trim()) {
                Ok(info) if info.os_type.eq_ignore_ascii_case("windows") => {
                    report.daemon =
                        CheckResult::ok(&format!("{} ({})", info.server_version, info.os_type));
                }
                Ok(info) => {
                    report.daemon = CheckResult::fail(&format!(
                        "{} daemon runs {} containers; the Windows base image needs Windows containers",
                        info.server_version, info.os_type
                    ));
                }
                Err(e) => report.daemon = CheckResult::fail(&format!("unreadable docker info: {e}")),
            },
            Err(e) => {
                tracing::debug!(error = %e, "docker info failed");
                report.daemon = CheckResult::fail("daemon not reachable");
            }
        }

        report
    }
}

fn docker<const N: usize>(a: [&str; N]) -> Cmd {
    Cmd::new("docker").args(a)
}

#[derive(Debug, Deserialize)]
struct DaemonInfo {
    #[serde(rename = "ServerVersion", default)]
    server_version: String,
    #[serde(rename = "OSType", default)]
    os_type: String,
}

// ── Doctor types ──

#[derive(Debug, Default)]
pub struct DoctorReport {
    pub docker: CheckResult,
    pub daemon: CheckResult,
    pub config_file: CheckResult,
    pub manifest: CheckResult,
    pub entry_point: CheckResult,
}

impl DoctorReport {
    pub fn all_passed(&self) -> bool {
        self.docker.passed
            && self.daemon.passed
            && self.config_file.passed
            && self.manifest.passed
            && self.entry_point.passed
    }
}

impl fmt::Display for DoctorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = [
            ("Docker CLI", &self.docker),
            ("Docker daemon", &self.daemon),
            ("pyship.toml", &self.config_file),
            ("Manifest", &self.manifest),
            ("Entry point", &self.entry_point),
        ];
        for (label, check) in rows {
            writeln!(f, "[{}] {label:<14} {}", check.icon(), check.detail)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    pub fn ok(detail: &str) -> Self {
        Self {
            passed: true,
            detail: detail.to_owned(),
        }
    }

    pub fn fail(detail: &str) -> Self {
        Self {
            passed: false,
            detail: detail.to_owned(),
        }
    }

    pub fn icon(&self) -> &'static str {
        if self.passed { "OK" } else { "NG" }
    }
}

// ── Error types ──

#[derive(Debug, thiserror::Error)]
pub enum DockerError {
    #[error("build context path is not valid UTF-8: {0}")]
    InvalidPath(std::path::PathBuf),

    #[error("failed to pull {image}")]
    Pull { image: String, source: CommandError },

    #[error("docker build failed for {tag}")]
    Build { tag: String, source: CommandError },

    #[error("failed to start container {tag}")]
    Run { tag: String, source: CommandError },
}
