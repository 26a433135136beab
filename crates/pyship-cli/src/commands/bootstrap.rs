use std::path::{Component, Path, PathBuf};

use pyship_build::{Pipeline, PipelineError, Stage};
use pyship_core::{DiskFs, PyshipConfig, SourceTree};
use pyship_runtime::HostToolchain;

/// Execute the pipeline on this machine against a directory standing in for
/// the container filesystem.
pub async fn bootstrap(root: Option<PathBuf>, no_launch: bool) -> anyhow::Result<()> {
    let project_dir = PathBuf::from(".");
    let config = PyshipConfig::load(&project_dir)?;

    let root = root.unwrap_or_else(|| std::env::temp_dir().join("pyship-root"));
    ensure_outside(&root, &project_dir)?;
    std::fs::create_dir_all(&root)?;

    // Read the context before anything is written under the root.
    let source = SourceTree::from_dir(&project_dir)?;
    tracing::info!(files = source.len(), root = %root.display(), "bootstrapping");

    let pipeline = Pipeline::from_config(&config);
    let mut ctx = pipeline.context(DiskFs::new(&root));
    let tools = HostToolchain::new();

    let result = if no_launch {
        pipeline.build(&mut ctx, &source, &tools).await
    } else {
        pipeline.run(&mut ctx, &source, &tools).await
    };

    let report = match result {
        Ok(report) => report,
        Err(failure) => {
            eprintln!("Reached: {}", failure.halted_at);
            // The app ran and exited badly: surface its status, not ours.
            if let (PipelineError::LaunchFailure { .. }, Some(outcome)) =
                (&failure.error, ctx.launch_outcome())
            {
                eprintln!("{failure}");
                super::propagate_exit(outcome.exit_code);
            }
            return Err(failure.into());
        }
    };

    println!("Reached: {}", report.reached);
    if report.reached == Stage::SourceStaged {
        println!(
            "Application staged under {}",
            root.join(pipeline.workdir().strip_prefix("/")?).display()
        );
    }
    Ok(())
}

/// Reject a root inside the build context. `root` may not exist yet.
fn ensure_outside(root: &Path, project_dir: &Path) -> anyhow::Result<()> {
    let root = resolve_lenient(root)?;
    let project = project_dir.canonicalize()?;
    if root.starts_with(&project) {
        anyhow::bail!(
            "--root {} is inside the build context; choose a directory outside {}",
            root.display(),
            project.display()
        );
    }
    Ok(())
}

/// Canonicalize the longest existing prefix and append the rest.
fn resolve_lenient(path: &Path) -> anyhow::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    for existing in absolute.ancestors() {
        if !existing.exists() {
            continue;
        }
        let missing = absolute.strip_prefix(existing)?;
        if missing.components().any(|c| matches!(c, Component::ParentDir)) {
            anyhow::bail!("--root {} must not use '..' below a missing directory", path.display());
        }
        return Ok(existing.canonicalize()?.join(missing));
    }
    Ok(absolute)
}
