use std::path::PathBuf;

use pyship_build::{Phase, Pipeline};
use pyship_core::PyshipConfig;

/// Print each step with the state it requires and reaches.
pub async fn plan() -> anyhow::Result<()> {
    let config = PyshipConfig::load(&PathBuf::from("."))?;
    let pipeline = Pipeline::from_config(&config);

    println!("Working directory: {}", pipeline.workdir().display());
    println!();
    for (i, step) in pipeline.steps().iter().enumerate() {
        let phase = match step.phase() {
            Phase::Build => "build",
            Phase::Start => "start",
        };
        println!(
            "  {n}. {name:<22} {from} -> {to}  [{phase}]",
            n = i + 1,
            name = step.name(),
            from = step.requires(),
            to = step.reaches(),
        );
    }
    Ok(())
}

/// Print the Dockerfile `build` would use.
pub async fn dockerfile() -> anyhow::Result<()> {
    let project_dir = PathBuf::from(".");
    let config = PyshipConfig::load(&project_dir)?;
    print!("{}", super::resolve_dockerfile(&project_dir, &config)?);
    Ok(())
}
