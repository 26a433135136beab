use pyship_build::Pipeline;
use pyship_core::PyshipConfig;
use std::path::PathBuf;

pub async fn eject() -> anyhow::Result<()> {
    let project_dir = PathBuf::from(".");
    let config = PyshipConfig::load(&project_dir)?;
    let pipeline = Pipeline::from_config(&config);

    let path = pyship_build::eject::eject(&project_dir, &pipeline)?;

    println!("Ejected {} steps to {}", pipeline.steps().len(), path.display());
    println!("You can now edit it directly. pyship build will use this file.");
    Ok(())
}
