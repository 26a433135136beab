use pyship_core::PyshipConfig;
use pyship_runtime::DockerClient;
use std::path::PathBuf;

/// Run the built image and exit with the application's status.
pub async fn run(tag: Option<String>) -> anyhow::Result<()> {
    let project_dir = PathBuf::from(".");
    let config = PyshipConfig::load(&project_dir)?;
    let tag = tag.unwrap_or_else(|| config.image.resolved_tag(&project_dir));

    let client = DockerClient::new();
    if !client.image_exists(&tag).await {
        anyhow::bail!("image {tag} not found. Run `pyship build` first.");
    }

    let code = client.run_container(&tag).await?;
    super::propagate_exit(code);
    Ok(())
}
