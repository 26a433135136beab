use pyship_core::PyshipConfig;
use pyship_runtime::DockerClient;
use std::path::PathBuf;

/// Build the image from the project directory.
pub async fn build(tag: Option<String>) -> anyhow::Result<()> {
    let project_dir = PathBuf::from(".");
    let config = PyshipConfig::load(&project_dir)?;
    let tag = tag.unwrap_or_else(|| config.image.resolved_tag(&project_dir));

    if !project_dir.join(&config.app.requirements).exists() {
        anyhow::bail!(
            "{} not found. Create it (it may be empty) or set [app].requirements in pyship.toml.",
            config.app.requirements
        );
    }

    let dockerfile = super::resolve_dockerfile(&project_dir, &config)?;
    let client = DockerClient::new();

    println!("Ensuring base image {}...", config.image.base_image);
    client.ensure_image(&config.image.base_image).await?;

    println!("Building {tag}...");
    client.build_image(&project_dir, &tag, &dockerfile).await?;

    println!();
    println!("Built: {tag}");
    println!("Start it with: pyship run --tag {tag}");
    Ok(())
}
