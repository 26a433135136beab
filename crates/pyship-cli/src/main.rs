mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "pyship",
    about = "Build and launch Python apps on a Windows container base"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write pyship.toml and a requirements.txt stub
    Init,
    /// Show the bootstrap steps and the state each one reaches
    Plan,
    /// Print the Dockerfile that `build` would use
    Dockerfile,
    /// Eject Dockerfile for manual customization
    Eject,
    /// Build the container image with docker
    Build {
        /// Image tag (default: [image].tag or <dir>:latest)
        #[arg(long, short = 't')]
        tag: Option<String>,
    },
    /// Run the built image in the foreground
    Run {
        /// Image tag (default: [image].tag or <dir>:latest)
        #[arg(long, short = 't')]
        tag: Option<String>,
    },
    /// Run the bootstrap pipeline directly on this machine
    Bootstrap {
        /// Directory that stands in for the container filesystem
        #[arg(long)]
        root: Option<PathBuf>,
        /// Stop once the sources are staged
        #[arg(long)]
        no_launch: bool,
    },
    /// Check docker setup and project readiness
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => commands::init_project().await?,
        Commands::Plan => commands::plan().await?,
        Commands::Dockerfile => commands::dockerfile().await?,
        Commands::Eject => commands::eject().await?,
        Commands::Build { tag } => commands::build(tag).await?,
        Commands::Run { tag } => commands::run(tag).await?,
        Commands::Bootstrap { root, no_launch } => commands::bootstrap(root, no_launch).await?,
        Commands::Doctor => commands::doctor().await?,
    }

    Ok(())
}
