use std::path::Path;

const PYSHIP_TOML: &str = r#"[image]
# base_image = "mcr.microsoft.com/windows/servercore:ltsc2022"
# tag = "my-app:latest"

[python]
# version = "3.11.9"
# installer_url = "https://www.python.org/ftp/python/3.11.9/python-3.11.9-amd64.exe"
# install_all_users = true
# prepend_path = true

[app]
# workdir = "/app"
# requirements = "requirements.txt"
# entry_point = "app_princ.py"
"#;

const REQUIREMENTS_TXT: &str = "# One package per line, e.g.\n# requests==2.32.3\n";

/// Initialize pyship in the current directory.
pub async fn init_project() -> anyhow::Result<()> {
    let mut created = Vec::new();

    for (name, content) in [
        ("pyship.toml", PYSHIP_TOML),
        ("requirements.txt", REQUIREMENTS_TXT),
    ] {
        let path = Path::new(name);
        if path.exists() {
            eprintln!("{name} already exists, skipping");
        } else {
            std::fs::write(path, content)?;
            created.push(name);
        }
    }

    if created.is_empty() {
        println!("Nothing to create, already initialized.");
    } else {
        for f in &created {
            println!("Created {f}");
        }
    }

    if !Path::new("app_princ.py").exists() {
        println!();
        println!("Note: app_princ.py not found. Create it, or set [app].entry_point.");
    }

    println!();
    println!("Next steps:");
    println!("  pyship plan     # review the bootstrap steps");
    println!("  pyship build    # build the image");
    println!("  pyship run      # start the app");

    Ok(())
}
