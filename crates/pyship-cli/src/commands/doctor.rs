use pyship_core::PyshipConfig;
use pyship_runtime::{CheckResult, DockerClient};
use std::path::Path;

pub async fn doctor() -> anyhow::Result<()> {
    let project_dir = Path::new(".");
    let client = DockerClient::new();
    let mut report = client.doctor().await;

    // Config checks. Missing pyship.toml is fine; defaults apply.
    let config = match PyshipConfig::load(project_dir) {
        Ok(config) => {
            report.config_file = if project_dir.join("pyship.toml").exists() {
                CheckResult::ok("Found")
            } else {
                CheckResult::ok("Not found (using defaults)")
            };
            Some(config)
        }
        Err(e) => {
            report.config_file = CheckResult::fail(&e.to_string());
            None
        }
    };

    if let Some(config) = &config {
        report.manifest = file_check(project_dir, &config.app.requirements);
        report.entry_point = file_check(project_dir, &config.app.entry_point);
    } else {
        report.manifest = CheckResult::fail("skipped: invalid pyship.toml");
        report.entry_point = CheckResult::fail("skipped: invalid pyship.toml");
    }

    println!();
    println!("{report}");

    if !report.all_passed() {
        anyhow::bail!("some checks failed, see above for details");
    }

    Ok(())
}

fn file_check(project_dir: &Path, rel: &str) -> CheckResult {
    if project_dir.join(rel).is_file() {
        CheckResult::ok(rel)
    } else {
        CheckResult::fail(&format!("{rel} not found"))
    }
}
