use pyship_build::DockerfileGenerator;
use pyship_build::Pipeline;
use pyship_build::eject::{EjectError, EjectedDockerfile, eject, ejected_path};
use pyship_core::{AppConfig, ImageConfig, PyshipConfig, PythonConfig};
use tempfile::TempDir;

fn render(config: &PyshipConfig) -> String {
    let pipeline = Pipeline::from_config(config);
    DockerfileGenerator::new(&pipeline).render()
}

/// Index of the first line starting with `prefix`.
fn line_of(output: &str, prefix: &str) -> usize {
    output
        .lines()
        .position(|l| l.starts_with(prefix))
        .unwrap_or_else(|| panic!("no line starting with {prefix:?} in:\n{output}"))
}

// ── Dockerfile Generation Tests ──

#[test]
fn dockerfile_has_one_section_per_step() {
    let output = render(&PyshipConfig::default());

    assert!(output.contains("# === 1: base ==="));
    assert!(output.contains("# === 2: install-interpreter ==="));
    assert!(output.contains("# === 3: stage-manifest ==="));
    assert!(output.contains("# === 4: install-dependencies ==="));
    assert!(output.contains("# === 5: materialize-sources ==="));
    assert!(output.contains("# === 6: launch ==="));
}

#[test]
fn dockerfile_preserves_layer_order() {
    let output = render(&PyshipConfig::default());

    let from = line_of(&output, "FROM ");
    let install = line_of(&output, "RUN try {");
    let workdir = line_of(&output, "WORKDIR /app");
    let manifest = line_of(&output, "COPY requirements.txt requirements.txt");
    let pip = line_of(&output, "RUN python -m pip install");
    let sources = line_of(&output, "COPY . .");
    let cmd = line_of(&output, "CMD ");

    assert!(from < install);
    assert!(install < workdir);
    assert!(workdir < manifest);
    assert!(manifest < pip);
    assert!(pip < sources);
    assert!(sources < cmd);
}

#[test]
fn dockerfile_uses_configured_base_image() {
    let config = PyshipConfig {
        image: ImageConfig {
            base_image: "mcr.microsoft.com/windows/server:ltsc2022".to_owned(),
            tag: None,
        },
        ..Default::default()
    };
    let output = render(&config);

    assert!(output.starts_with("# === 1: base ===\nFROM mcr.microsoft.com/windows/server:ltsc2022\n"));
    assert!(output.contains("SHELL [\"powershell\""));
}

#[test]
fn dockerfile_installs_silently_with_both_options() {
    let output = render(&PyshipConfig::default());

    assert!(output.contains(
        "Invoke-WebRequest -Uri 'https://www.python.org/ftp/python/3.11.9/python-3.11.9-amd64.exe'"
    ));
    assert!(output.contains("-ArgumentList '/quiet InstallAllUsers=1 PrependPath=1'"));
}

#[test]
fn dockerfile_removes_installer_in_finally_block() {
    let output = render(&PyshipConfig::default());

    let finally = output.find("} finally {").expect("finally block");
    let remove = output
        .find("Remove-Item -Force -ErrorAction SilentlyContinue 'C:\\python-installer.exe'")
        .expect("cleanup");
    assert!(finally < remove);
    assert!(output.contains("if ($p.ExitCode -ne 0) { exit $p.ExitCode }"));
}

#[test]
fn dockerfile_honours_custom_installer_url_and_options() {
    let config = PyshipConfig {
        python: PythonConfig {
            version: "3.12.4".to_owned(),
            installer_url: Some("https://mirror.example/py's.exe".to_owned()),
            install_all_users: false,
            ..Default::default()
        },
        ..Default::default()
    };
    let output = render(&config);

    assert!(output.contains("-Uri 'https://mirror.example/py''s.exe'"));
    assert!(output.contains("InstallAllUsers=0 PrependPath=1"));
}

#[test]
fn dockerfile_pip_install_disables_cache() {
    let output = render(&PyshipConfig::default());

    assert!(output.contains("RUN python -m pip install --no-cache-dir -r requirements.txt\n"));
}

#[test]
fn dockerfile_uses_custom_app_layout() {
    let config = PyshipConfig {
        app: AppConfig {
            workdir: "/srv/social".to_owned(),
            requirements: "deps/requirements.txt".to_owned(),
            entry_point: "app/main.py".to_owned(),
            runtime: "py".to_owned(),
        },
        ..Default::default()
    };
    let output = render(&config);

    assert!(output.contains("WORKDIR /srv/social\n"));
    assert!(output.contains("COPY deps/requirements.txt deps/requirements.txt\n"));
    assert!(output.contains("RUN py -m pip install --no-cache-dir -r deps/requirements.txt\n"));
    assert!(output.contains("CMD [\"py\", \"app/main.py\"]\n"));
}

#[test]
fn dockerfile_cmd_is_runtime_and_entry_point() {
    let output = render(&PyshipConfig::default());

    assert!(output.ends_with("CMD [\"python\", \"app_princ.py\"]\n"));
}

// ── Eject Tests ──

#[test]
fn eject_writes_plan_header_and_rendered_dockerfile() {
    let tmp = TempDir::new().unwrap();
    let pipeline = Pipeline::from_config(&PyshipConfig::default());

    let path = eject(tmp.path(), &pipeline).unwrap();

    assert_eq!(path, tmp.path().join(".pyship/Dockerfile"));
    let ejected = EjectedDockerfile::load(tmp.path()).unwrap().unwrap();
    let (header, body) = ejected.content.split_once('\n').unwrap();
    assert!(header.starts_with("# pyship-plan: workdir=/app; base="));
    assert!(header.contains("launch=python app_princ.py"));
    assert_eq!(body, DockerfileGenerator::new(&pipeline).render());
    assert!(!ejected.is_stale(&pipeline));
}

#[test]
fn eject_twice_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let pipeline = Pipeline::from_config(&PyshipConfig::default());
    eject(tmp.path(), &pipeline).unwrap();
    std::fs::write(ejected_path(tmp.path()), "FROM edited\n").unwrap();

    let err = eject(tmp.path(), &pipeline).unwrap_err();

    assert!(matches!(err, EjectError::AlreadyEjected(_)));
    let kept = EjectedDockerfile::load(tmp.path()).unwrap().unwrap();
    assert_eq!(kept.content, "FROM edited\n");
}

#[test]
fn ejected_file_goes_stale_when_config_changes() {
    let tmp = TempDir::new().unwrap();
    eject(tmp.path(), &Pipeline::from_config(&PyshipConfig::default())).unwrap();

    let changed = PyshipConfig {
        python: PythonConfig {
            version: "3.12.4".to_owned(),
            ..Default::default()
        },
        ..Default::default()
    };
    let ejected = EjectedDockerfile::load(tmp.path()).unwrap().unwrap();

    assert!(ejected.is_stale(&Pipeline::from_config(&changed)));
}

#[test]
fn hand_written_dockerfile_without_plan_is_never_stale() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir(tmp.path().join(".pyship")).unwrap();
    std::fs::write(ejected_path(tmp.path()), "FROM custom\n").unwrap();

    let ejected = EjectedDockerfile::load(tmp.path()).unwrap().unwrap();

    assert!(ejected.plan().is_none());
    assert!(!ejected.is_stale(&Pipeline::from_config(&PyshipConfig::default())));
}

#[test]
fn not_ejected_by_default() {
    let tmp = TempDir::new().unwrap();

    assert!(EjectedDockerfile::load(tmp.path()).unwrap().is_none());
}
