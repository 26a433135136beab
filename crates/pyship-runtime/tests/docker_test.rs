use mockall::mock;
use pyship_runtime::command::{Cmd, CommandError};
use pyship_runtime::docker::{DockerClient, DockerError};
use pyship_runtime::executor::CommandExecutor;
use std::path::Path;

mock! {
    Executor {}

    impl CommandExecutor for Executor {
        async fn exec(&self, cmd: &Cmd) -> Result<String, CommandError>;
        async fn exec_streaming(&self, cmd: &Cmd) -> Result<(), CommandError>;
        async fn exec_with_stdin(&self, cmd: &Cmd, stdin_data: &[u8]) -> Result<(), CommandError>;
        async fn exec_foreground(&self, cmd: &Cmd) -> Result<Option<i32>, CommandError>;
    }
}

fn failed(stderr: &str) -> CommandError {
    CommandError::CommandFailed {
        program: "docker".to_owned(),
        args: vec![],
        stderr: stderr.to_owned(),
    }
}

// ── Build Tests ──

#[tokio::test]
async fn build_pipes_dockerfile_on_stdin() {
    let mut mock = MockExecutor::new();

    mock.expect_exec_with_stdin()
        .withf(|cmd, stdin| {
            cmd.program == "docker"
                && cmd.args == ["build", "-t", "social:latest", "-f", "-", "/work/social"]
                && stdin.starts_with(b"# === 1: base ===")
        })
        .times(1)
        .returning(|_, _| Ok(()));

    let client = DockerClient::with_executor(mock);
    client
        .build_image(
            Path::new("/work/social"),
            "social:latest",
            "# === 1: base ===\nFROM x\n",
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn build_failure_carries_tag() {
    let mut mock = MockExecutor::new();
    mock.expect_exec_with_stdin()
        .returning(|_, _| Err(failed("exit code: 1")));

    let client = DockerClient::with_executor(mock);
    let err = client
        .build_image(Path::new("."), "social:latest", "FROM x\n")
        .await
        .unwrap_err();

    assert!(matches!(err, DockerError::Build { ref tag, .. } if tag == "social:latest"));
}

// ── Image Tests ──

#[tokio::test]
async fn ensure_image_skips_pull_when_present() {
    let mut mock = MockExecutor::new();
    mock.expect_exec()
        .withf(|cmd| cmd.has_arg("inspect"))
        .returning(|_| Ok("sha256:abc\n".to_owned()));
    mock.expect_exec_streaming().never();

    let client = DockerClient::with_executor(mock);
    client
        .ensure_image("mcr.microsoft.com/windows/servercore:ltsc2022")
        .await
        .unwrap();
}

#[tokio::test]
async fn ensure_image_pulls_when_missing() {
    let mut mock = MockExecutor::new();
    mock.expect_exec()
        .withf(|cmd| cmd.has_arg("inspect"))
        .returning(|_| Err(failed("No such image")));
    mock.expect_exec_streaming()
        .withf(|cmd| cmd.args == ["pull", "base:1"])
        .times(1)
        .returning(|_| Ok(()));

    let client = DockerClient::with_executor(mock);
    client.ensure_image("base:1").await.unwrap();
}

#[tokio::test]
async fn ensure_image_pull_failure_is_reported() {
    let mut mock = MockExecutor::new();
    mock.expect_exec()
        .returning(|_| Err(failed("No such image")));
    mock.expect_exec_streaming()
        .returning(|_| Err(failed("manifest unknown")));

    let client = DockerClient::with_executor(mock);
    let err = client.ensure_image("base:1").await.unwrap_err();

    assert!(matches!(err, DockerError::Pull { ref image, .. } if image == "base:1"));
}

// ── Run Tests ──

#[tokio::test]
async fn run_propagates_container_exit_code() {
    let mut mock = MockExecutor::new();
    mock.expect_exec_foreground()
        .withf(|cmd| cmd.args == ["run", "--rm", "social:latest"])
        .returning(|_| Ok(Some(2)));

    let client = DockerClient::with_executor(mock);
    let code = client.run_container("social:latest").await.unwrap();

    assert_eq!(code, Some(2));
}

#[tokio::test]
async fn run_without_docker_is_an_error() {
    let mut mock = MockExecutor::new();
    mock.expect_exec_foreground().returning(|_| {
        Err(CommandError::NotFound {
            program: "docker".to_owned(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        })
    });

    let client = DockerClient::with_executor(mock);
    let err = client.run_container("social:latest").await.unwrap_err();

    assert!(matches!(err, DockerError::Run { .. }));
}

// ── Doctor Tests ──

#[tokio::test]
async fn doctor_reports_windows_daemon() {
    let mut mock = MockExecutor::new();
    mock.expect_exec()
        .withf(|cmd| cmd.has_arg("--version"))
        .returning(|_| Ok("Docker version 27.1.1, build 6312585\n".to_owned()));
    mock.expect_exec()
        .withf(|cmd| cmd.has_arg("info"))
        .returning(|_| Ok(r#"{"ServerVersion":"27.1.1","OSType":"windows"}"#.to_owned()));

    let client = DockerClient::with_executor(mock);
    let report = client.doctor().await;

    assert!(report.docker.passed);
    assert_eq!(report.docker.detail, "27.1.1");
    assert!(report.daemon.passed);
    assert_eq!(report.daemon.detail, "27.1.1 (windows)");
}

#[tokio::test]
async fn doctor_flags_linux_daemon() {
    let mut mock = MockExecutor::new();
    mock.expect_exec()
        .withf(|cmd| cmd.has_arg("--version"))
        .returning(|_| Ok("Docker version 27.1.1, build 6312585\n".to_owned()));
    mock.expect_exec()
        .withf(|cmd| cmd.has_arg("info"))
        .returning(|_| Ok(r#"{"ServerVersion":"27.1.1","OSType":"linux"}"#.to_owned()));

    let client = DockerClient::with_executor(mock);
    let report = client.doctor().await;

    assert!(!report.daemon.passed);
    assert!(report.daemon.detail.contains("Windows containers"));
    assert!(!report.all_passed());
}

#[tokio::test]
async fn doctor_without_cli_skips_daemon_check() {
    let mut mock = MockExecutor::new();
    mock.expect_exec()
        .withf(|cmd| cmd.has_arg("--version"))
        .times(1)
        .returning(|_| {
            Err(CommandError::NotFound {
                program: "docker".to_owned(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            })
        });

    let client = DockerClient::with_executor(mock);
    let report = client.doctor().await;

    assert!(!report.docker.passed);
    assert!(!report.daemon.passed);
    assert!(report.daemon.detail.contains("skipped"));
}

#[tokio::test]
async fn doctor_report_renders_one_row_per_check() {
    let mut mock = MockExecutor::new();
    mock.expect_exec()
        .withf(|cmd| cmd.has_arg("--version"))
        .returning(|_| Ok("Docker version 27.1.1, build 6312585\n".to_owned()));
    mock.expect_exec()
        .withf(|cmd| cmd.has_arg("info"))
        .returning(|_| Err(failed("Cannot connect to the Docker daemon")));

    let client = DockerClient::with_executor(mock);
    let rendered = client.doctor().await.to_string();

    assert_eq!(rendered.lines().count(), 5);
    assert!(rendered.contains("[OK] Docker CLI"));
    assert!(rendered.contains("[NG] Docker daemon"));
}
