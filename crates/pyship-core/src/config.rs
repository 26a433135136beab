use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

/// pyship.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PyshipConfig {
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub python: PythonConfig,
    #[serde(default)]
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Operating-system image the pipeline starts from
    #[serde(default = "default_base_image")]
    pub base_image: String,
    /// Tag for the built image (defaults to `<project-dir>:latest`)
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PythonConfig {
    /// Interpreter version to install
    #[serde(default = "default_python_version")]
    pub version: String,
    /// Installer download location. Derived from `version` when omitted.
    pub installer_url: Option<String>,
    /// Where the installer artifact lives between fetch and install
    #[serde(default = "default_installer_path")]
    pub installer_path: String,
    /// `InstallAllUsers=1`
    #[serde(default = "enabled")]
    pub install_all_users: bool,
    /// `PrependPath=1`
    #[serde(default = "enabled")]
    pub prepend_path: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Working directory every step operates against
    #[serde(default = "default_workdir")]
    pub workdir: String,
    /// Dependency manifest, relative to the build context root
    #[serde(default = "default_requirements")]
    pub requirements: String,
    /// File handed to the runtime at container start
    #[serde(default = "default_entry_point")]
    pub entry_point: String,
    /// Interpreter executable used for pip and launch
    #[serde(default = "default_runtime")]
    pub runtime: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            base_image: default_base_image(),
            tag: None,
        }
    }
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            version: default_python_version(),
            installer_url: None,
            installer_path: default_installer_path(),
            install_all_users: true,
            prepend_path: true,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workdir: default_workdir(),
            requirements: default_requirements(),
            entry_point: default_entry_point(),
            runtime: default_runtime(),
        }
    }
}

impl PythonConfig {
    /// The configured installer URL, or the python.org URL for `version`.
    pub fn resolved_installer_url(&self) -> String {
        match &self.installer_url {
            Some(url) => url.clone(),
            None => format!(
                "https://www.python.org/ftp/python/{v}/python-{v}-amd64.exe",
                v = self.version
            ),
        }
    }
}

impl ImageConfig {
    /// The configured tag, or `<project-dir>:latest`.
    pub fn resolved_tag(&self, project_dir: &Path) -> String {
        if let Some(tag) = &self.tag {
            return tag.clone();
        }
        let name = project_dir
            .canonicalize()
            // arch-lint: allow(no-silent-result-drop) reason="an unresolvable dir falls back to the default tag"
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_lowercase()))
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "pyship-app".to_owned());
        format!("{name}:latest")
    }
}

impl PyshipConfig {
    /// Load from pyship.toml at the given path, or return defaults if not found.
    pub fn load(project_dir: &Path) -> crate::Result<Self> {
        let config_path = project_dir.join("pyship.toml");
        let config: Self = if config_path.exists() {
            let content =
                std::fs::read_to_string(&config_path).map_err(|e| crate::Error::ConfigLoad {
                    path: config_path.clone(),
                    source: e,
                })?;
            toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
                path: config_path,
                source: e,
            })?
        } else {
            tracing::debug!(dir = %project_dir.display(), "no pyship.toml; using defaults");
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot act on.
    pub fn validate(&self) -> crate::Result<()> {
        if self.image.base_image.trim().is_empty() {
            return Err(invalid("image.base_image", &self.image.base_image, "must not be empty"));
        }
        if self.python.version.trim().is_empty() {
            return Err(invalid("python.version", &self.python.version, "must not be empty"));
        }
        if self.python.installer_path.trim().is_empty() {
            return Err(invalid(
                "python.installer_path",
                &self.python.installer_path,
                "must not be empty",
            ));
        }
        if !self.app.workdir.starts_with('/') {
            return Err(invalid("app.workdir", &self.app.workdir, "must be absolute"));
        }
        validate_relative("app.requirements", &self.app.requirements)?;
        validate_relative("app.entry_point", &self.app.entry_point)?;
        if self.app.runtime.trim().is_empty() {
            return Err(invalid("app.runtime", &self.app.runtime, "must not be empty"));
        }
        Ok(())
    }
}

fn validate_relative(field: &'static str, value: &str) -> crate::Result<()> {
    if value.is_empty() {
        return Err(invalid(field, value, "must not be empty"));
    }
    let path = Path::new(value);
    if path.is_absolute() || value.starts_with('/') {
        return Err(invalid(field, value, "must be relative to the build context"));
    }
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(invalid(field, value, "must not contain '..'"));
    }
    Ok(())
}

fn invalid(field: &'static str, value: &str, reason: &'static str) -> crate::Error {
    crate::Error::InvalidConfig {
        field,
        value: value.to_owned(),
        reason,
    }
}

fn default_base_image() -> String {
    "mcr.microsoft.com/windows/servercore:ltsc2022".to_owned()
}

fn default_python_version() -> String {
    "3.11.9".to_owned()
}

fn default_installer_path() -> String {
    "C:\\python-installer.exe".to_owned()
}

fn default_workdir() -> String {
    "/app".to_owned()
}

fn default_requirements() -> String {
    "requirements.txt".to_owned()
}

fn default_entry_point() -> String {
    "app_princ.py".to_owned()
}

fn default_runtime() -> String {
    "python".to_owned()
}

fn enabled() -> bool {
    true
}
