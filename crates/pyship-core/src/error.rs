use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid {field} {value:?}: {reason}")]
    InvalidConfig {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    // ── Manifest ──
    #[error("failed to read manifest at {path}")]
    ManifestRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("manifest is not valid UTF-8")]
    ManifestEncoding { source: std::str::Utf8Error },

    // ── Build context ──
    #[error("failed to read build context at {path}")]
    ContextRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("path {path} is outside the build context {root}")]
    OutsideContext {
        path: PathBuf,
        root: PathBuf,
        source: std::path::StripPrefixError,
    },

    // ── Filesystem capability ──
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("i/o error on {path}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
