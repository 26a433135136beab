//! Filesystem capability the bootstrap pipeline writes through.
//!
//! Steps never touch `std::fs` directly. They read and write through a
//! [`FileSystem`], so the same pipeline runs against a real directory
//! ([`DiskFs`]) or entirely in memory ([`MemoryFs`]) under test.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Minimal file capability set: read, write, existence, and removal.
///
/// Paths are the pipeline's own view of the environment (`/app/main.py`,
/// `C:\python-installer.exe`); implementations decide where they land.
pub trait FileSystem {
    fn read_file(&self, path: &Path) -> crate::Result<Vec<u8>>;

    /// Create or overwrite `path`, creating parent directories as needed.
    fn write_file(&mut self, path: &Path, contents: &[u8]) -> crate::Result<()>;

    fn exists(&self, path: &Path) -> bool;

    /// Remove `path`. Removing a file that does not exist is not an error.
    fn remove_file(&mut self, path: &Path) -> crate::Result<()>;

    /// Where `path` lives for processes outside this abstraction.
    fn locate(&self, path: &Path) -> PathBuf {
        path.to_path_buf()
    }
}

/// In-memory filesystem keyed by the pipeline's own paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryFs {
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored paths, in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    /// Stored paths under `dir`.
    pub fn paths_under<'a>(&'a self, dir: &'a Path) -> impl Iterator<Item = &'a Path> + 'a {
        self.paths().filter(move |p| p.starts_with(dir))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileSystem for MemoryFs {
    fn read_file(&self, path: &Path) -> crate::Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| crate::Error::NotFound(path.to_path_buf()))
    }

    fn write_file(&mut self, path: &Path, contents: &[u8]) -> crate::Result<()> {
        self.files.insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn remove_file(&mut self, path: &Path) -> crate::Result<()> {
        self.files.remove(path);
        Ok(())
    }
}

/// Filesystem rooted at a host directory.
///
/// Absolute pipeline paths are re-rooted under `root`, so `/app/main.py`
/// with root `/tmp/env` lands at `/tmp/env/app/main.py`.
#[derive(Debug, Clone)]
pub struct DiskFs {
    root: PathBuf,
}

impl DiskFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        let mut parts = Vec::new();
        for component in path.components() {
            match component {
                Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
                // clamps at the root
                Component::ParentDir => {
                    parts.pop();
                }
                Component::Normal(part) => parts.push(part),
            }
        }
        let mut resolved = self.root.clone();
        resolved.extend(parts);
        resolved
    }
}

impl FileSystem for DiskFs {
    fn read_file(&self, path: &Path) -> crate::Result<Vec<u8>> {
        let host = self.resolve(path);
        std::fs::read(&host).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => crate::Error::NotFound(path.to_path_buf()),
            _ => crate::Error::Io {
                path: host,
                source: e,
            },
        })
    }

    fn write_file(&mut self, path: &Path, contents: &[u8]) -> crate::Result<()> {
        let host = self.resolve(path);
        if let Some(parent) = host.parent() {
            std::fs::create_dir_all(parent).map_err(|e| crate::Error::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(&host, contents).map_err(|e| crate::Error::Io {
            path: host,
            source: e,
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).is_file()
    }

    fn remove_file(&mut self, path: &Path) -> crate::Result<()> {
        let host = self.resolve(path);
        match std::fs::remove_file(&host) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(crate::Error::Io {
                path: host,
                source: e,
            }),
        }
    }

    fn locate(&self, path: &Path) -> PathBuf {
        self.resolve(path)
    }
}
