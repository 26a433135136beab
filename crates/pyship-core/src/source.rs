use std::path::{Path, PathBuf};

/// A file from the build context: path relative to the context root plus its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

/// Snapshot of the build context.
///
/// Every regular file under the context root is included; there is no
/// ignore-file or exclusion logic. Files are kept sorted by path so that
/// two snapshots of the same tree compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceTree {
    files: Vec<SourceFile>,
}

impl SourceTree {
    /// Build a tree from in-memory files. Later duplicates replace earlier ones.
    pub fn from_files<I, P, C>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<PathBuf>,
        C: Into<Vec<u8>>,
    {
        let mut tree = Self::default();
        for (path, contents) in files {
            tree.insert(path.into(), contents.into());
        }
        tree
    }

    /// Read every file under `root`.
    pub fn from_dir(root: &Path) -> crate::Result<Self> {
        let mut tree = Self::default();
        let mut pending = vec![root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let entries = std::fs::read_dir(&dir).map_err(|e| crate::Error::ContextRead {
                path: dir.clone(),
                source: e,
            })?;
            for entry in entries {
                let entry = entry.map_err(|e| crate::Error::ContextRead {
                    path: dir.clone(),
                    source: e,
                })?;
                let path = entry.path();
                let file_type = entry.file_type().map_err(|e| crate::Error::ContextRead {
                    path: path.clone(),
                    source: e,
                })?;

                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() {
                    let contents =
                        std::fs::read(&path).map_err(|e| crate::Error::ContextRead {
                            path: path.clone(),
                            source: e,
                        })?;
                    let relative = path
                        .strip_prefix(root)
                        .map_err(|e| crate::Error::OutsideContext {
                            path: path.clone(),
                            root: root.to_path_buf(),
                            source: e,
                        })?
                        .to_path_buf();
                    tree.insert(relative, contents);
                }
            }
        }

        tracing::debug!(
            root = %root.display(),
            files = tree.len(),
            "build context snapshot taken"
        );
        Ok(tree)
    }

    fn insert(&mut self, path: PathBuf, contents: Vec<u8>) {
        match self.files.binary_search_by(|f| f.path.cmp(&path)) {
            Ok(idx) => self.files[idx].contents = contents,
            Err(idx) => self.files.insert(idx, SourceFile { path, contents }),
        }
    }

    pub fn get(&self, path: &Path) -> Option<&SourceFile> {
        match self.files.binary_search_by(|f| f.path.as_path().cmp(path)) {
            Ok(idx) => Some(&self.files[idx]),
            Err(_) => None,
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.get(path).is_some()
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn from_files_sorts_and_dedups() {
        let tree = SourceTree::from_files([
            ("b.py", "b"),
            ("a.py", "a1"),
            ("a.py", "a2"),
        ]);
        let paths: Vec<_> = tree.files().iter().map(|f| f.path.clone()).collect();
        assert_eq!(paths, [PathBuf::from("a.py"), PathBuf::from("b.py")]);
        assert_eq!(tree.get(Path::new("a.py")).unwrap().contents, b"a2");
    }

    #[test]
    fn from_dir_includes_nested_and_hidden_files() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("ui")).unwrap();
        std::fs::write(tmp.path().join("app_princ.py"), "main").unwrap();
        std::fs::write(tmp.path().join("ui/login_window.py"), "ui").unwrap();
        std::fs::write(tmp.path().join(".env"), "X=1").unwrap();

        let tree = SourceTree::from_dir(tmp.path()).unwrap();

        assert_eq!(tree.len(), 3);
        assert!(tree.contains(Path::new("app_princ.py")));
        assert!(tree.contains(&PathBuf::from("ui").join("login_window.py")));
        assert!(tree.contains(Path::new(".env")));
    }

    #[test]
    fn from_dir_missing_root_errors() {
        let tmp = TempDir::new().unwrap();
        let err = SourceTree::from_dir(&tmp.path().join("absent")).unwrap_err();
        assert!(matches!(err, crate::Error::ContextRead { .. }));
    }
}
