//! Dependency manifest (`requirements.txt`).
//!
//! The manifest is an ordered list of requirement lines. pyship does not
//! interpret version specifiers; it only splits each named line into the
//! package name and whatever constraint text follows it, which is enough to
//! report what is being installed. Lines without a package name (local
//! paths, archives, URLs) are kept verbatim. pip decides what they mean.

use std::fmt;
use std::path::Path;

/// One requirement line: a package name and its raw version constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: String,
    /// Everything after the name (`>=4.6`, `[extra]==1.0`, `; sys_platform == "win32"`).
    /// Empty when unconstrained.
    pub constraint: String,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.constraint)
    }
}

/// Ordered dependency manifest, read once and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    requirements: Vec<Requirement>,
    /// Unnamed lines such as `.`, `./vendor/lib` or `C:\wheels\x.whl`
    references: Vec<String>,
}

impl Manifest {
    pub fn parse(content: &str) -> Self {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut manifest = Self::default();
        for raw in content.lines() {
            let line = strip_comment(raw).trim();
            if line.is_empty() {
                continue;
            }
            // pip options (-r, --index-url, ...) pass through to pip untouched
            if line.starts_with('-') {
                continue;
            }
            match split_requirement(line) {
                Some(requirement) => manifest.requirements.push(requirement),
                None => manifest.references.push(line.to_owned()),
            }
        }
        manifest
    }

    pub fn from_bytes(bytes: &[u8]) -> crate::Result<Self> {
        let content =
            std::str::from_utf8(bytes).map_err(|e| crate::Error::ManifestEncoding { source: e })?;
        Ok(Self::parse(content))
    }

    pub fn load(path: &Path) -> crate::Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| crate::Error::ManifestRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Lines pip resolves without a package name.
    pub fn references(&self) -> &[String] {
        &self.references
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.requirements.iter().map(|r| r.name.as_str())
    }

    /// Named requirements plus references.
    pub fn len(&self) -> usize {
        self.requirements.len() + self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty() && self.references.is_empty()
    }
}

fn strip_comment(line: &str) -> &str {
    // `#` only starts a comment at line start or after whitespace
    let bytes = line.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'#' && (i == 0 || bytes[i - 1].is_ascii_whitespace()) {
            return &line[..i];
        }
    }
    line
}

/// `None` when the line does not begin with a package name.
fn split_requirement(line: &str) -> Option<Requirement> {
    if !line.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return None;
    }
    let end = line
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        .unwrap_or(line.len());
    let rest = &line[end..];

    // `https://...`, `C:\wheels\x.whl`, `vendor/lib`
    if rest.starts_with([':', '/', '\\']) {
        return None;
    }

    Some(Requirement {
        name: line[..end].to_owned(),
        constraint: rest.trim().to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_constraints_in_order() {
        let m = Manifest::parse("pymongo>=4.6\nPillow==10.3.0\nbcrypt\n");
        let names: Vec<_> = m.names().collect();
        assert_eq!(names, ["pymongo", "Pillow", "bcrypt"]);
        assert_eq!(m.requirements()[0].constraint, ">=4.6");
        assert_eq!(m.requirements()[2].constraint, "");
    }

    #[test]
    fn skips_comments_blank_lines_and_options() {
        let m = Manifest::parse(
            "# core deps\n\n--index-url https://pypi.org/simple\npymongo  # driver\n",
        );
        assert_eq!(m.len(), 1);
        assert_eq!(m.requirements()[0].to_string(), "pymongo");
    }

    #[test]
    fn keeps_markers_and_extras_as_constraint() {
        let m = Manifest::parse("requests[socks]>=2 ; python_version > \"3.8\"");
        let r = &m.requirements()[0];
        assert_eq!(r.name, "requests");
        assert_eq!(r.constraint, "[socks]>=2 ; python_version > \"3.8\"");
    }

    #[test]
    fn keeps_unnamed_lines_as_references() {
        let m = Manifest::parse(
            ".\n./vendor/mylib\n/wheels/x.whl\nC:\\wheels\\y.whl\nhttps://example.com/z.tar.gz\nvendor/lib\npymongo\n",
        );
        assert_eq!(m.names().collect::<Vec<_>>(), ["pymongo"]);
        assert_eq!(
            m.references(),
            [
                ".",
                "./vendor/mylib",
                "/wheels/x.whl",
                "C:\\wheels\\y.whl",
                "https://example.com/z.tar.gz",
                "vendor/lib",
            ]
        );
        assert_eq!(m.len(), 7);
    }

    #[test]
    fn strips_byte_order_mark() {
        let m = Manifest::from_bytes("\u{feff}pymongo>=4.6\r\nbcrypt\r\n".as_bytes()).unwrap();
        assert_eq!(m.names().collect::<Vec<_>>(), ["pymongo", "bcrypt"]);
        assert_eq!(m.requirements()[0].constraint, ">=4.6");
    }

    #[test]
    fn direct_reference_keeps_name() {
        let m = Manifest::parse("mylib @ https://example.com/mylib-1.0.whl");
        assert_eq!(m.names().collect::<Vec<_>>(), ["mylib"]);
        assert_eq!(m.requirements()[0].constraint, "@ https://example.com/mylib-1.0.whl");
    }

    #[test]
    fn rejects_invalid_utf8() {
        assert!(matches!(
            Manifest::from_bytes(&[0xff, 0xfe, b'p']),
            Err(crate::Error::ManifestEncoding { .. })
        ));
    }

    #[test]
    fn empty_manifest_is_valid() {
        assert!(Manifest::parse("").is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn package_name() -> impl Strategy<Value = String> {
            "[a-zA-Z0-9][a-zA-Z0-9_.-]{0,15}"
        }

        proptest! {
            #[test]
            fn every_entry_comes_from_one_line(content in "\\PC{0,200}") {
                let m = Manifest::parse(&content);
                prop_assert!(m.len() <= content.lines().count());
            }

            #[test]
            fn preserves_order_of_declared_packages(
                names in proptest::collection::vec(package_name(), 0..8),
            ) {
                let content = names
                    .iter()
                    .map(|n| format!("{n}>=1.0"))
                    .collect::<Vec<_>>()
                    .join("\n");
                let m = Manifest::parse(&content);
                let parsed: Vec<String> = m.names().map(str::to_owned).collect();
                prop_assert_eq!(parsed, names);
            }
        }
    }
}
