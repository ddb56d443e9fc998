//! Lexical path normalization.

use std::path::{Component, Path, PathBuf};

/// Collapse `.` and `..` components without touching the filesystem.
///
/// The file may not exist yet, so `canonicalize` is not an option. A `..` that
/// would climb above the root is dropped; above a relative start it is kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_dots() {
        assert_eq!(normalize(Path::new("a/./b/../c.json")), PathBuf::from("a/c.json"));
        assert_eq!(normalize(Path::new("./db.json")), PathBuf::from("db.json"));
    }

    #[test]
    fn test_keeps_leading_parent() {
        assert_eq!(normalize(Path::new("../x/../db.json")), PathBuf::from("../db.json"));
        assert_eq!(normalize(Path::new("../../db.json")), PathBuf::from("../../db.json"));
    }

    #[cfg(unix)]
    #[test]
    fn test_absolute_cannot_escape_root() {
        assert_eq!(normalize(Path::new("/../tmp/db.json")), PathBuf::from("/tmp/db.json"));
        assert_eq!(normalize(Path::new("/tmp//a/../db.json")), PathBuf::from("/tmp/db.json"));
    }

    #[test]
    fn test_empty_becomes_current_dir() {
        assert_eq!(normalize(Path::new("a/..")), PathBuf::from("."));
    }
}
