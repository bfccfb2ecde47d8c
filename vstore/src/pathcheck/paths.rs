//! Lexical path helpers.
//!
//! None of these touch the filesystem: policy decisions must not depend on
//! what currently exists on disk.

use std::path::{Component, Path, PathBuf};

/// Collapse `.`, `..` and repeated separators without resolving symlinks.
///
/// `..` above the root stays at the root; leading `..` of a relative path is
/// preserved.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    let mut depth = 0usize;

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if depth > 0 {
                    out.pop();
                    depth -= 1;
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(name) => {
                out.push(name);
                depth += 1;
            }
        }
    }

    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}

/// True if `other` lies strictly below `root` (equal paths are not below).
pub fn is_below_dir(root: &Path, other: &Path) -> bool {
    let root = normalize(root);
    let other = normalize(other);
    other != root && other.starts_with(&root)
}
