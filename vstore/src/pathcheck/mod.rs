//! File storage path policy.
//!
//! Every path used for file-backed storage must pass [`PathPolicy::check_acceptance`]:
//! - it is absolute,
//! - it is not a system location (hard-coded deny-list, always wins),
//! - it lies below an administrator allow-listed directory.
//!
//! The allow-list file is re-read on every check so edits apply immediately.

mod paths;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use nix::unistd::{AccessFlags, access};
use vstore_shared::DiskTemplate;
use vstore_shared::errors::{VstoreError, VstoreResult};

pub use paths::{is_below_dir, normalize};

/// System prefixes that may never hold disk images.
static FORBIDDEN_PATHS: LazyLock<BTreeSet<PathBuf>> = LazyLock::new(|| {
    let mut paths: BTreeSet<PathBuf> = ["/boot", "/dev", "/etc", "/home", "/proc", "/root", "/sys"]
        .iter()
        .map(PathBuf::from)
        .collect();

    for prefix in ["", "/usr", "/usr/local"] {
        for dir in ["bin", "lib", "lib32", "lib64", "sbin"] {
            paths.insert(normalize(Path::new(&format!("{}/{}", prefix, dir))));
        }
    }

    paths
});

/// The deny-list, normalized.
pub fn forbidden_paths() -> &'static BTreeSet<PathBuf> {
    &FORBIDDEN_PATHS
}

/// True if `path` is relative or equal to / below a forbidden prefix.
pub fn is_forbidden(path: &Path) -> bool {
    if !path.is_absolute() {
        return true;
    }
    let path = normalize(path);
    FORBIDDEN_PATHS.contains(&path) || FORBIDDEN_PATHS.iter().any(|p| is_below_dir(p, &path))
}

/// Normalized, sorted subset of `paths` that should never be allow-listed.
pub fn wrong_paths<P: AsRef<Path>>(paths: &[P]) -> Vec<PathBuf> {
    let mut wrong: Vec<PathBuf> = paths
        .iter()
        .map(|p| normalize(p.as_ref()))
        .filter(|p| is_forbidden(p))
        .collect();
    wrong.sort();
    wrong
}

/// Read the allow-list file.
///
/// Blank lines and `#` comments are skipped. A missing or unreadable file is
/// an empty allow-list, which rejects every path.
pub fn load_allowed_paths(filename: &Path) -> Vec<PathBuf> {
    match std::fs::read_to_string(filename) {
        Ok(contents) => contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(PathBuf::from)
            .collect(),
        Err(e) => {
            tracing::debug!(file = %filename.display(), error = %e, "Allow-list not readable");
            Vec::new()
        }
    }
}

/// Check `path` against a resolved allow-list.
///
/// With `exact_match_ok`, the allow-listed directory itself is accepted too.
fn check_allowed(path: &Path, allowed: &[PathBuf], exact_match_ok: bool) -> VstoreResult<()> {
    let normalized = normalize(path);

    for entry in allowed {
        if !entry.is_absolute() {
            tracing::warn!(
                "Ignoring relative path '{}' for file storage",
                entry.display()
            );
            continue;
        }

        if exact_match_ok && normalize(entry) == normalized {
            return Ok(());
        }

        if is_below_dir(entry, &normalized) {
            return Ok(());
        }
    }

    Err(VstoreError::StoragePath(format!(
        "Path '{}' is not acceptable for file storage",
        path.display()
    )))
}

/// Where the allow-list lives and where network volumes get mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPolicy {
    pub allowed_paths_file: PathBuf,
    pub gluster_mount_base: PathBuf,
}

impl PathPolicy {
    pub fn new(allowed_paths_file: impl Into<PathBuf>, gluster_mount_base: impl Into<PathBuf>) -> Self {
        Self {
            allowed_paths_file: allowed_paths_file.into(),
            gluster_mount_base: gluster_mount_base.into(),
        }
    }

    /// Allow-list entries for `templates` (all file-based templates if empty).
    pub fn allowed_paths(&self, templates: &[DiskTemplate]) -> Vec<PathBuf> {
        let templates = if templates.is_empty() {
            &DiskTemplate::ALL[..]
        } else {
            templates
        };

        let mut allowed = Vec::new();
        if templates.iter().any(DiskTemplate::uses_allow_list) {
            allowed = load_allowed_paths(&self.allowed_paths_file);
        }
        if templates.contains(&DiskTemplate::Gluster) {
            allowed.push(self.gluster_mount_base.clone());
        }
        allowed
    }

    /// Reject `path` unless it may hold file storage for one of `templates`.
    pub fn check_acceptance(
        &self,
        path: &Path,
        templates: &[DiskTemplate],
        exact_match_ok: bool,
    ) -> VstoreResult<()> {
        if !path.is_absolute() {
            return Err(VstoreError::StoragePath(format!(
                "File storage path must be absolute, got '{}'",
                path.display()
            )));
        }

        let allowed = self.allowed_paths(templates);
        if allowed.is_empty() {
            return Err(VstoreError::StoragePath(format!(
                "No paths are valid or path file '{}' is not accessible.",
                self.allowed_paths_file.display()
            )));
        }

        if is_forbidden(path) {
            return Err(VstoreError::StoragePath(format!(
                "Path '{}' uses a forbidden prefix",
                path.display()
            )));
        }

        check_allowed(path, &allowed, exact_match_ok)
    }

    /// Allow-list entries the administrator should be warned about.
    pub fn compute_wrong_paths(&self) -> Vec<PathBuf> {
        wrong_paths(&load_allowed_paths(&self.allowed_paths_file))
    }

    /// Check that `path` is acceptable (exact match allowed), an existing
    /// directory and writable.
    ///
    /// Returns the reason it cannot be used, or `None` if it can.
    pub fn check_file_storage_path(&self, path: &Path, templates: &[DiskTemplate]) -> Option<String> {
        if let Err(e) = self.check_acceptance(path, templates, true) {
            return Some(e.to_string());
        }
        check_path_usable(path).err().map(|e| e.to_string())
    }
}

/// Existing directory, writable by this process.
fn check_path_usable(path: &Path) -> VstoreResult<()> {
    if !path.is_dir() {
        return Err(VstoreError::StoragePath(format!(
            "Path '{}' is not existing or not a directory.",
            path.display()
        )));
    }
    if access(path, AccessFlags::W_OK).is_err() {
        return Err(VstoreError::StoragePath(format!(
            "Path '{}' is not writable",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    fn policy_with(contents: &str) -> (TempDir, PathPolicy) {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file-storage-paths");
        fs::write(&file, contents).unwrap();
        let policy = PathPolicy::new(file, "/var/run/vstore/gluster");
        (dir, policy)
    }

    #[test]
    fn test_forbidden_paths_contents() {
        let paths = forbidden_paths();
        for path in ["/bin", "/usr/local/sbin", "/lib64", "/etc", "/sys"] {
            assert!(paths.contains(Path::new(path)), "{} missing", path);
        }
        for path in paths {
            assert_eq!(&normalize(path), path);
        }
    }

    #[test]
    fn test_wrong_paths() {
        let empty: [&str; 0] = [];
        assert!(wrong_paths(&empty).is_empty());
        assert!(wrong_paths(&["/tmp"]).is_empty());
        assert_eq!(wrong_paths(&["/bin/ls"]), vec![PathBuf::from("/bin/ls")]);
        assert_eq!(wrong_paths(&["/bin"]), vec![PathBuf::from("/bin")]);
        assert_eq!(
            wrong_paths(&["/usr/sbin/vim", "/srv/file-storage"]),
            vec![PathBuf::from("/usr/sbin/vim")]
        );
    }

    #[test]
    fn test_compute_wrong_paths_from_file() {
        let (_dir, policy) = policy_with(
            "\n  /tmp\n  x/y///z/relative\n  # This is a test file\n  /srv/storage\n  /bin\n  /usr/local/lib32/\n  relative/path\n",
        );
        assert_eq!(
            policy.compute_wrong_paths(),
            vec![
                PathBuf::from("/bin"),
                PathBuf::from("/usr/local/lib32"),
                PathBuf::from("relative/path"),
                PathBuf::from("x/y/z/relative"),
            ]
        );
    }

    #[test]
    fn test_load_allowed_paths_skips_comments_and_blanks() {
        let (dir, _policy) = policy_with("");
        let file = dir.path().join("list");
        fs::write(&file, "\n  # This is a test file\n  /tmp\n  /srv/storage\n  relative/path\n  ").unwrap();
        assert_eq!(
            load_allowed_paths(&file),
            vec![
                PathBuf::from("/tmp"),
                PathBuf::from("/srv/storage"),
                PathBuf::from("relative/path"),
            ]
        );
    }

    #[test]
    fn test_load_allowed_paths_missing_or_empty() {
        assert!(load_allowed_paths(Path::new("/dev/null")).is_empty());
        assert!(load_allowed_paths(Path::new("/tmp/this/file/does/not/exist")).is_empty());
    }

    #[test]
    fn test_check_allowed_rejects_relative_inputs() {
        for path in ["", "tmp", "foo/bar/baz"] {
            assert!(check_allowed(Path::new(path), &[PathBuf::from("/tmp")], false).is_err());
        }
        let relative_only = [PathBuf::from("tmp"), PathBuf::from("xyz")];
        assert!(check_allowed(Path::new("/tmp"), &relative_only, false).is_err());
    }

    #[test]
    fn test_check_allowed_requires_subpath() {
        let allowed = [PathBuf::from("/tmp/foo")];
        assert!(check_allowed(Path::new("/tmp"), &[], false).is_err());
        assert!(check_allowed(Path::new("/tmp/foo"), &allowed, false).is_err());
        assert!(check_allowed(Path::new("/tmp/foo"), &allowed, true).is_ok());
        assert!(check_allowed(Path::new("/tmp/foo/a"), &allowed, false).is_ok());
        assert!(check_allowed(Path::new("/tmp/foo/a/x"), &allowed, false).is_ok());
    }

    #[test]
    fn test_acceptance_end_to_end() {
        let (_dir, policy) = policy_with("\n      /srv/storage\n      ");
        let file = [DiskTemplate::File];

        policy
            .check_acceptance(Path::new("/srv/storage/inst1"), &file, false)
            .unwrap();

        let err = policy
            .check_acceptance(Path::new("/srv/storage"), &file, false)
            .unwrap_err();
        assert!(err.to_string().contains("not acceptable"));

        let err = policy
            .check_acceptance(Path::new("/usr/lib64/xyz"), &file, false)
            .unwrap_err();
        assert!(err.to_string().contains("forbidden prefix"));
    }

    #[test]
    fn test_acceptance_without_allow_list_file() {
        let policy = PathPolicy::new("/tmp/this/file/does/not/exist", "/var/run/vstore/gluster");
        let file = [DiskTemplate::File];
        for path in ["/bin/", "/srv/file-storage"] {
            let err = policy.check_acceptance(Path::new(path), &file, false).unwrap_err();
            assert!(err.is_policy());
        }
    }

    #[test]
    fn test_acceptance_rejects_relative_path() {
        let (_dir, policy) = policy_with("/srv/storage\n");
        let err = policy
            .check_acceptance(Path::new("srv/storage/x"), &[DiskTemplate::File], false)
            .unwrap_err();
        assert!(err.to_string().contains("must be absolute"));
    }

    #[test]
    fn test_deny_list_wins_over_allow_list() {
        let (_dir, policy) = policy_with("/\n/usr\n/etc\n");
        let file = [DiskTemplate::File];
        for path in ["/bin/disk", "/usr/local/sbin/disk", "/lib64/disk", "/etc/disk", "/sys/x"] {
            let err = policy.check_acceptance(Path::new(path), &file, false).unwrap_err();
            assert!(err.to_string().contains("forbidden prefix"), "{}", path);
        }
        policy
            .check_acceptance(Path::new("/usr/share/disk"), &file, false)
            .unwrap();
    }

    #[test]
    fn test_gluster_template_allows_mount_base_only() {
        let policy = PathPolicy::new("/tmp/this/file/does/not/exist", "/var/run/vstore/gluster");
        let gluster = [DiskTemplate::Gluster];
        policy
            .check_acceptance(Path::new("/var/run/vstore/gluster/gv0/disk0"), &gluster, false)
            .unwrap();
        policy
            .check_acceptance(Path::new("/var/run/vstore/gluster"), &gluster, true)
            .unwrap();
        assert!(
            policy
                .check_acceptance(Path::new("/srv/storage/disk0"), &gluster, false)
                .is_err()
        );
        // The allow-list file is not consulted for the network template.
        assert!(
            policy
                .check_acceptance(Path::new("/srv/storage/disk0"), &[DiskTemplate::File], false)
                .is_err()
        );
    }

    #[test]
    fn test_allow_list_edits_apply_immediately() {
        let (_dir, policy) = policy_with("/srv/one\n");
        let file = [DiskTemplate::File];
        assert!(policy.check_acceptance(Path::new("/srv/two/x"), &file, false).is_err());

        fs::write(&policy.allowed_paths_file, "/srv/one\n/srv/two\n").unwrap();
        policy.check_acceptance(Path::new("/srv/two/x"), &file, false).unwrap();
    }

    #[test]
    fn test_check_file_storage_path() {
        let dir = TempDir::new().unwrap();
        let allowed = dir.path().join("allowed");
        fs::create_dir(&allowed).unwrap();
        let list = dir.path().join("allowed-path-file");
        fs::write(&list, allowed.display().to_string()).unwrap();
        let policy = PathPolicy::new(&list, "/var/run/vstore/gluster");

        let subdir = allowed.join("allowedsubdir");
        fs::create_dir(&subdir).unwrap();
        assert_eq!(policy.check_file_storage_path(&subdir, &[]), None);
        assert_eq!(policy.check_file_storage_path(&allowed, &[]), None);

        let reason = policy
            .check_file_storage_path(&dir.path().join("notallowed"), &[])
            .unwrap();
        assert!(reason.contains("not acceptable"));

        let reason = policy
            .check_file_storage_path(&allowed.join("missing"), &[])
            .unwrap();
        assert!(reason.contains("not existing or not a directory"));
    }

    #[test]
    fn test_check_path_usable() {
        let dir = TempDir::new().unwrap();
        check_path_usable(dir.path()).unwrap();
        assert!(check_path_usable(&dir.path().join("does/not/exist")).is_err());
    }

    proptest! {
        #[test]
        fn prop_forbidden_subtrees_rejected_even_if_allowed(
            root in prop::sample::select(vec![
                "/bin", "/usr/local/sbin", "/lib64", "/etc", "/sys", "/usr/lib", "/boot",
            ]),
            tail in "[a-z]{1,8}(/[a-z]{1,8}){0,3}",
        ) {
            let (_dir, policy) = policy_with(&format!("/\n{}\n", root));
            let candidate = PathBuf::from(root).join(&tail);
            prop_assert!(is_forbidden(&candidate));
            let err = policy.check_acceptance(&candidate, &[DiskTemplate::File], true);
            prop_assert!(err.is_err());
        }
    }
}
