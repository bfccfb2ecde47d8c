//! Primitive operations on a single backing file.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use vstore_shared::DiskTemplate;
use vstore_shared::constants::MIB;
use vstore_shared::errors::{VstoreError, VstoreResult};

use crate::pathcheck::PathPolicy;

/// How [`FileHandle::new`] treats the path on disk.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CreateOptions {
    /// Create the file exclusively with this size in MiB. An existing file
    /// is an error.
    pub size_mib: Option<u64>,
    /// Create missing parent directories first.
    pub create_folder: bool,
}

impl CreateOptions {
    pub fn with_size(size_mib: u64) -> Self {
        Self {
            size_mib: Some(size_mib),
            create_folder: false,
        }
    }

    pub fn create_folder(mut self, create_folder: bool) -> Self {
        self.create_folder = create_folder;
        self
    }
}

/// Owns one file path that backs a disk.
///
/// The path has passed the storage path policy for `template` unless the
/// handle was built with [`FileHandle::unchecked`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    path: PathBuf,
    template: DiskTemplate,
}

impl FileHandle {
    /// Validate `path` and optionally create the file.
    pub fn new(
        path: impl Into<PathBuf>,
        template: DiskTemplate,
        policy: &PathPolicy,
        options: CreateOptions,
    ) -> VstoreResult<Self> {
        let path = path.into();
        policy.check_acceptance(&path, &[template], false)?;
        Self::prepare(path, template, options)
    }

    /// Validate an existing (or yet to be created) path without touching it.
    pub fn open(path: impl Into<PathBuf>, template: DiskTemplate, policy: &PathPolicy) -> VstoreResult<Self> {
        Self::new(path, template, policy, CreateOptions::default())
    }

    /// Skip the path policy. Only for tests and test fakes.
    #[cfg(any(test, feature = "test-helpers"))]
    #[doc(hidden)]
    pub fn unchecked(
        path: impl Into<PathBuf>,
        template: DiskTemplate,
        options: CreateOptions,
    ) -> VstoreResult<Self> {
        Self::prepare(path.into(), template, options)
    }

    fn prepare(path: PathBuf, template: DiskTemplate, options: CreateOptions) -> VstoreResult<Self> {
        if options.create_folder
            && let Some(folder) = path.parent()
        {
            fs::create_dir_all(folder)
                .map_err(|e| VstoreError::file_op(folder, "create folder", e))?;
        }

        if let Some(size_mib) = options.size_mib {
            create_sized(&path, size_mib)?;
            tracing::info!(path = %path.display(), size_mib, "Created backing file");
        }

        Ok(Self { path, template })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn template(&self) -> DiskTemplate {
        self.template
    }

    /// Report whether the file exists.
    ///
    /// With `Some(true)` a missing file is an error, with `Some(false)` an
    /// existing one is.
    pub fn exists(&self, assert_exists: Option<bool>) -> VstoreResult<bool> {
        let exists = self.path.exists();

        match assert_exists {
            Some(true) if !exists => Err(VstoreError::NotFound(format!(
                "{}: No such file or directory",
                self.path.display()
            ))),
            Some(false) if exists => Err(VstoreError::AlreadyExists(format!(
                "{}: File exists",
                self.path.display()
            ))),
            _ => Ok(exists),
        }
    }

    /// Delete the file. A missing file counts as removed.
    pub fn remove(&self) -> VstoreResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "Removed backing file");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Backing file already gone");
                Ok(())
            }
            Err(e) => Err(VstoreError::file_op(&self.path, "remove", e)),
        }
    }

    /// Current size in bytes.
    pub fn size(&self) -> VstoreResult<u64> {
        fs::metadata(&self.path)
            .map(|m| m.len())
            .map_err(|e| VstoreError::file_op(&self.path, "stat", e))
    }

    /// Extend the file by `amount_mib` MiB.
    pub fn grow(&self, amount_mib: i64) -> VstoreResult<()> {
        self.exists(Some(true))?;
        let current = self.size()?;

        if amount_mib < 0 {
            return Err(VstoreError::BlockDevice(format!(
                "{}: can't grow by negative amount ({} MiB)",
                self.path.display(),
                amount_mib
            )));
        }

        let new_size = (amount_mib as u64)
            .checked_mul(MIB)
            .and_then(|delta| current.checked_add(delta))
            .ok_or_else(|| {
                VstoreError::BlockDevice(format!(
                    "{}: can't grow by {} MiB: size overflow",
                    self.path.display(),
                    amount_mib
                ))
            })?;

        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| VstoreError::file_op(&self.path, "grow", e))?;
        file.set_len(new_size)
            .map_err(|e| VstoreError::file_op(&self.path, "grow", e))?;

        tracing::info!(
            path = %self.path.display(),
            from = current,
            to = new_size,
            "Grew backing file"
        );
        Ok(())
    }
}

/// Exclusively create `path` and extend it to `size_mib` MiB (sparse).
fn create_sized(path: &Path, size_mib: u64) -> VstoreResult<()> {
    let len = size_mib.checked_mul(MIB).ok_or_else(|| {
        VstoreError::BlockDevice(format!("{}: size {} MiB too large", path.display(), size_mib))
    })?;

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| VstoreError::file_op(path, "create", e))?;

    file.set_len(len)
        .map_err(|e| VstoreError::file_op(path, "create", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn handle(dir: &TempDir, name: &str, options: CreateOptions) -> VstoreResult<FileHandle> {
        FileHandle::unchecked(dir.path().join(name), DiskTemplate::File, options)
    }

    #[test]
    fn test_create_sets_size() {
        let dir = TempDir::new().unwrap();
        let file = handle(&dir, "disk0", CreateOptions::with_size(4)).unwrap();
        assert_eq!(file.size().unwrap(), 4 * MIB);
        assert!(file.exists(Some(true)).unwrap());
    }

    #[test]
    fn test_create_existing_fails() {
        let dir = TempDir::new().unwrap();
        handle(&dir, "disk0", CreateOptions::with_size(1)).unwrap();
        let err = handle(&dir, "disk0", CreateOptions::with_size(1)).unwrap_err();
        assert!(matches!(err, VstoreError::FileOp { action: "create", .. }));
    }

    #[test]
    fn test_create_without_folder_fails() {
        let dir = TempDir::new().unwrap();
        let result = handle(&dir, "missing/disk0", CreateOptions::with_size(1));
        assert!(result.is_err());
        assert!(!dir.path().join("missing").exists());

        let file = handle(
            &dir,
            "missing/disk0",
            CreateOptions::with_size(1).create_folder(true),
        )
        .unwrap();
        assert!(file.exists(None).unwrap());
    }

    #[test]
    fn test_exists_assertions() {
        let dir = TempDir::new().unwrap();
        let file = handle(&dir, "disk0", CreateOptions::default()).unwrap();

        assert!(!file.exists(None).unwrap());
        assert!(!file.exists(Some(false)).unwrap());
        assert!(matches!(file.exists(Some(true)), Err(VstoreError::NotFound(_))));

        fs::write(file.path(), b"").unwrap();
        assert!(file.exists(Some(true)).unwrap());
        assert!(matches!(file.exists(Some(false)), Err(VstoreError::AlreadyExists(_))));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let file = handle(&dir, "disk0", CreateOptions::with_size(1)).unwrap();
        file.remove().unwrap();
        assert!(!file.exists(None).unwrap());
        file.remove().unwrap();
    }

    #[test]
    fn test_size_of_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let file = handle(&dir, "disk0", CreateOptions::default()).unwrap();
        assert!(matches!(file.size(), Err(VstoreError::FileOp { action: "stat", .. })));
    }

    #[test]
    fn test_grow_rejects_negative_and_missing() {
        let dir = TempDir::new().unwrap();
        let file = handle(&dir, "disk0", CreateOptions::default()).unwrap();
        assert!(matches!(file.grow(1), Err(VstoreError::NotFound(_))));

        fs::write(file.path(), b"").unwrap();
        assert!(matches!(file.grow(-1), Err(VstoreError::BlockDevice(_))));
        assert_eq!(file.size().unwrap(), 0);
    }

    #[test]
    fn test_new_runs_path_policy() {
        let dir = TempDir::new().unwrap();
        let list = dir.path().join("paths");
        fs::write(&list, format!("{}\n", dir.path().join("storage").display())).unwrap();
        let policy = PathPolicy::new(&list, "/var/run/vstore/gluster");

        let err = FileHandle::new(
            dir.path().join("elsewhere/disk0"),
            DiskTemplate::File,
            &policy,
            CreateOptions::with_size(1).create_folder(true),
        )
        .unwrap_err();
        assert!(err.is_policy());
        assert!(!dir.path().join("elsewhere").exists());

        let file = FileHandle::new(
            dir.path().join("storage/disk0"),
            DiskTemplate::File,
            &policy,
            CreateOptions::with_size(1).create_folder(true),
        )
        .unwrap();
        assert_eq!(file.size().unwrap(), MIB);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_grow_adds_exact_mebibytes(initial in 0u64..4, amount in 0i64..64) {
            let dir = TempDir::new().unwrap();
            let file = handle(&dir, "disk0", CreateOptions::with_size(initial)).unwrap();
            let before = file.size().unwrap();
            file.grow(amount).unwrap();
            prop_assert_eq!(file.size().unwrap(), before + amount as u64 * MIB);
        }
    }
}
