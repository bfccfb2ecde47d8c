//! Live mount table access.
//!
//! Mount utilities for network filesystems can exit 0 without mounting
//! anything, so mount state is always read back from the kernel's table.

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use vstore_shared::errors::VstoreResult;
#[cfg(target_os = "linux")]
use vstore_shared::errors::VstoreError;

/// One line of the mount table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    /// What is mounted (device, `server:volume`, ...).
    pub source: String,
    pub mount_point: PathBuf,
    pub fs_type: String,
}

/// Source of the current mount table.
pub trait MountTable: Send + Sync + Debug {
    fn entries(&self) -> VstoreResult<Vec<MountEntry>>;

    /// Topmost entry mounted on `mount_point`, if any.
    ///
    /// Symlinks in `mount_point` are resolved first since the kernel reports
    /// canonical paths.
    fn find(&self, mount_point: &Path) -> VstoreResult<Option<MountEntry>> {
        let canonical = std::fs::canonicalize(mount_point).ok();
        let entries = self.entries()?;
        Ok(entries.into_iter().rev().find(|entry| {
            entry.mount_point == mount_point
                || canonical.as_deref() == Some(entry.mount_point.as_path())
        }))
    }
}

/// Reads `/proc/self/mountinfo` of the current process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcMountTable;

impl MountTable for ProcMountTable {
    #[cfg(target_os = "linux")]
    fn entries(&self) -> VstoreResult<Vec<MountEntry>> {
        let process = procfs::process::Process::myself()
            .map_err(|e| VstoreError::Command(format!("Failed to open /proc/self: {}", e)))?;
        let infos = process
            .mountinfo()
            .map_err(|e| VstoreError::Command(format!("Failed to read mountinfo: {}", e)))?;

        Ok(infos
            .into_iter()
            .map(|info| MountEntry {
                source: info.mount_source.unwrap_or_default(),
                mount_point: info.mount_point,
                fs_type: info.fs_type,
            })
            .collect())
    }

    #[cfg(not(target_os = "linux"))]
    fn entries(&self) -> VstoreResult<Vec<MountEntry>> {
        Err(vstore_shared::VstoreError::Unsupported(
            "mount table inspection is only available on Linux".into(),
        ))
    }
}
