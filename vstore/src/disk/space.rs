//! Free/total space reporting for file storage directories.

use std::path::Path;

use nix::sys::statvfs::statvfs;
use serde::{Deserialize, Serialize};
use vstore_shared::constants::{MIB, storage_types};
use vstore_shared::errors::{VstoreError, VstoreResult};

/// Capacity of the filesystem holding a storage path, in MiB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceInfo {
    #[serde(rename = "type")]
    pub storage_type: String,
    pub name: String,
    pub total_mib: u64,
    pub free_mib: u64,
}

/// Statistics of the filesystem `path` lives on.
pub fn space_info(path: &Path) -> VstoreResult<SpaceInfo> {
    let stat = statvfs(path).map_err(|e| {
        VstoreError::Command(format!(
            "Failed to retrieve file system information about path: {} - {}",
            path.display(),
            e.desc()
        ))
    })?;

    let frsize = stat.fragment_size() as u64;
    let total = frsize.saturating_mul(stat.blocks() as u64) / MIB;
    let free = frsize.saturating_mul(stat.blocks_available() as u64) / MIB;

    Ok(SpaceInfo {
        storage_type: storage_types::FILE.to_string(),
        name: path.display().to_string(),
        total_mib: total,
        free_mib: free,
    })
}
