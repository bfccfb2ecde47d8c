//! Configuration for the storage engine.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vstore_shared::constants::{envs, paths};
use vstore_shared::errors::{VstoreError, VstoreResult};

use crate::pathcheck::PathPolicy;
use crate::volumes::MountCommands;

/// Node-level storage settings. Every field has a default, so an empty JSON
/// object is a valid configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageOptions {
    /// Admin-maintained list of directories that may hold file disks.
    ///
    /// Default: /etc/vstore/file-storage-paths
    #[serde(default = "default_allowed_paths_file")]
    pub allowed_paths_file: PathBuf,

    /// Directory under which Gluster volumes are mounted.
    ///
    /// Default: /var/run/vstore/gluster
    #[serde(default = "default_gluster_mount_base")]
    pub gluster_mount_base: PathBuf,

    #[serde(default = "default_mount_command")]
    pub mount_command: String,

    #[serde(default = "default_umount_command")]
    pub umount_command: String,

    /// Gluster CLI used to explain mount failures. `null` disables the query.
    #[serde(default = "default_gluster_command")]
    pub gluster_command: Option<String>,

    /// Timeout of the reachability check after a failed mount.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_allowed_paths_file() -> PathBuf {
    PathBuf::from(paths::FILE_STORAGE_PATHS_FILE)
}

fn default_gluster_mount_base() -> PathBuf {
    PathBuf::from(paths::GLUSTER_MOUNT_BASE)
}

fn default_mount_command() -> String {
    "mount".to_string()
}

fn default_umount_command() -> String {
    "umount".to_string()
}

fn default_gluster_command() -> Option<String> {
    Some("gluster".to_string())
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            allowed_paths_file: default_allowed_paths_file(),
            gluster_mount_base: default_gluster_mount_base(),
            mount_command: default_mount_command(),
            umount_command: default_umount_command(),
            gluster_command: default_gluster_command(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl StorageOptions {
    /// Read options from a JSON file.
    pub fn load(path: &Path) -> VstoreResult<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| VstoreError::file_op(path, "read config", e))?;
        serde_json::from_str(&raw).map_err(|e| {
            VstoreError::Config(format!("{}: invalid configuration: {}", path.display(), e))
        })
    }

    /// Options from the file named by `VSTORE_CONFIG`, or the defaults.
    pub fn from_env() -> VstoreResult<Self> {
        match std::env::var_os(envs::VSTORE_CONFIG) {
            Some(path) if !path.is_empty() => Self::load(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }

    pub fn path_policy(&self) -> PathPolicy {
        PathPolicy::new(&self.allowed_paths_file, &self.gluster_mount_base)
    }

    pub fn mount_commands(&self) -> MountCommands {
        MountCommands {
            mount: self.mount_command.clone(),
            umount: self.umount_command.clone(),
            gluster: self.gluster_command.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_object_is_defaults() {
        let options: StorageOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, StorageOptions::default());
        assert_eq!(options.mount_commands(), MountCommands::default());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vstore.json");
        fs::write(
            &path,
            r#"{"gluster_mount_base": "/mnt/gluster", "gluster_command": null}"#,
        )
        .unwrap();

        let options = StorageOptions::load(&path).unwrap();
        assert_eq!(options.gluster_mount_base, PathBuf::from("/mnt/gluster"));
        assert_eq!(options.gluster_command, None);
        assert_eq!(
            options.allowed_paths_file,
            PathBuf::from("/etc/vstore/file-storage-paths")
        );

        let policy = options.path_policy();
        assert_eq!(policy.gluster_mount_base, PathBuf::from("/mnt/gluster"));
    }

    #[test]
    fn test_load_errors() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            StorageOptions::load(&dir.path().join("missing.json")),
            Err(VstoreError::FileOp { .. })
        ));

        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(StorageOptions::load(&path), Err(VstoreError::Config(_))));
    }
}
