//! Shared constants.
//!
//! Values here are part of the contract with the configuration layer and
//! must not change between releases.

/// Bytes in one mebibyte. Sizes cross the API boundary in MiB.
pub const MIB: u64 = 1024 * 1024;

/// Disk template tags.
pub mod templates {
    pub const FILE: &str = "file";
    pub const SHARED_FILE: &str = "sharedfile";
    pub const GLUSTER: &str = "gluster";
}

/// File drivers accepted as the first element of a file-based unique id.
pub mod drivers {
    pub const LOOP: &str = "loop";
    pub const BLKTAP: &str = "blktap";
    pub const BLKTAP2: &str = "blktap2";
}

/// Disk parameter keys and defaults for Gluster-backed disks.
pub mod gluster {
    pub const HOST_KEY: &str = "host";
    pub const PORT_KEY: &str = "port";
    pub const VOLUME_KEY: &str = "volume";

    pub const DEFAULT_HOST: &str = "127.0.0.1";
    pub const DEFAULT_PORT: u16 = 24007;
    pub const DEFAULT_VOLUME: &str = "gv0";
}

/// Default locations on the node.
pub mod paths {
    /// Admin-maintained allow-list for file storage.
    pub const FILE_STORAGE_PATHS_FILE: &str = "/etc/vstore/file-storage-paths";

    /// Gluster volumes are mounted below this directory, one per volume.
    pub const GLUSTER_MOUNT_BASE: &str = "/var/run/vstore/gluster";
}

/// Storage type tags reported by space accounting.
pub mod storage_types {
    pub const FILE: &str = "file";
}

pub mod envs {
    /// Path to a JSON configuration file.
    pub const VSTORE_CONFIG: &str = "VSTORE_CONFIG";
}
