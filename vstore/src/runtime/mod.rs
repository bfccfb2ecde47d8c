//! Storage engine context.
//!
//! [`StorageRuntime`] ties together the node options, the path policy and
//! the one mount manager shared by every Gluster device of the process.

mod options;

use std::path::Path;
use std::sync::Arc;

use vstore_shared::DiskTemplate;
use vstore_shared::errors::VstoreResult;

use crate::bdev::{Device, DeviceRequest, FileStorage, GlusterParams, GlusterStorage};
use crate::disk::{SpaceInfo, space_info};
use crate::pathcheck::PathPolicy;
use crate::volumes::{GlusterVolume, MountManager};

pub use options::StorageOptions;

/// Entry point for building devices.
#[derive(Debug, Clone)]
pub struct StorageRuntime {
    options: StorageOptions,
    policy: PathPolicy,
    mounts: Arc<MountManager>,
}

impl StorageRuntime {
    /// Runtime driving the real host.
    pub fn new(options: StorageOptions) -> Self {
        let mounts = Arc::new(MountManager::system(options.mount_commands()));
        Self::with_mount_manager(options, mounts)
    }

    /// Runtime over an existing mount manager.
    pub fn with_mount_manager(options: StorageOptions, mounts: Arc<MountManager>) -> Self {
        let policy = options.path_policy();
        Self {
            options,
            policy,
            mounts,
        }
    }

    pub fn options(&self) -> &StorageOptions {
        &self.options
    }

    pub fn path_policy(&self) -> &PathPolicy {
        &self.policy
    }

    pub fn mount_manager(&self) -> &Arc<MountManager> {
        &self.mounts
    }

    /// Create the backing storage for `request` and return the attached device.
    pub fn create_device(&self, request: &DeviceRequest) -> VstoreResult<Device> {
        tracing::info!(
            template = %request.template,
            unique_id = %request.unique_id,
            size_mib = request.size_mib,
            "Creating device"
        );
        match request.template {
            DiskTemplate::File | DiskTemplate::SharedFile => {
                FileStorage::create(request, &self.policy).map(Device::File)
            }
            DiskTemplate::Gluster => {
                GlusterStorage::create(request, &self.policy, &self.mounts).map(Device::Gluster)
            }
        }
    }

    /// Bind to existing backing storage for `request`.
    pub fn attach_device(&self, request: &DeviceRequest) -> VstoreResult<Device> {
        match request.template {
            DiskTemplate::File | DiskTemplate::SharedFile => {
                FileStorage::new(request, &self.policy).map(Device::File)
            }
            DiskTemplate::Gluster => {
                GlusterStorage::new(request, &self.policy, &self.mounts).map(Device::Gluster)
            }
        }
    }

    /// Volume described by Gluster disk parameters.
    pub fn gluster_volume(&self, params: &GlusterParams) -> VstoreResult<GlusterVolume> {
        GlusterVolume::new(
            &params.host,
            params.port,
            &params.volume,
            &self.options.gluster_mount_base,
            Arc::clone(&self.mounts),
        )
    }

    /// Capacity of the filesystem holding `path`.
    pub fn space_info(&self, path: &Path) -> VstoreResult<SpaceInfo> {
        space_info(path)
    }
}
