//! Disks stored as files inside a Gluster volume.
//!
//! The volume is mounted locally while the device is attached and the disk
//! is an ordinary file below the mount point. The device owns one mount
//! reference for as long as it is attached; dropping the device releases it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use vstore_shared::DiskTemplate;
use vstore_shared::constants::gluster as consts;
use vstore_shared::errors::{VstoreError, VstoreResult};

use super::{BlockDevice, DeviceRequest, GrowOptions, UniqueId};
use crate::disk::{CreateOptions, FileHandle};
use crate::hypervisor::Hypervisor;
use crate::pathcheck::{PathPolicy, is_below_dir};
use crate::volumes::{GlusterVolume, MountLease, MountManager, UnmountOutcome};

/// Where the volume of a Gluster disk lives, read from the disk parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlusterParams {
    pub host: String,
    pub port: u16,
    pub volume: String,
}

impl Default for GlusterParams {
    fn default() -> Self {
        Self {
            host: consts::DEFAULT_HOST.to_string(),
            port: consts::DEFAULT_PORT,
            volume: consts::DEFAULT_VOLUME.to_string(),
        }
    }
}

impl GlusterParams {
    /// Read `host`, `port` and `volume`, falling back to the defaults.
    pub fn from_params(params: &BTreeMap<String, String>) -> VstoreResult<Self> {
        let defaults = Self::default();

        let port = match params.get(consts::PORT_KEY) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| {
                VstoreError::Config(format!("Invalid Gluster port '{}': {}", raw, e))
            })?,
            None => defaults.port,
        };

        Ok(Self {
            host: params
                .get(consts::HOST_KEY)
                .cloned()
                .unwrap_or(defaults.host),
            port,
            volume: params
                .get(consts::VOLUME_KEY)
                .cloned()
                .unwrap_or(defaults.volume),
        })
    }
}

/// A file inside a Gluster volume backing one disk.
#[derive(Debug)]
pub struct GlusterStorage {
    unique_id: UniqueId,
    size_mib: u64,
    volume: GlusterVolume,
    rel_path: String,
    dev_path: PathBuf,
    policy: PathPolicy,
    file: Option<FileHandle>,
    lease: Option<MountLease>,
}

impl GlusterStorage {
    /// Mount the volume and bind to the file named by `request`.
    pub fn new(
        request: &DeviceRequest,
        policy: &PathPolicy,
        manager: &Arc<MountManager>,
    ) -> VstoreResult<Self> {
        request.check_leaf()?;
        let volume = volume_for(request, policy, manager)?;
        let mut device = Self::detached(request, policy, volume)?;
        device.attach()?;
        Ok(device)
    }

    /// Create the backing file inside the volume, then attach to it.
    pub fn create(
        request: &DeviceRequest,
        policy: &PathPolicy,
        manager: &Arc<MountManager>,
    ) -> VstoreResult<Self> {
        request.check_creatable()?;
        let volume = volume_for(request, policy, manager)?;
        let mut device = Self::detached(request, policy, volume)?;

        let lease = device.volume.acquire()?;
        FileHandle::new(
            &device.dev_path,
            DiskTemplate::Gluster,
            policy,
            CreateOptions::with_size(request.size_mib).create_folder(true),
        )?;
        log_release(lease);

        device.attach()?;
        Ok(device)
    }

    fn detached(
        request: &DeviceRequest,
        policy: &PathPolicy,
        volume: GlusterVolume,
    ) -> VstoreResult<Self> {
        let rel_path = request.unique_id.path().trim_start_matches('/').to_string();
        let dev_path = volume.mount_point().join(&rel_path);

        // The disk must stay inside its own volume, whatever the mount base allows.
        if !is_below_dir(volume.mount_point(), &dev_path) {
            return Err(VstoreError::StoragePath(format!(
                "Disk path '{}' escapes the mount point {} of volume {}",
                request.unique_id.path(),
                volume.mount_point().display(),
                volume.volume_name()
            )));
        }

        Ok(Self {
            unique_id: request.unique_id.clone(),
            size_mib: request.size_mib,
            volume,
            rel_path,
            dev_path,
            policy: policy.clone(),
            file: None,
            lease: None,
        })
    }

    pub fn volume(&self) -> &GlusterVolume {
        &self.volume
    }

    /// Path of the disk relative to the volume root.
    pub fn relative_path(&self) -> &str {
        &self.rel_path
    }

    fn attached_file(&self) -> VstoreResult<&FileHandle> {
        match (&self.file, &self.lease) {
            (Some(file), Some(_)) => Ok(file),
            _ => Err(VstoreError::BlockDevice(format!(
                "{}: device is not attached",
                self.dev_path.display()
            ))),
        }
    }

    fn open_file(&self) -> VstoreResult<(FileHandle, bool)> {
        let file = FileHandle::open(&self.dev_path, DiskTemplate::Gluster, &self.policy)?;
        let exists = file.exists(None)?;
        Ok((file, exists))
    }

    fn detach(&mut self) {
        self.file = None;
        if let Some(lease) = self.lease.take() {
            log_release(lease);
        }
    }
}

fn volume_for(
    request: &DeviceRequest,
    policy: &PathPolicy,
    manager: &Arc<MountManager>,
) -> VstoreResult<GlusterVolume> {
    if request.template != DiskTemplate::Gluster {
        return Err(VstoreError::Programmer(format!(
            "Gluster device requested for template {}",
            request.template
        )));
    }

    let params = GlusterParams::from_params(&request.params)?;
    GlusterVolume::new(
        &params.host,
        params.port,
        &params.volume,
        &policy.gluster_mount_base,
        Arc::clone(manager),
    )
}

fn log_release(lease: MountLease) {
    let volume = lease.volume().to_string();
    if let UnmountOutcome::Failed(reason) = lease.release() {
        tracing::warn!(%volume, %reason, "Volume left mounted");
    }
}

impl BlockDevice for GlusterStorage {
    fn unique_id(&self) -> &UniqueId {
        &self.unique_id
    }

    fn size_mib(&self) -> u64 {
        self.size_mib
    }

    fn dev_path(&self) -> &Path {
        &self.dev_path
    }

    fn assemble(&mut self) -> VstoreResult<()> {
        self.attached_file()?.exists(Some(true)).map(|_| ())
    }

    fn attach(&mut self) -> VstoreResult<bool> {
        let lease = match self.lease.take() {
            Some(lease) => lease,
            None => self.volume.acquire()?,
        };

        match self.open_file() {
            Ok((file, exists)) => {
                self.file = Some(file);
                self.lease = Some(lease);
                Ok(exists)
            }
            Err(e) => {
                self.file = None;
                log_release(lease);
                Err(e)
            }
        }
    }

    fn is_attached(&self) -> bool {
        self.attached_file().is_ok()
    }

    fn open(&mut self, _force: bool) -> VstoreResult<()> {
        self.attached_file()?.exists(Some(true)).map(|_| ())
    }

    fn close(&mut self) -> VstoreResult<()> {
        self.detach();
        Ok(())
    }

    fn shutdown(&mut self) -> VstoreResult<()> {
        self.detach();
        Ok(())
    }

    fn remove(&mut self) -> VstoreResult<bool> {
        if let Ok(file) = self.attached_file() {
            file.remove()?;
            return Ok(true);
        }

        let lease = self.volume.acquire()?;
        let (file, _) = self.open_file()?;
        file.remove()?;
        log_release(lease);
        Ok(true)
    }

    fn rename(&mut self, _new_id: &UniqueId) -> VstoreResult<()> {
        Err(VstoreError::Programmer(
            "Rename is not supported for Gluster storage".to_string(),
        ))
    }

    fn grow(&mut self, amount_mib: i64, options: GrowOptions) -> VstoreResult<()> {
        if !options.touches_file() {
            return Ok(());
        }
        self.attached_file()?.grow(amount_mib)
    }

    fn actual_size(&self) -> VstoreResult<u64> {
        self.attached_file()?.size()
    }

    fn userspace_access_uri(&self, hypervisor: Hypervisor) -> VstoreResult<String> {
        if !hypervisor.supports_gluster_userspace() {
            return Err(VstoreError::Unsupported(format!(
                "Hypervisor {} doesn't support Gluster userspace access",
                hypervisor
            )));
        }
        Ok(self.volume.kvm_mount_string(&self.rel_path))
    }
}
