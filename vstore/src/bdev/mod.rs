//! Block devices backed by files.
//!
//! Every backend implements [`BlockDevice`]. [`Device`] is the closed set of
//! backends; callers pick the variant from the disk template tag.
//!
//! - `FileStorage` - a file on local storage
//! - `GlusterStorage` - a file inside a mounted Gluster volume

mod file;
mod gluster;
mod request;

use std::path::Path;

use vstore_shared::errors::{VstoreError, VstoreResult};

use crate::hypervisor::Hypervisor;

pub use file::FileStorage;
pub use gluster::{GlusterParams, GlusterStorage};
pub use request::{DeviceRequest, GrowOptions, UniqueId};

/// Lifecycle shared by all storage backends.
pub trait BlockDevice {
    fn unique_id(&self) -> &UniqueId;

    /// Size requested at creation, in MiB.
    fn size_mib(&self) -> u64;

    /// Local path of the backing file.
    fn dev_path(&self) -> &Path;

    /// Make sure the device is usable; fails if its file is missing.
    fn assemble(&mut self) -> VstoreResult<()>;

    /// Connect to the backing file. Returns whether it exists.
    fn attach(&mut self) -> VstoreResult<bool>;

    fn is_attached(&self) -> bool;

    /// Make the device ready for I/O.
    fn open(&mut self, force: bool) -> VstoreResult<()>;

    /// The device will no longer be used for I/O.
    fn close(&mut self) -> VstoreResult<()>;

    fn shutdown(&mut self) -> VstoreResult<()>;

    /// Delete the backing file. Returns true once it is gone.
    fn remove(&mut self) -> VstoreResult<bool>;

    fn rename(&mut self, new_id: &UniqueId) -> VstoreResult<()>;

    /// Grow by `amount_mib` MiB.
    fn grow(&mut self, amount_mib: i64, options: GrowOptions) -> VstoreResult<()>;

    /// Bytes used by the backing file.
    fn actual_size(&self) -> VstoreResult<u64>;

    /// URI that lets `hypervisor` open the disk without a local path.
    fn userspace_access_uri(&self, hypervisor: Hypervisor) -> VstoreResult<String> {
        Err(VstoreError::Unsupported(format!(
            "Userspace access is not supported for {} by this device",
            hypervisor
        )))
    }
}

/// A constructed device of any backend.
#[derive(Debug)]
pub enum Device {
    File(FileStorage),
    Gluster(GlusterStorage),
}

macro_rules! dispatch {
    ($self:ident, $dev:ident => $call:expr) => {
        match $self {
            Device::File($dev) => $call,
            Device::Gluster($dev) => $call,
        }
    };
}

impl BlockDevice for Device {
    fn unique_id(&self) -> &UniqueId {
        dispatch!(self, d => d.unique_id())
    }

    fn size_mib(&self) -> u64 {
        dispatch!(self, d => d.size_mib())
    }

    fn dev_path(&self) -> &Path {
        dispatch!(self, d => d.dev_path())
    }

    fn assemble(&mut self) -> VstoreResult<()> {
        dispatch!(self, d => d.assemble())
    }

    fn attach(&mut self) -> VstoreResult<bool> {
        dispatch!(self, d => d.attach())
    }

    fn is_attached(&self) -> bool {
        dispatch!(self, d => d.is_attached())
    }

    fn open(&mut self, force: bool) -> VstoreResult<()> {
        dispatch!(self, d => d.open(force))
    }

    fn close(&mut self) -> VstoreResult<()> {
        dispatch!(self, d => d.close())
    }

    fn shutdown(&mut self) -> VstoreResult<()> {
        dispatch!(self, d => d.shutdown())
    }

    fn remove(&mut self) -> VstoreResult<bool> {
        dispatch!(self, d => d.remove())
    }

    fn rename(&mut self, new_id: &UniqueId) -> VstoreResult<()> {
        dispatch!(self, d => d.rename(new_id))
    }

    fn grow(&mut self, amount_mib: i64, options: GrowOptions) -> VstoreResult<()> {
        dispatch!(self, d => d.grow(amount_mib, options))
    }

    fn actual_size(&self) -> VstoreResult<u64> {
        dispatch!(self, d => d.actual_size())
    }

    fn userspace_access_uri(&self, hypervisor: Hypervisor) -> VstoreResult<String> {
        dispatch!(self, d => d.userspace_access_uri(hypervisor))
    }
}
