//! vstore - file-based block storage for virtual machine disks.
//!
//! Disks are plain files, either on local storage below administrator
//! approved directories or inside Gluster volumes that are mounted on
//! demand and shared between disks by reference count.
//!
//! ```no_run
//! use vstore::bdev::{BlockDevice, DeviceRequest, UniqueId};
//! use vstore::runtime::{StorageOptions, StorageRuntime};
//! use vstore_shared::DiskTemplate;
//!
//! # fn main() -> vstore_shared::VstoreResult<()> {
//! let runtime = StorageRuntime::new(StorageOptions::from_env()?);
//! let id = UniqueId::new("loop", "/srv/storage/inst1/disk0")?;
//! let mut disk = runtime.create_device(&DeviceRequest::new(DiskTemplate::File, id, 1024))?;
//! disk.assemble()?;
//! # Ok(())
//! # }
//! ```

pub mod bdev;
pub mod disk;
pub mod hypervisor;
pub mod pathcheck;
pub mod runtime;
pub mod util;
pub mod volumes;

pub use bdev::{BlockDevice, Device, DeviceRequest, GrowOptions, UniqueId};
pub use hypervisor::Hypervisor;
pub use pathcheck::PathPolicy;
pub use runtime::{StorageOptions, StorageRuntime};
pub use volumes::{GlusterVolume, MountLease, MountManager, UnmountOutcome};
pub use vstore_shared::{DiskTemplate, VstoreError, VstoreResult};
