//! Network volumes that disks can live on.

pub mod gluster;

pub use gluster::{
    GlusterVolume, MountCommands, MountLease, MountManager, UnmountOutcome, VolumeId,
    resolve_host,
};
