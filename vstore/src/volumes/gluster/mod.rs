//! Gluster volumes.
//!
//! A [`GlusterVolume`] names one remote volume and the local directory it is
//! mounted on. Mounting goes through the shared [`MountManager`] so that any
//! number of disks on the same volume share one physical mount.

mod diagnose;
mod lease;
mod manager;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use vstore_shared::errors::{VstoreError, VstoreResult};

pub use lease::MountLease;
pub use manager::{MountCommands, MountManager, UnmountOutcome};

/// Identity of a volume for reference counting.
///
/// Two volumes with equal ids are the same physical volume, however they
/// were constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VolumeId {
    pub server_ip: IpAddr,
    pub port: u16,
    pub volume: String,
}

/// A Gluster volume and where it is mounted locally.
#[derive(Clone)]
pub struct GlusterVolume {
    server_addr: String,
    id: VolumeId,
    mount_point: PathBuf,
    manager: Arc<MountManager>,
}

impl GlusterVolume {
    /// Describe `volume` on `server_addr:port`.
    ///
    /// The server address is resolved immediately; the mount point is
    /// `mount_base/<volume>`.
    pub fn new(
        server_addr: &str,
        port: u16,
        volume: &str,
        mount_base: &Path,
        manager: Arc<MountManager>,
    ) -> VstoreResult<Self> {
        if port == 0 {
            return Err(VstoreError::Config(format!(
                "Invalid port 0 for Gluster server {}",
                server_addr
            )));
        }
        if volume.is_empty() || volume.contains('/') || volume == "." || volume == ".." {
            return Err(VstoreError::Config(format!(
                "Invalid Gluster volume name '{}'",
                volume
            )));
        }

        let server_ip = resolve_host(server_addr)?;

        Ok(Self {
            server_addr: server_addr.to_string(),
            id: VolumeId {
                server_ip,
                port,
                volume: volume.to_string(),
            },
            mount_point: mount_base.join(volume),
            manager,
        })
    }

    /// Address as given by the caller, before resolution.
    pub fn server_addr(&self) -> &str {
        &self.server_addr
    }

    pub fn server_ip(&self) -> IpAddr {
        self.id.server_ip
    }

    pub fn port(&self) -> u16 {
        self.id.port
    }

    pub fn volume_name(&self) -> &str {
        &self.id.volume
    }

    pub fn id(&self) -> &VolumeId {
        &self.id
    }

    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }

    pub fn manager(&self) -> &Arc<MountManager> {
        &self.manager
    }

    /// Source argument for `mount -t glusterfs` (`ip:port:volume`).
    pub fn fuse_mount_string(&self) -> String {
        format!("{}:{}:{}", self.id.server_ip, self.id.port, self.id.volume)
    }

    /// Source column of the mount table once mounted (`ip:volume`).
    pub fn mtab_string(&self) -> String {
        format!("{}:{}", self.id.server_ip, self.id.volume)
    }

    /// QEMU `gluster://` URI for `path` inside the volume.
    pub fn kvm_mount_string(&self, path: &str) -> String {
        let host = match self.id.server_ip {
            IpAddr::V6(ip) => format!("[{}]", ip),
            IpAddr::V4(ip) => ip.to_string(),
        };
        format!(
            "gluster://{}:{}/{}/{}",
            host,
            self.id.port,
            self.id.volume,
            path.trim_start_matches('/')
        )
    }

    /// Take a mount reference, mounting the volume if nobody holds one.
    pub fn mount(&self) -> VstoreResult<()> {
        self.manager.mount(self)
    }

    /// Release a mount reference, unmounting on the last one.
    pub fn unmount(&self) -> UnmountOutcome {
        self.manager.unmount(self)
    }

    /// Whether the live mount table shows this volume mounted.
    pub fn is_mounted(&self) -> VstoreResult<bool> {
        self.manager.is_mounted(self)
    }

    /// Mount for the lifetime of the returned lease.
    pub fn acquire(&self) -> VstoreResult<MountLease> {
        self.mount()?;
        Ok(MountLease::new(self.clone()))
    }
}

impl PartialEq for GlusterVolume {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for GlusterVolume {}

impl Hash for GlusterVolume {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for GlusterVolume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlusterVolume")
            .field("server_addr", &self.server_addr)
            .field("id", &self.id)
            .field("mount_point", &self.mount_point)
            .finish()
    }
}

impl fmt::Display for GlusterVolume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GlusterVolume(\"{}\", {}, \"{}\")",
            self.id.server_ip, self.id.port, self.id.volume
        )
    }
}

/// Resolve a host name or literal address, preferring IPv4.
pub fn resolve_host(addr: &str) -> VstoreResult<IpAddr> {
    let literal = addr.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = literal.parse::<IpAddr>() {
        return Ok(ip);
    }

    let addrs: Vec<SocketAddr> = (addr, 0)
        .to_socket_addrs()
        .map_err(|e| VstoreError::Resolver(format!("Failed to resolve '{}': {}", addr, e)))?
        .collect();

    addrs
        .iter()
        .find(|a| a.is_ipv4())
        .or_else(|| addrs.first())
        .map(SocketAddr::ip)
        .ok_or_else(|| VstoreError::Resolver(format!("No addresses found for '{}'", addr)))
}
