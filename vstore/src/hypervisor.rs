//! Hypervisors that consume block devices.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vstore_shared::errors::VstoreError;

/// Hypervisor a disk is handed to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Hypervisor {
    Kvm,
    XenPvm,
    XenHvm,
    Lxc,
    Chroot,
    Fake,
}

impl Hypervisor {
    pub const ALL: [Hypervisor; 6] = [
        Hypervisor::Kvm,
        Hypervisor::XenPvm,
        Hypervisor::XenHvm,
        Hypervisor::Lxc,
        Hypervisor::Chroot,
        Hypervisor::Fake,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Hypervisor::Kvm => "kvm",
            Hypervisor::XenPvm => "xen-pvm",
            Hypervisor::XenHvm => "xen-hvm",
            Hypervisor::Lxc => "lxc",
            Hypervisor::Chroot => "chroot",
            Hypervisor::Fake => "fake",
        }
    }

    /// Whether the hypervisor can open `gluster://` URIs itself, without a
    /// local mount.
    pub fn supports_gluster_userspace(&self) -> bool {
        matches!(self, Hypervisor::Kvm)
    }
}

impl fmt::Display for Hypervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Hypervisor {
    type Err = VstoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hypervisor::ALL
            .into_iter()
            .find(|h| h.as_str() == s.to_lowercase())
            .ok_or_else(|| {
                VstoreError::Config(format!(
                    "Unknown hypervisor: '{}'. Supported: kvm, xen-pvm, xen-hvm, lxc, chroot, fake",
                    s
                ))
            })
    }
}
