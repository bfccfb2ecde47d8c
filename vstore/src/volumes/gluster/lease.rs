//! Scoped mount references.

use super::{GlusterVolume, UnmountOutcome};

/// One mount reference on a volume, released on drop.
///
/// Use [`MountLease::release`] when the unmount outcome matters; dropping
/// the lease releases it too and only logs the outcome.
#[must_use = "dropping the lease unmounts the volume"]
#[derive(Debug)]
pub struct MountLease {
    volume: GlusterVolume,
    released: bool,
}

impl MountLease {
    pub(super) fn new(volume: GlusterVolume) -> Self {
        Self {
            volume,
            released: false,
        }
    }

    pub fn volume(&self) -> &GlusterVolume {
        &self.volume
    }

    /// Give the reference back now.
    pub fn release(mut self) -> UnmountOutcome {
        self.released = true;
        self.volume.unmount()
    }
}

impl Drop for MountLease {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let UnmountOutcome::Failed(reason) = self.volume.unmount() {
            tracing::warn!(volume = %self.volume, %reason, "Mount lease not released cleanly");
        }
    }
}
