//! Process-wide mount reference table.
//!
//! Several disks can live on the same Gluster volume. The volume is mounted
//! physically once, on the first reference, and unmounted when the last
//! reference goes away. Volumes are keyed by [`VolumeId`], never by object
//! identity.

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use vstore_shared::errors::{VstoreError, VstoreResult};

use super::diagnose::guess_mount_fail_reasons;
use super::{GlusterVolume, VolumeId};
use crate::util::{CommandRunner, MountEntry, MountTable, ProcMountTable, SystemRunner};

/// Filesystem type passed to `mount -t`.
const GLUSTER_FS_TYPE: &str = "glusterfs";

/// External programs used to manage mounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountCommands {
    pub mount: String,
    pub umount: String,
    /// Gluster CLI for volume status queries during diagnosis. `None` skips them.
    pub gluster: Option<String>,
    /// TCP connect timeout for the reachability check during diagnosis.
    pub connect_timeout: Duration,
}

impl Default for MountCommands {
    fn default() -> Self {
        Self {
            mount: "mount".to_string(),
            umount: "umount".to_string(),
            gluster: Some("gluster".to_string()),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Result of releasing one mount reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnmountOutcome {
    /// Other references remain; nothing was unmounted.
    Released { remaining: usize },
    /// Last reference released and the volume unmounted.
    Unmounted,
    /// No reference was held; nothing to do.
    NotMounted,
    /// The unmount utility failed. The reference is kept so a retry is possible.
    Failed(String),
}

/// Owns the reference count of every mounted volume.
///
/// The whole read-decide-update sequence of mount and unmount runs under one
/// lock, external commands included, so two callers can never both issue the
/// physical mount.
#[derive(Debug)]
pub struct MountManager {
    refs: Mutex<HashMap<VolumeId, usize>>,
    runner: Arc<dyn CommandRunner>,
    mount_table: Arc<dyn MountTable>,
    commands: MountCommands,
}

impl MountManager {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        mount_table: Arc<dyn MountTable>,
        commands: MountCommands,
    ) -> Self {
        Self {
            refs: Mutex::new(HashMap::new()),
            runner,
            mount_table,
            commands,
        }
    }

    /// Manager backed by the real host: shell commands and `/proc`.
    pub fn system(commands: MountCommands) -> Self {
        Self::new(Arc::new(SystemRunner), Arc::new(ProcMountTable), commands)
    }

    pub fn commands(&self) -> &MountCommands {
        &self.commands
    }

    /// References currently held on `id`.
    pub fn ref_count(&self, id: &VolumeId) -> usize {
        self.refs.lock().get(id).copied().unwrap_or(0)
    }

    /// Whether the live mount table shows `volume` mounted at its mount point.
    ///
    /// Only the mount source counts: another server's volume of the same name
    /// on the same mount point is not this volume.
    pub fn is_mounted(&self, volume: &GlusterVolume) -> VstoreResult<bool> {
        Ok(matches!(self.mount_state(volume)?, MountState::Ours))
    }

    /// Take one reference on `volume`, mounting it if it is the first.
    ///
    /// A held reference whose mount has vanished from the table is mounted
    /// again.
    pub fn mount(&self, volume: &GlusterVolume) -> VstoreResult<()> {
        let mut refs = self.refs.lock();
        let count = refs.get(volume.id()).copied().unwrap_or(0);

        let state = self.mount_state(volume).inspect_err(|e| {
            tracing::warn!(volume = %volume, error = %e, "Could not read the mount table");
        });

        match state {
            Ok(MountState::Ours) if count == 0 => {
                // Left over from a previous run of this process.
                tracing::info!(
                    volume = %volume,
                    mount_point = %volume.mount_point().display(),
                    "Adopting existing mount"
                );
            }
            Ok(MountState::Ours) | Err(_) if count > 0 => {
                tracing::debug!(volume = %volume, refs = count + 1, "Volume already mounted");
            }
            Ok(MountState::Foreign(entry)) => return Err(occupied_error(volume, &entry)),
            _ => {
                if count > 0 {
                    tracing::warn!(
                        volume = %volume,
                        refs = count,
                        "Volume no longer in the mount table, mounting again"
                    );
                }
                self.mount_physical(volume)?;
            }
        }

        refs.insert(volume.id().clone(), count + 1);
        Ok(())
    }

    /// Drop one reference on `volume`, unmounting it on the last one.
    pub fn unmount(&self, volume: &GlusterVolume) -> UnmountOutcome {
        let mut refs = self.refs.lock();
        let count = refs.get(volume.id()).copied().unwrap_or(0);

        match count {
            0 => {
                tracing::debug!(volume = %volume, "Unmount without a held reference ignored");
                UnmountOutcome::NotMounted
            }
            1 => {
                let mount_point = volume.mount_point().to_string_lossy();

                match self.mount_state(volume) {
                    Ok(MountState::Ours) => {}
                    Ok(MountState::Absent) => {
                        refs.remove(volume.id());
                        tracing::info!(volume = %volume, mount_point = %mount_point, "Volume was already unmounted");
                        return UnmountOutcome::Unmounted;
                    }
                    Ok(MountState::Foreign(entry)) => {
                        // umount would take down whatever sits there now.
                        refs.remove(volume.id());
                        tracing::warn!(
                            volume = %volume,
                            source = %entry.source,
                            "Mount point taken over by another mount, releasing without umount"
                        );
                        return UnmountOutcome::Unmounted;
                    }
                    Err(e) => {
                        tracing::warn!(volume = %volume, error = %e, "Could not read the mount table");
                    }
                }

                let reason = match self.runner.run(&self.commands.umount, &[&*mount_point], None) {
                    Ok(out) if out.succeeded() => None,
                    Ok(out) => Some(out.fail_reason()),
                    Err(e) => Some(e.to_string()),
                };

                if let Some(reason) = reason {
                    tracing::warn!("Failed to unmount {}: {}", volume, reason);
                    return UnmountOutcome::Failed(reason);
                }

                refs.remove(volume.id());
                tracing::info!(volume = %volume, mount_point = %mount_point, "Unmounted volume");
                UnmountOutcome::Unmounted
            }
            _ => {
                refs.insert(volume.id().clone(), count - 1);
                tracing::debug!(volume = %volume, refs = count - 1, "Released volume reference");
                UnmountOutcome::Released {
                    remaining: count - 1,
                }
            }
        }
    }

    fn mount_state(&self, volume: &GlusterVolume) -> VstoreResult<MountState> {
        Ok(match self.mount_table.find(volume.mount_point())? {
            Some(entry) if entry.source == volume.mtab_string() => MountState::Ours,
            Some(entry) => MountState::Foreign(entry),
            None => MountState::Absent,
        })
    }

    fn verify_mounted(&self, volume: &GlusterVolume) -> bool {
        self.is_mounted(volume).unwrap_or_else(|e| {
            tracing::warn!(volume = %volume, error = %e, "Could not read the mount table");
            false
        })
    }

    fn mount_physical(&self, volume: &GlusterVolume) -> VstoreResult<()> {
        let mount_point = volume.mount_point();
        let target = mount_point.to_string_lossy();

        if let Err(e) = fs::create_dir_all(mount_point) {
            let reason = format!("{}: can't create mount point: {}", target, e);
            return Err(self.mount_failed(volume, vec![reason], String::new()));
        }

        let source = volume.fuse_mount_string();
        let args = ["-t", GLUSTER_FS_TYPE, source.as_str(), &*target];

        tracing::info!(volume = %volume, mount_point = %target, "Mounting volume");

        // The exit status of mount.glusterfs is not trusted; the mount table
        // decides below.
        match self.runner.run(&self.commands.mount, &args, Some(mount_point)) {
            Ok(out) if !out.succeeded() => {
                tracing::warn!(volume = %volume, reason = %out.fail_reason(), "mount reported failure");
            }
            Err(e) => {
                tracing::warn!(volume = %volume, error = %e, "mount could not be run");
            }
            Ok(_) => {}
        }

        if self.verify_mounted(volume) {
            tracing::info!(volume = %volume, mount_point = %target, "Mounted volume");
            return Ok(());
        }

        let fallback = format!("{} {} failed.", self.commands.mount, args.join(" "));
        Err(self.mount_failed(volume, Vec::new(), fallback))
    }

    /// Aggregate `reasons` with the diagnostics for a failed mount.
    /// `fallback` is reported when nothing more specific turns up.
    fn mount_failed(
        &self,
        volume: &GlusterVolume,
        mut reasons: Vec<String>,
        fallback: String,
    ) -> VstoreError {
        reasons.extend(guess_mount_fail_reasons(volume, self.runner.as_ref(), &self.commands));
        if reasons.is_empty() {
            reasons.push(fallback);
        }

        VstoreError::BlockDevice(format!(
            "{}: failed to mount {}, reason:\n{}",
            volume.mount_point().display(),
            volume.volume_name(),
            reasons.join("\n")
        ))
    }
}

/// What the mount table shows at a volume's mount point.
#[derive(Debug)]
enum MountState {
    Ours,
    /// Something else is mounted there.
    Foreign(MountEntry),
    Absent,
}

fn occupied_error(volume: &GlusterVolume, entry: &MountEntry) -> VstoreError {
    VstoreError::BlockDevice(format!(
        "{}: already used by {} ({}), refusing to mount {} there",
        volume.mount_point().display(),
        entry.source,
        entry.fs_type,
        volume
    ))
}
