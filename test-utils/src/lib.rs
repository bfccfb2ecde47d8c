//! Test fakes for the vstore host seams.
//!
//! [`FakeHost`] plays both the command runner and the mount table, so a
//! scripted `mount` shows up in the table the mount manager reads back.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tempfile::TempDir;
use vstore::disk::{CreateOptions, FileHandle};
use vstore::util::{CommandOutput, CommandRunner, MountEntry, MountTable};
use vstore::volumes::{MountCommands, MountManager};
use vstore::{StorageOptions, StorageRuntime};
use vstore_shared::DiskTemplate;
use vstore_shared::errors::{VstoreError, VstoreResult};

pub const MOUNT: &str = "mount";
pub const UMOUNT: &str = "umount";
pub const GLUSTER: &str = "gluster";

/// What the fake `mount` does.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum MountBehavior {
    /// Mounts and exits 0.
    #[default]
    Mounts,
    /// Exits 0 without mounting anything.
    FalseSuccess,
    /// Exits with this code without mounting anything.
    Fails(i32),
}

/// One recorded command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

#[derive(Debug, Default)]
struct HostState {
    mounts: Vec<MountEntry>,
    calls: Vec<RecordedCall>,
    mount_behavior: MountBehavior,
    umount_fails: bool,
    volume_info: Option<CommandOutput>,
}

/// Scriptable host: records commands and keeps a fake mount table.
#[derive(Debug, Clone, Default)]
pub struct FakeHost {
    state: Arc<Mutex<HostState>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands matching the fake's program names, with a short connect timeout.
    pub fn commands() -> MountCommands {
        MountCommands {
            mount: MOUNT.to_string(),
            umount: UMOUNT.to_string(),
            gluster: Some(GLUSTER.to_string()),
            connect_timeout: Duration::from_millis(200),
        }
    }

    /// Mount manager wired to this host.
    pub fn mount_manager(&self) -> Arc<MountManager> {
        Arc::new(MountManager::new(
            Arc::new(self.clone()),
            Arc::new(self.clone()),
            Self::commands(),
        ))
    }

    pub fn set_mount_behavior(&self, behavior: MountBehavior) {
        self.state.lock().mount_behavior = behavior;
    }

    pub fn set_umount_fails(&self, fails: bool) {
        self.state.lock().umount_fails = fails;
    }

    /// Output of `gluster volume info`. `None` makes the tool unavailable.
    pub fn set_volume_info(&self, output: Option<CommandOutput>) {
        self.state.lock().volume_info = output;
    }

    /// Add a mount that exists before the test starts.
    pub fn add_mount(&self, source: &str, mount_point: &Path, fs_type: &str) {
        self.state.lock().mounts.push(MountEntry {
            source: source.to_string(),
            mount_point: mount_point.to_path_buf(),
            fs_type: fs_type.to_string(),
        });
    }

    /// Drop a mount behind the manager's back.
    pub fn remove_mount(&self, mount_point: &Path) {
        self.state
            .lock()
            .mounts
            .retain(|entry| entry.mount_point != mount_point);
    }

    pub fn is_mounted(&self, mount_point: &Path) -> bool {
        self.state
            .lock()
            .mounts
            .iter()
            .any(|entry| entry.mount_point == mount_point)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().calls.clone()
    }

    pub fn count_calls(&self, program: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.program == program)
            .count()
    }
}

/// `ip:port:volume` as passed to mount becomes `ip:volume` in the table.
fn mtab_source(fuse_source: &str) -> String {
    let mut parts = fuse_source.rsplitn(3, ':');
    let volume = parts.next().unwrap_or_default();
    let _port = parts.next();
    let ip = parts.next().unwrap_or_default();
    format!("{}:{}", ip, volume)
}

impl CommandRunner for FakeHost {
    fn run(&self, program: &str, args: &[&str], cwd: Option<&Path>) -> VstoreResult<CommandOutput> {
        let mut state = self.state.lock();
        state.calls.push(RecordedCall {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            cwd: cwd.map(Path::to_path_buf),
        });

        match program {
            MOUNT => {
                let [_, fs_type, source, target] = args else {
                    return Ok(CommandOutput::failure(1, "usage: mount -t type source target"));
                };
                match state.mount_behavior {
                    MountBehavior::Mounts => {
                        state.mounts.push(MountEntry {
                            source: mtab_source(source),
                            mount_point: PathBuf::from(*target),
                            fs_type: format!("fuse.{}", fs_type),
                        });
                        Ok(CommandOutput::success())
                    }
                    MountBehavior::FalseSuccess => Ok(CommandOutput::success()),
                    MountBehavior::Fails(code) => {
                        Ok(CommandOutput::failure(code, "Mount failed. Please check the log file"))
                    }
                }
            }
            UMOUNT => {
                if state.umount_fails {
                    return Ok(CommandOutput::failure(32, "target is busy"));
                }
                let target = args.first().map(PathBuf::from).unwrap_or_default();
                state.mounts.retain(|entry| entry.mount_point != target);
                Ok(CommandOutput::success())
            }
            GLUSTER => state.volume_info.clone().ok_or_else(|| {
                VstoreError::Command("Failed to run gluster: No such file or directory".into())
            }),
            other => Err(VstoreError::Command(format!("unexpected program {}", other))),
        }
    }
}

impl MountTable for FakeHost {
    fn entries(&self) -> VstoreResult<Vec<MountEntry>> {
        Ok(self.state.lock().mounts.clone())
    }
}

/// Scratch node: an allow-listed storage directory, a Gluster mount base
/// and a runtime wired to a [`FakeHost`].
pub struct StorageFixture {
    pub dir: TempDir,
    pub host: FakeHost,
    pub runtime: StorageRuntime,
}

impl StorageFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let storage = dir.path().join("storage");
        let mount_base = dir.path().join("gluster");
        std::fs::create_dir_all(&storage).unwrap();
        std::fs::create_dir_all(&mount_base).unwrap();

        let allowed_paths_file = dir.path().join("file-storage-paths");
        std::fs::write(
            &allowed_paths_file,
            format!("# node storage\n\n{}\n", storage.display()),
        )
        .unwrap();

        let options = StorageOptions {
            allowed_paths_file,
            gluster_mount_base: mount_base,
            ..StorageOptions::default()
        };

        let host = FakeHost::new();
        let runtime = StorageRuntime::with_mount_manager(options, host.mount_manager());
        Self { dir, host, runtime }
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.dir.path().join("storage")
    }

    pub fn mount_base(&self) -> PathBuf {
        self.dir.path().join("gluster")
    }

    /// Put a file of `size_mib` MiB at `path`, bypassing the path policy.
    pub fn place_file(&self, path: &Path, size_mib: u64) -> FileHandle {
        FileHandle::unchecked(
            path,
            DiskTemplate::File,
            CreateOptions::with_size(size_mib).create_folder(true),
        )
        .unwrap()
    }
}

impl Default for StorageFixture {
    fn default() -> Self {
        Self::new()
    }
}
