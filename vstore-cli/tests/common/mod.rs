#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use assert_cmd::Command;
use tempfile::TempDir;

/// Scratch node: allow-listed `storage/` and a Gluster mount base.
pub struct TestContext {
    pub dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("storage")).unwrap();
        std::fs::write(
            dir.path().join("file-storage-paths"),
            format!(
                "# test node\n{}\n/etc\n",
                dir.path().join("storage").display()
            ),
        )
        .unwrap();
        Self { dir }
    }

    pub fn storage(&self) -> PathBuf {
        self.dir.path().join("storage")
    }

    pub fn allowed_paths_file(&self) -> PathBuf {
        self.dir.path().join("file-storage-paths")
    }

    /// `vstore` pointed at this node's allow-list and mount base.
    pub fn new_cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_vstore"));
        cmd.timeout(Duration::from_secs(30));
        cmd.env_remove("VSTORE_CONFIG");
        cmd.env_remove("RUST_LOG");
        cmd.arg("--allowed-paths-file").arg(self.allowed_paths_file());
        cmd.arg("--gluster-mount-base").arg(self.dir.path().join("gluster"));
        cmd
    }

    pub fn path_arg(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }
}
