//! Integration tests for mount failure diagnostics.
//!
//! The fake mount utility exits 0 without mounting, which the manager must
//! notice from the mount table and explain.

use std::fs;
use std::net::TcpListener;
use std::path::Path;
use std::sync::Arc;

use vstore::util::CommandOutput;
use vstore::volumes::{GlusterVolume, MountManager};
use vstore::VstoreError;
use vstore_test_utils::{FakeHost, GLUSTER, MountBehavior};

/// A port on localhost nothing listens on.
fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn volume(manager: &Arc<MountManager>, base: &Path, port: u16) -> GlusterVolume {
    GlusterVolume::new("127.0.0.1", port, "testvol", base, Arc::clone(manager)).unwrap()
}

fn mount_error(vol: &GlusterVolume) -> String {
    match vol.mount() {
        Err(VstoreError::BlockDevice(msg)) => msg,
        other => panic!("expected a block device error, got {:?}", other),
    }
}

#[test]
fn test_false_success_is_detected() {
    let base = tempfile::TempDir::new().unwrap();
    let host = FakeHost::new();
    host.set_mount_behavior(MountBehavior::FalseSuccess);
    let manager = host.mount_manager();
    let vol = volume(&manager, base.path(), closed_port());

    let msg = mount_error(&vol);
    assert!(msg.contains("failed to mount testvol"));
    assert!(msg.contains(&format!("127.0.0.1:{}", vol.port())));
    assert_eq!(manager.ref_count(vol.id()), 0);
}

#[test]
fn test_stray_mount_string_path_is_reported() {
    let base = tempfile::TempDir::new().unwrap();
    let host = FakeHost::new();
    host.set_mount_behavior(MountBehavior::FalseSuccess);
    let manager = host.mount_manager();
    let vol = volume(&manager, base.path(), closed_port());

    fs::create_dir_all(vol.mount_point()).unwrap();
    let stray = vol.mount_point().join(vol.fuse_mount_string());
    fs::write(&stray, b"").unwrap();

    let msg = mount_error(&vol);
    assert!(msg.contains(&format!("{}: please delete, rename or move.", stray.display())));
}

#[test]
fn test_failing_mount_is_still_verified() {
    let base = tempfile::TempDir::new().unwrap();
    let host = FakeHost::new();
    host.set_mount_behavior(MountBehavior::Fails(1));
    let manager = host.mount_manager();
    let vol = volume(&manager, base.path(), closed_port());

    mount_error(&vol);
    // A later healthy mount succeeds and starts counting from scratch.
    host.set_mount_behavior(MountBehavior::Mounts);
    vol.mount().unwrap();
    assert_eq!(manager.ref_count(vol.id()), 1);
}

#[test]
fn test_volume_status_is_queried_when_reachable() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let base = tempfile::TempDir::new().unwrap();
    let host = FakeHost::new();
    host.set_mount_behavior(MountBehavior::FalseSuccess);
    host.set_volume_info(Some(CommandOutput::success().with_stdout(
        "Volume Name: testvol\nStatus: Stopped\nTransport-type: rdma\n",
    )));
    let manager = host.mount_manager();
    let vol = volume(&manager, base.path(), port);

    let msg = mount_error(&vol);
    assert!(msg.contains("volume testvol is not started (status: Stopped)"));
    assert!(msg.contains("does not use the tcp transport"));

    let query = host
        .calls()
        .into_iter()
        .find(|call| call.program == GLUSTER)
        .unwrap();
    assert_eq!(
        query.args,
        vec!["--remote-host=127.0.0.1", "volume", "info", "testvol"]
    );
}

#[test]
fn test_missing_query_tool_gives_hint() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let base = tempfile::TempDir::new().unwrap();
    let host = FakeHost::new();
    host.set_mount_behavior(MountBehavior::FalseSuccess);
    host.set_volume_info(None);
    let manager = host.mount_manager();
    let vol = volume(&manager, base.path(), port);

    let msg = mount_error(&vol);
    assert!(msg.contains("try running 'gluster volume info testvol' on 127.0.0.1"));
}

#[test]
fn test_mount_point_that_is_a_file_is_diagnosed() {
    let base = tempfile::TempDir::new().unwrap();
    let host = FakeHost::new();
    let manager = host.mount_manager();
    let vol = volume(&manager, base.path(), closed_port());
    fs::write(vol.mount_point(), b"").unwrap();

    let msg = mount_error(&vol);
    assert!(msg.contains("can't create mount point"));
    assert!(msg.contains("mount point is not a directory"));
    assert_eq!(host.count_calls(vstore_test_utils::MOUNT), 0);
    assert_eq!(manager.ref_count(vol.id()), 0);
}
