//! Best-effort explanations for a failed Gluster mount.
//!
//! mount.glusterfs gives next to no feedback, so after a failed mount we look
//! for the usual culprits and report all of them at once.

use std::net::{SocketAddr, TcpStream};

use super::GlusterVolume;
use super::manager::MountCommands;
use crate::util::CommandRunner;

/// Collect reasons why `volume` may have failed to mount, most local first.
pub fn guess_mount_fail_reasons(
    volume: &GlusterVolume,
    runner: &dyn CommandRunner,
    commands: &MountCommands,
) -> Vec<String> {
    let mut reasons = Vec::new();
    let mount_point = volume.mount_point();

    if !mount_point.exists() {
        reasons.push(format!("{}: mount point does not exist", mount_point.display()));
    } else if !mount_point.is_dir() {
        reasons.push(format!("{}: mount point is not a directory", mount_point.display()));
    }

    // A file or directory literally named "ip:port:volume" inside the mount
    // point makes mount.glusterfs take it as the mount point and the real
    // mount point as a syntax error. No usage message is printed.
    let parser_confusing = mount_point.join(volume.fuse_mount_string());
    if parser_confusing.symlink_metadata().is_ok() {
        reasons.push(format!(
            "{}: please delete, rename or move.",
            parser_confusing.display()
        ));
    }

    let addr = SocketAddr::new(volume.server_ip(), volume.port());
    match TcpStream::connect_timeout(&addr, commands.connect_timeout) {
        Ok(_) => reasons.extend(query_volume_status(volume, runner, commands)),
        Err(e) => reasons.push(format!("{}: {}", format_endpoint(&addr), e)),
    }

    reasons
}

/// Ask the server about the volume: it must exist, be started and use tcp.
fn query_volume_status(
    volume: &GlusterVolume,
    runner: &dyn CommandRunner,
    commands: &MountCommands,
) -> Vec<String> {
    let hint = format!(
        "try running 'gluster volume info {}' on {} to ensure it exists, \
         it is started and it is using the tcp transport",
        volume.volume_name(),
        volume.server_ip()
    );

    let Some(tool) = commands.gluster.as_deref() else {
        return vec![hint];
    };

    let remote = format!("--remote-host={}", volume.server_ip());
    let output = match runner.run(tool, &[remote.as_str(), "volume", "info", volume.volume_name()], None) {
        Ok(output) => output,
        Err(e) => {
            tracing::debug!(tool, error = %e, "Volume query tool unavailable");
            return vec![hint];
        }
    };

    if !output.succeeded() {
        return vec![
            format!(
                "volume info query for {} failed: {}",
                volume.volume_name(),
                output.fail_reason()
            ),
            hint,
        ];
    }

    let status = VolumeStatus::parse(&output.stdout);
    let mut reasons = Vec::new();

    match status.status.as_deref() {
        None => reasons.push(format!(
            "volume {} is not known to {}",
            volume.volume_name(),
            volume.server_ip()
        )),
        Some("Started") => {}
        Some(other) => reasons.push(format!(
            "volume {} is not started (status: {})",
            volume.volume_name(),
            other
        )),
    }

    if let Some(transport) = status.transport.as_deref()
        && !transport.to_lowercase().contains("tcp")
    {
        reasons.push(format!(
            "volume {} does not use the tcp transport (transport: {})",
            volume.volume_name(),
            transport
        ));
    }

    reasons
}

/// The two fields of `gluster volume info` that matter for mounting.
#[derive(Debug, Default, PartialEq, Eq)]
struct VolumeStatus {
    status: Option<String>,
    transport: Option<String>,
}

impl VolumeStatus {
    fn parse(output: &str) -> Self {
        let mut status = Self::default();
        for line in output.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            match key.trim() {
                "Status" => status.status = Some(value.trim().to_string()),
                "Transport-type" => status.transport = Some(value.trim().to_string()),
                _ => {}
            }
        }
        status
    }
}

fn format_endpoint(addr: &SocketAddr) -> String {
    format!("{}:{}", addr.ip(), addr.port())
}
