//! Arguments naming one disk, shared by the device subcommands.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use vstore::bdev::{BlockDevice, DeviceRequest, UniqueId};
use vstore_shared::DiskTemplate;

#[derive(Args, Debug, Clone)]
pub struct DeviceArgs {
    /// Disk template
    #[arg(short, long, default_value = "file")]
    pub template: DiskTemplate,

    /// File driver half of the unique id
    #[arg(long, default_value = "loop")]
    pub driver: String,

    /// Backing file (relative to the volume root for gluster)
    #[arg(long)]
    pub path: String,

    /// Disk parameter, e.g. --param host=10.0.0.5 --param volume=gv0
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, String)>,
}

impl DeviceArgs {
    pub fn request(&self, size_mib: u64) -> anyhow::Result<DeviceRequest> {
        let unique_id = UniqueId::new(&self.driver, &self.path)?;
        let mut request = DeviceRequest::new(self.template, unique_id, size_mib);
        request.params.extend(self.params.iter().cloned());
        Ok(request)
    }
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

/// What device subcommands print.
#[derive(Serialize)]
pub struct DeviceReport {
    pub unique_id: UniqueId,
    pub dev_path: PathBuf,
    pub size_bytes: u64,
}

impl DeviceReport {
    pub fn of(device: &impl BlockDevice) -> anyhow::Result<Self> {
        Ok(Self {
            unique_id: device.unique_id().clone(),
            dev_path: device.dev_path().to_path_buf(),
            size_bytes: device.actual_size()?,
        })
    }
}
