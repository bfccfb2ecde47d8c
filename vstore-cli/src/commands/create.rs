use clap::Args;
use vstore::bdev::BlockDevice;

use super::device::{DeviceArgs, DeviceReport};

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[command(flatten)]
    pub device: DeviceArgs,

    /// Size in MiB
    #[arg(long)]
    pub size: u64,
}

pub fn execute(args: CreateArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let runtime = global.runtime()?;
    let mut device = runtime.create_device(&args.device.request(args.size)?)?;
    let report = DeviceReport::of(&device)?;
    device.shutdown()?;
    super::print_json(&report)
}
