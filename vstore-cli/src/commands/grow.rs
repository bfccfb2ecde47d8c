use clap::Args;
use vstore::bdev::{BlockDevice, GrowOptions};

use super::device::{DeviceArgs, DeviceReport};

#[derive(Args, Debug)]
pub struct GrowArgs {
    #[command(flatten)]
    pub device: DeviceArgs,

    /// MiB to add
    #[arg(long, allow_negative_numbers = true)]
    pub amount: i64,

    /// Only check that the disk can be grown
    #[arg(long)]
    pub dry_run: bool,
}

pub fn execute(args: GrowArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let runtime = global.runtime()?;
    let mut device = runtime.attach_device(&args.device.request(0)?)?;
    device.assemble()?;

    let options = GrowOptions {
        dry_run: args.dry_run,
        ..GrowOptions::backing_store()
    };
    device.grow(args.amount, options)?;

    let report = DeviceReport::of(&device)?;
    device.shutdown()?;
    super::print_json(&report)
}
