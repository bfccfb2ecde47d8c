use vstore::bdev::BlockDevice;

use super::device::{DeviceArgs, DeviceReport};

pub fn execute(args: DeviceArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let runtime = global.runtime()?;
    let mut device = runtime.attach_device(&args.request(0)?)?;
    let report = DeviceReport::of(&device)?;
    device.shutdown()?;
    super::print_json(&report)
}
