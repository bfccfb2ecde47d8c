use vstore::bdev::BlockDevice;

use super::device::DeviceArgs;

pub fn execute(args: DeviceArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let runtime = global.runtime()?;
    let mut device = runtime.attach_device(&args.request(0)?)?;
    device.remove()?;
    device.shutdown()?;
    println!("{}", device.dev_path().display());
    Ok(())
}
