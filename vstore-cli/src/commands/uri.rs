use clap::Args;
use vstore::Hypervisor;
use vstore::bdev::BlockDevice;

use super::device::DeviceArgs;

#[derive(Args, Debug)]
pub struct UriArgs {
    #[command(flatten)]
    pub device: DeviceArgs,

    /// Hypervisor that will open the disk
    #[arg(long)]
    pub hypervisor: Hypervisor,
}

pub fn execute(args: UriArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let runtime = global.runtime()?;
    let mut device = runtime.attach_device(&args.device.request(0)?)?;
    let uri = device.userspace_access_uri(args.hypervisor);
    device.shutdown()?;
    println!("{}", uri?);
    Ok(())
}
