use std::path::PathBuf;

use clap::Args;

#[derive(Args, Debug)]
pub struct SpaceArgs {
    /// Any path on the filesystem to report
    pub path: PathBuf,
}

pub fn execute(args: SpaceArgs) -> anyhow::Result<()> {
    let info = vstore::disk::space_info(&args.path)?;
    super::print_json(&info)
}
