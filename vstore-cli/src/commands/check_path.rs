use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use vstore_shared::DiskTemplate;

#[derive(Args, Debug)]
pub struct CheckPathArgs {
    /// Path to check
    pub path: PathBuf,

    /// Disk template(s) the path is for (all file-based templates if omitted)
    #[arg(short, long = "template")]
    pub templates: Vec<DiskTemplate>,

    /// Accept an allow-listed directory itself, not only paths below it
    #[arg(long)]
    pub exact: bool,

    /// Also require an existing, writable directory
    #[arg(long)]
    pub usable: bool,
}

#[derive(Serialize)]
struct Accepted<'a> {
    path: &'a PathBuf,
    accepted: bool,
}

pub fn execute(args: CheckPathArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let policy = global.options()?.path_policy();

    if args.usable {
        if let Some(reason) = policy.check_file_storage_path(&args.path, &args.templates) {
            anyhow::bail!(reason);
        }
    } else {
        policy.check_acceptance(&args.path, &args.templates, args.exact)?;
    }

    super::print_json(&Accepted {
        path: &args.path,
        accepted: true,
    })
}
