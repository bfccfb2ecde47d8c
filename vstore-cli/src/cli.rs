use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use vstore::{StorageOptions, StorageRuntime};
use vstore_shared::constants::envs;

use crate::commands;

/// vstore - manage file and Gluster backed VM disks on this node
#[derive(Parser, Debug)]
#[command(name = "vstore", author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalFlags,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalFlags {
    /// JSON configuration file
    #[arg(long, global = true, env = envs::VSTORE_CONFIG)]
    pub config: Option<PathBuf>,

    /// Override the file storage allow-list location
    #[arg(long, global = true)]
    pub allowed_paths_file: Option<PathBuf>,

    /// Override the directory Gluster volumes are mounted under
    #[arg(long, global = true)]
    pub gluster_mount_base: Option<PathBuf>,

    /// Log more (-v info, -vv debug, -vvv trace). RUST_LOG wins if set.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

impl GlobalFlags {
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Configuration file (if any) with command-line overrides applied.
    pub fn options(&self) -> anyhow::Result<StorageOptions> {
        let mut options = match &self.config {
            Some(path) => StorageOptions::load(path)?,
            None => StorageOptions::default(),
        };
        if let Some(file) = &self.allowed_paths_file {
            options.allowed_paths_file = file.clone();
        }
        if let Some(base) = &self.gluster_mount_base {
            options.gluster_mount_base = base.clone();
        }
        Ok(options)
    }

    pub fn runtime(&self) -> anyhow::Result<StorageRuntime> {
        Ok(StorageRuntime::new(self.options()?))
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that a path may hold file storage
    CheckPath(commands::check_path::CheckPathArgs),

    /// List allow-list entries that can never be used
    WrongPaths,

    /// Report capacity of the filesystem holding a path
    Space(commands::space::SpaceArgs),

    /// Create a disk
    Create(commands::create::CreateArgs),

    /// Remove a disk's backing file
    Remove(commands::device::DeviceArgs),

    /// Grow a disk
    Grow(commands::grow::GrowArgs),

    /// Report the size of a disk's backing file
    Size(commands::device::DeviceArgs),

    /// Print the URI a hypervisor can open a disk with directly
    Uri(commands::uri::UriArgs),
}
