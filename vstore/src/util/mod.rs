//! Host integration helpers: process execution, mount table, logging.

pub mod mounts;
pub mod process;

use std::io::IsTerminal;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

pub use mounts::{MountEntry, MountTable, ProcMountTable};
pub use process::{CommandOutput, CommandRunner, SystemRunner};

/// Extra context carried by each log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogFormat {
    /// Target, file and line of the event.
    pub source_locations: bool,
    pub ansi: bool,
}

impl LogFormat {
    /// Source locations from `debug` up. Colors only when stderr is a terminal.
    pub fn for_level(level: &str) -> Self {
        Self {
            source_locations: matches!(level.to_ascii_lowercase().as_str(), "debug" | "trace"),
            ansi: std::io::stderr().is_terminal(),
        }
    }
}

/// Install a stderr tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_level`. Keep the returned guard
/// alive for the lifetime of the program or buffered lines are lost.
pub fn init_logging(default_level: &str) -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let format = LogFormat::for_level(default_level);

    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(format.ansi)
        .with_target(format.source_locations)
        .with_file(format.source_locations)
        .with_line_number(format.source_locations);

    if tracing_subscriber::registry().with(filter).with(layer).try_init().is_err() {
        tracing::debug!("Global subscriber already set, keeping it");
    }
    guard
}
