pub mod check_path;
pub mod create;
pub mod device;
pub mod grow;
pub mod remove;
pub mod size;
pub mod space;
pub mod uri;
pub mod wrong_paths;

use serde::Serialize;

/// Print a structured result on stdout.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
