//! Entry point for the vstore command-line tool.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let guard = vstore::util::init_logging(cli.global.log_level());

    let result = run(cli);

    // Flush buffered log lines before exiting.
    drop(guard);
    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let global = &cli.global;
    match cli.command {
        Commands::CheckPath(args) => commands::check_path::execute(args, global),
        Commands::WrongPaths => commands::wrong_paths::execute(global),
        Commands::Space(args) => commands::space::execute(args),
        Commands::Create(args) => commands::create::execute(args, global),
        Commands::Remove(args) => commands::remove::execute(args, global),
        Commands::Grow(args) => commands::grow::execute(args, global),
        Commands::Size(args) => commands::size::execute(args, global),
        Commands::Uri(args) => commands::uri::execute(args, global),
    }
}
