mod commands;
mod common;
mod package;
mod repo;
mod ui;

use clap::Parser;

use crate::commands::Commands;
use crate::ui::prelude::*;

/// Mopm (Manager Of Package Managers) is a meta package manager for cross platform environments.
#[derive(Parser, Debug)]
#[command(name = "mopm", author, version, about, long_about = None)]
struct Cli {
    /// Print state transitions and skipped files
    #[arg(short, long, global = true)]
    debug: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() {
    let cli = Cli::parse();

    ui::init(cli.output, !cli.no_color);
    ui::set_debug_mode(cli.debug);

    if let Err(err) = commands::handle(&cli.command) {
        emit(Level::Error, "error", &format!("{:#}", err), None);
        std::process::exit(1);
    }
}
