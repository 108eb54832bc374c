mod app;
mod commands;
mod output;

use clap::Parser;

use crate::app::{Cli, Command};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Show mapscope info+ on stderr unless --json; --verbose enables debug; RUST_LOG overrides
    if !cli.global.json {
        let level = if cli.global.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        env_logger::Builder::new()
            .filter_module("mapscope", level)
            .parse_default_env()
            .target(env_logger::Target::Stderr)
            .format_timestamp(None)
            .format_module_path(false)
            .format_target(false)
            .init();
    }

    match &cli.command {
        Command::Report {
            mapfile,
            tc,
            devname,
        } => commands::report::run(mapfile, *tc, devname.as_deref(), &cli.global),
        Command::Chart {
            mapfile,
            output,
            no_open,
            devname,
        } => commands::chart::run(mapfile, output, *no_open, devname.as_deref()),
    }
}
