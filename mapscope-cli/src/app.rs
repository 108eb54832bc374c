use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// mapscope - size reports and charts from IAR linker map files
#[derive(Debug, Parser)]
#[command(name = "mapscope", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared across all subcommands.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Emit output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print size-usage tables, or CI build-statistic lines with --tc.
    Report {
        /// Path to the linker map file.
        #[arg(value_name = "MAPFILE")]
        mapfile: PathBuf,

        /// Emit TeamCity buildStatisticValue lines instead of tables.
        #[arg(long)]
        tc: bool,

        /// Device label for report keys (default: file name before its first '.').
        #[arg(long)]
        devname: Option<String>,
    },

    /// Render a two-ring pie chart of size usage to a standalone HTML file.
    Chart {
        /// Path to the linker map file.
        #[arg(value_name = "MAPFILE")]
        mapfile: PathBuf,

        /// Output HTML file path.
        #[arg(long, default_value = "CodeSize.html")]
        output: PathBuf,

        /// Do not open the rendered chart in the default viewer.
        #[arg(long)]
        no_open: bool,

        /// Device label for the chart title (default: file name before its first '.').
        #[arg(long)]
        devname: Option<String>,
    },
}
