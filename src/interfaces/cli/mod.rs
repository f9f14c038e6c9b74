use std::path::PathBuf;

use clap::Parser;

use crate::io::format::dbnet_output;

const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

/// Logs a nicely formatted dbnet heading to the `dbnet-output` logger.
pub fn log_heading() {
    let version = if let Some(ver) = VERSION {
        format!("v{ver}")
    } else {
        "v unknown".to_string()
    };
    dbnet_output!("╭──────────────────────────────────────────────────────────────╮");
    dbnet_output!("│      ___  ___   _  _ ___ _____                               │");
    dbnet_output!("│     |   \\| _ ) | \\| | __|_   _|                              │");
    dbnet_output!("│     | |) | _ \\ | .` | _|  | |                                │");
    dbnet_output!("│     |___/|___/ |_|\\_|___| |_|                                │");
    dbnet_output!("│                                                              │");
    dbnet_output!("│     Symmetry-reduced jump networks for dumbbell diffusion    │");
    dbnet_output!("│{version:>61} │");
    dbnet_output!("╰──────────────────────────────────────────────────────────────╯");
    dbnet_output!("");
}

/// Command-line arguments of the `dbnet` binary.
#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// The YAML configuration file. A default configuration is used if absent.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// The file to which the output report is written, in addition to the terminal.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Logs debugging information from the network construction.
    #[arg(short, long)]
    pub debug: bool,
}
