//! Command-line interface for the taskd server

use clap::Parser;
use std::path::PathBuf;

/// taskd - line-protocol task processing server
#[derive(Debug, Parser)]
#[command(
    name = "taskd",
    about = "Accept text-transformation tasks over TCP and run them in the background",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Interface to bind (overrides config)
    #[arg(short = 'H', long, help = "Interface to bind [default: 127.0.0.1]")]
    pub host: Option<String>,

    /// Port to bind (overrides config)
    #[arg(short = 'P', long, help = "Port to bind [default: 5000]")]
    pub port: Option<u16>,

    /// Path to config file
    #[arg(short, long, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log at DEBUG instead of INFO
    #[arg(short, long, help = "Enable debug logging")]
    pub verbose: bool,
}
