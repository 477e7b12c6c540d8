pub mod decode;
pub mod device;

#[cfg(test)]
mod decode_test;

use std::{error::Error, path::PathBuf};

use clap::{Parser, Subcommand};

use decode::handle_decode;
use device::handle_devices;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the xusbd daemon (default)
    Run {
        /// Path to the configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// List attached controller interfaces
    Devices,
    /// Decode one packet given as hex
    Decode {
        /// Decode the packet as received from a wireless adapter
        #[arg(short, long)]
        wireless: bool,
        /// Packet bytes, e.g. "00 14 00 10"
        hex: Vec<String>,
    },
}

/// Run the given non-daemon command
pub fn main_cli(cmd: Commands) -> Result<(), Box<dyn Error + Send + Sync>> {
    match cmd {
        Commands::Run { .. } => (),
        Commands::Devices => handle_devices()?,
        Commands::Decode { wireless, hex } => handle_decode(wireless, hex.join(" ").as_str())?,
    }

    Ok(())
}
