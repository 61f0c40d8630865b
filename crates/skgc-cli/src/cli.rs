use crate::commands::Commands;

use std::path::{Path, PathBuf};

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "skgc")]
#[command(about = "Supervisor for Minecraft Java and Bedrock dedicated servers")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,

    /// Server installation directory
    #[arg(long, global = true, default_value = ".")]
    pub(crate) root: PathBuf,
}

impl Cli {
    pub fn root(&self) -> &Path {
        &self.root
    }
}
