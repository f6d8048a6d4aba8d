use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
pub struct Cli {
    /// Device image to mount; created and sized on first use
    pub device: PathBuf,

    /// Directory whose regular files are packed into the image's root
    #[arg(long, short)]
    pub source: Option<PathBuf>,
}
