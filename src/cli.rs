// src/cli.rs

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the git repository to analyze
    #[arg(value_name = "REPO")]
    pub repo: PathBuf,

    /// Directory to write the per-developer and summary JSON reports to
    #[arg(short, long, default_value = "estimation")]
    pub output: PathBuf,

    /// JSON file overriding the estimation keywords, extensions and multipliers
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Don't show a progress bar
    #[arg(short, long)]
    pub quiet: bool,
}
