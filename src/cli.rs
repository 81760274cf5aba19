use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    #[clap(
        short,
        long,
        help = "Path to the settings file (default: settings.yaml beside the executable)"
    )]
    pub settings: Option<PathBuf>,
    #[clap(long, help = "Override the storage host from the settings file")]
    pub host: Option<String>,
    #[clap(long, help = "Override the storage port from the settings file")]
    pub port: Option<u16>,
    #[clap(long, help = "Keep processing the remaining directories when an existence guard trips")]
    pub keep_going: bool,
    #[clap(long, help = "Scan and probe only; upload nothing, move nothing")]
    pub dry_run: bool,
    #[clap(long, help = "Emit a single-line JSON run summary on stdout")]
    pub json: bool,
    #[clap(short, long, help = "Suppress progress bars and the console summary")]
    pub quiet: bool,
    #[clap(short, long, help = "Print verbose diagnostic logs for debugging")]
    pub verbose: bool,
}
