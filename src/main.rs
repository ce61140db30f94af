//! s2series CLI entrypoint.
//!
//! Provides a thin wrapper over the `cli` module: parse args, run one selection
//! from saved catalog pages to an output directory, and exit with appropriate status.
//! For programmatic use, prefer the library API (`s2series::api`).

use clap::Parser;

mod cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::CliArgs::parse();
    cli::run(args)
}
