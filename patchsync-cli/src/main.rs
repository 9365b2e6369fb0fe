//! Patchsync — keep a dist-git spec's patch series and a Git branch in sync.
//!
//! # Usage
//!
//! ```text
//! patchsync import [SPEC] [--repo R] [--base TAG] [--head TAG] [--prefix P]
//! patchsync export [SPEC] [--repo R] [--base TAG] [--branch B] [--version X.Y]
//!                  [--release N] [--tag T] [--remote REMOTE] [--prefix P]
//! patchsync list [SPEC] [--json]
//! ```
//!
//! Both directions are meant to be run from a local dist-git checkout;
//! patch files are read and written in the current directory regardless of
//! where `--repo` points. There is no dry-run mode — commit or stash your
//! work before running this.

mod commands;
mod prompt;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{export::ExportArgs, import::ImportArgs, list::ListArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "patchsync",
    version,
    about = "Synchronize a spec file's patch series with a Git repository",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Update the spec and patch files from new commits in the repository.
    Import(ImportArgs),

    /// Rebuild the repository branch from the spec's patches, tag and push.
    Export(ExportArgs),

    /// Show the patch directives currently in the spec.
    List(ListArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Import(args) => args.run(),
        Commands::Export(args) => args.run(),
        Commands::List(args) => args.run(),
    }
}
