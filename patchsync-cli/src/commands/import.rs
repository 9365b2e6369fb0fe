//! `patchsync import` — update the spec and patch files from new commits.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use patchsync_core::specfile;
use patchsync_engine::{EngineError, ImportEngine};
use patchsync_git::ShellRunner;

use super::defaults;

/// Arguments for `patchsync import`.
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Spec file to update (default: the single *.spec in the current directory).
    pub spec: Option<PathBuf>,

    /// Repository with the upstream code and patch commits
    /// (default: git config `patchsync.upstream`).
    #[arg(short, long, value_name = "REPO")]
    pub repo: Option<String>,

    /// Tag of the upstream release the series is based on
    /// (default: v%{upstream_version} from the spec).
    #[arg(short, long, value_name = "TAG")]
    pub base: Option<String>,

    /// Tag or branch to take patches from
    /// (default: <prefix>-<upstream version>-<release>).
    #[arg(short = 'f', long, value_name = "TAG")]
    pub head: Option<String>,

    /// Prefix for derived branch and tag names.
    #[arg(long, default_value = "fedora")]
    pub prefix: String,
}

impl ImportArgs {
    pub fn run(self) -> Result<()> {
        let runner = ShellRunner;
        let workdir = std::env::current_dir().context("cannot determine current directory")?;

        let spec = defaults::find_spec_in(&workdir, self.spec)?;
        let spec_text = specfile::load(&spec)?;
        let repo = defaults::resolve_repo(&runner, self.repo)?;
        let base = defaults::resolve_base(&runner, &spec_text, self.base)?;
        let upstream_version = base.trim_start_matches('v').to_owned();

        let head = match self.head {
            Some(head) => head,
            None => {
                let release = defaults::rpm_release(&runner, &spec)?;
                let head = format!("{}-{upstream_version}-{release}", self.prefix);
                defaults::announce(format!("Assuming --head={head}"));
                head
            }
        };

        let engine = ImportEngine::new(&runner, &repo, &spec, &workdir);
        let outcome = match engine.run(&base, &head) {
            Ok(outcome) => outcome,
            Err(err @ EngineError::RevList { .. }) => {
                print_range_hints(&repo, &base, &head, &upstream_version);
                return Err(err.into());
            }
            Err(err) => return Err(err).context("import failed"),
        };

        println!(
            "✓ imported {} patches into {}",
            outcome.patches.len(),
            outcome.spec_path.display()
        );
        for path in &outcome.written {
            println!("  ✎  {}", path.display());
        }
        println!("{}", "OK".green());
        Ok(())
    }
}

/// An unresolvable range usually means a forgotten bump or rebase; spell
/// both out so the operator can fix it without reading the source.
fn print_range_hints(repo: &str, base: &str, head: &str, upstream_version: &str) {
    eprintln!(
        "{}",
        "Expected commits were not found. Specify --base or --head explicitly.".red()
    );
    eprintln!("Or did you forget one of these?");
    let bump = format!("rpmdev-bumpspec *.spec -c 'Update to {upstream_version}'").cyan();
    eprintln!("- $ {bump}");
    eprintln!(
        "- Rebase the downstream branch in {} onto {} and tag it as {}",
        repo.cyan(),
        base.cyan(),
        head.cyan()
    );
}
