//! `patchsync export` — rebuild the repository branch from the spec's
//! patches, then tag and push.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use patchsync_core::specfile;
use patchsync_engine::{ExportEngine, ExportOptions};
use patchsync_git::ShellRunner;

use super::defaults;
use crate::prompt::TerminalPrompter;

/// Arguments for `patchsync export`.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Spec file to read patches from (default: the single *.spec in the
    /// current directory).
    pub spec: Option<PathBuf>,

    /// Repository to apply the patches in
    /// (default: git config `patchsync.upstream`).
    #[arg(short, long, value_name = "REPO")]
    pub repo: Option<String>,

    /// Tag of the upstream release to reset the branch to
    /// (default: v%{upstream_version} from the spec).
    #[arg(short, long, value_name = "TAG")]
    pub base: Option<String>,

    /// Branch to apply patches on (default: <prefix>-<version>).
    #[arg(short = 'f', long, value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Package version, e.g. 3.12 (default: extracted from the spec name).
    #[arg(short = 'v', long, value_name = "X.Y")]
    pub version: Option<String>,

    /// Release number, e.g. 15 (default: extracted from the spec's Release).
    #[arg(short = 'x', long, value_name = "N")]
    pub release: Option<String>,

    /// Tag to create (default: <prefix>-<upstream version>-<release>).
    #[arg(short, long, value_name = "TAG")]
    pub tag: Option<String>,

    /// Remote to push the tag and branch to.
    #[arg(long, default_value = "origin")]
    pub remote: String,

    /// Prefix for derived branch and tag names.
    #[arg(long, default_value = "fedora")]
    pub prefix: String,
}

impl ExportArgs {
    pub fn run(self) -> Result<()> {
        let runner = ShellRunner;
        let workdir = std::env::current_dir().context("cannot determine current directory")?;

        let spec = defaults::find_spec_in(&workdir, self.spec)?;
        let version = match self.version {
            Some(version) => version,
            None => {
                let name = spec
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let Some(version) = defaults::version_from_spec_name(&name) else {
                    bail!(
                        "Could not get a version from the spec name. \
                         Specify --version explicitly."
                    );
                };
                defaults::announce(format!("Assuming --version={version}"));
                version
            }
        };
        defaults::validate_version(&version)?;

        let spec_text = specfile::load(&spec)?;
        let repo = defaults::resolve_repo(&runner, self.repo)?;
        let base = defaults::resolve_base(&runner, &spec_text, self.base)?;

        let release = match self.release {
            Some(release) => release,
            None => {
                let Some(release) = specfile::release(&spec_text) else {
                    bail!("Release not found in the spec; specify --release explicitly.");
                };
                defaults::announce(format!("Assuming --release={release}"));
                release
            }
        };

        let directives = specfile::scan_directives(&spec_text)?;
        defaults::announce(format!(
            "Found {} patches in {}",
            directives.len(),
            spec.display()
        ));

        let branch = self
            .branch
            .unwrap_or_else(|| format!("{}-{version}", self.prefix));
        let upstream_version = base.trim_start_matches('v');
        let tag = self
            .tag
            .unwrap_or_else(|| format!("{}-{upstream_version}-{release}", self.prefix));

        let prompter = TerminalPrompter;
        let engine = ExportEngine::new(&runner, &prompter, &repo, &workdir);
        let outcome = engine
            .run(
                &directives,
                &ExportOptions {
                    branch: branch.clone(),
                    base,
                    tag,
                    remote: self.remote,
                },
            )
            .context("export failed")?;

        println!(
            "✓ applied {} patches on {branch}, tagged {}",
            outcome.applied, outcome.tag
        );
        println!("{}", "OK".green());
        Ok(())
    }
}
