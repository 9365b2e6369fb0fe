//! Argument defaulting shared by `import` and `export`.
//!
//! Every value the operator leaves out is derived from the spec file, the
//! spec's filename, or git config — and announced in yellow so the run is
//! reproducible by hand. Anything underivable is a usage error before any
//! side effect.
//!
//! Every filesystem-touching helper has an `_in(dir, …)` form taking an
//! explicit directory; tests always use that form.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use colored::Colorize;

use patchsync_core::specfile;
use patchsync_git::{CmdRequest, CommandRunner, Git};

/// Git config key naming the upstream repository clone.
pub const REPO_CONFIG_KEY: &str = "patchsync.upstream";

/// Announce an assumed default, the way an operator would want to re-type it.
pub fn announce(message: impl AsRef<str>) {
    eprintln!("{}", message.as_ref().yellow());
}

/// The spec to operate on: the given path, or the single `*.spec` in `dir`.
pub fn find_spec_in(dir: &Path, spec: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = spec {
        return Ok(path);
    }
    let mut specs: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("cannot read {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|ext| ext == "spec").unwrap_or(false))
        .collect();
    specs.sort();
    if specs.len() != 1 {
        bail!(
            "Either there must be a single spec file in the current directory, \
             or SPEC must be given."
        );
    }
    let spec = specs.remove(0);
    announce(format!("Assuming SPEC is {}", spec.display()));
    Ok(spec)
}

/// The upstream repository: `--repo`, or the `patchsync.upstream` git
/// config value of the current directory.
pub fn resolve_repo(runner: &dyn CommandRunner, repo: Option<String>) -> Result<String> {
    if let Some(repo) = repo {
        return Ok(repo);
    }
    let here = Git::new(runner, ".");
    match here.config_get(REPO_CONFIG_KEY)? {
        Some(repo) => {
            announce(format!("Assuming --repo={repo}"));
            Ok(repo)
        }
        None => bail!(
            "Could not find the upstream repo. Configure it with \
             `git config {REPO_CONFIG_KEY} .../cpython` or specify --repo explicitly."
        ),
    }
}

/// The upstream base tag: `--base`, or `v<upstream_version>` with the
/// version evaluated by rpm from the spec's `%global` definitions.
pub fn resolve_base(
    runner: &dyn CommandRunner,
    spec_text: &str,
    base: Option<String>,
) -> Result<String> {
    if let Some(base) = base {
        return Ok(base);
    }
    if !specfile::defines_upstream_version(spec_text) {
        bail!(
            "Tag of the upstream release not found in the spec; \
             specify --base explicitly."
        );
    }
    let mut request = CmdRequest::new("rpm");
    for definition in specfile::global_definitions(spec_text) {
        request = request.arg(format!("-D{definition}"));
    }
    let out = runner.run(&request.args(["--eval", "%upstream_version"]))?;
    let base = format!("v{}", out.stdout.trim());
    announce(format!("Assuming --base={base}"));
    Ok(base)
}

/// The release number as rpm evaluates it for this spec.
pub fn rpm_release(runner: &dyn CommandRunner, spec: &Path) -> Result<String> {
    let out = runner.run(
        &CmdRequest::new("rpm")
            .args(["--undefine=dist", "--queryformat=%{release}\n", "--specfile"])
            .arg(spec.display().to_string()),
    )?;
    out.stdout
        .lines()
        .next()
        .map(str::to_owned)
        .context("rpm reported no release for the spec")
}

/// Package version derived from the spec filename: `python3.12.spec` →
/// `3.12`, and the dotless legacy form `python312.spec` → `3.1.2`-style
/// expansion (every digit becomes a component).
pub fn version_from_spec_name(name: &str) -> Option<String> {
    let stem = name.strip_suffix(".spec")?;
    let digits_start = stem.find(|c: char| c.is_ascii_digit())?;
    let version = &stem[digits_start..];
    if !version.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    if version.contains('.') {
        Some(version.to_owned())
    } else {
        Some(
            version
                .chars()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join("."),
        )
    }
}

/// A version must be dot-separated integers.
pub fn validate_version(version: &str) -> Result<()> {
    let valid = !version.is_empty()
        && version
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
    if !valid {
        bail!("--version must be dot-separated integers, got {version:?}");
    }
    Ok(())
}
