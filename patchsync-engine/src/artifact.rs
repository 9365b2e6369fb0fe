//! Patch artifact construction: one commit → one staged patch file plus the
//! metadata the spec's patch section needs.
//!
//! The diff is generated with fixed formatting flags (minimal context,
//! rename detection, 78-char hunk-header abbreviation, no signature) so the
//! patch id stays stable across runs; the comment block is the commit
//! message minus mechanical noise.

use std::collections::BTreeMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use patchsync_core::{PatchId, PatchInformation, PatchNumber};
use patchsync_git::Git;

use crate::error::{io_err, EngineError};
use crate::resolve;

/// The patch that removes the bundled setuptools/pip wheels; its diff also
/// carries the bundled version numbers, extracted into a spec trailer.
pub const BUNDLED_VERSIONS_PATCH: PatchNumber = PatchNumber(189);

static BUNDLED_VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^-_([A-Z]+)_VERSION = "([0-9.]+)""#).unwrap());

static CHERRY_PICK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(cherry picked from commit .{40}\)$").unwrap());

const BUNDLED_VERSIONS_BLURB: &str = "\n\
# The following versions of setuptools/pip are bundled when this patch is not applied.\n\
# The versions are written in Lib/ensurepip/__init__.py, this patch removes them.\n\
# When the bundled setuptools/pip wheel is updated, the patch no longer applies cleanly.\n\
# In such cases, the patch needs to be amended and the versions updated here:\n";

/// Builds one [`PatchInformation`] per commit, staging the patch file under
/// `staging` and looking existing patch files up in `patch_dir`.
pub struct ArtifactBuilder<'a> {
    git: &'a Git<'a>,
    patch_dir: &'a Path,
    staging: &'a Path,
}

impl<'a> ArtifactBuilder<'a> {
    pub fn new(git: &'a Git<'a>, patch_dir: &'a Path, staging: &'a Path) -> Self {
        Self {
            git,
            patch_dir,
            staging,
        }
    }

    /// Materialize `commit` as a patch: resolve identity, write the diff to
    /// the staging directory, fingerprint it, and assemble the comment.
    pub fn build(&self, commit: &str) -> Result<PatchInformation, EngineError> {
        let message = self.git.commit_message(commit)?;
        let (summary, body) = split_message(&message);
        let short = &commit[..commit.len().min(9)];

        let identity = resolve::resolve(short, summary, &message, self.patch_dir)?;
        tracing::debug!("{short} resolved to patch {}", identity.number);

        let patch_path = self.staging.join(&identity.filename);
        self.git.format_patch(commit, &patch_path)?;
        let diff =
            std::fs::read_to_string(&patch_path).map_err(|e| io_err(&patch_path, e))?;
        let patch_id = PatchId::from(self.git.patch_id(&diff)?);

        let comment = build_comment(identity.number, summary, body);
        let trailer = if identity.number == BUNDLED_VERSIONS_PATCH {
            Some(bundled_versions_trailer(&diff)?)
        } else {
            None
        };

        Ok(PatchInformation {
            number: identity.number,
            patch_id,
            comment,
            filename: identity.filename,
            trailer,
        })
    }
}

/// Split a full commit message into its summary line and the rest.
fn split_message(message: &str) -> (&str, &str) {
    match message.split_once('\n') {
        Some((summary, body)) => (summary, body),
        None => (message, ""),
    }
}

/// Assemble the spec comment for one patch.
///
/// Legacy filename summaries carry their text in the body, behind a
/// `NNNNN #` boilerplate header; numeric summaries contribute the summary
/// itself (minus the number prefix) plus the body. Either way, mechanical
/// noise — `Co-authored-by:` trailers and cherry-pick provenance — is
/// dropped.
fn build_comment(number: PatchNumber, summary: &str, body: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();

    if summary.ends_with(".patch") {
        let body = body.trim();
        let body = body
            .strip_prefix(&format!("{} #\n", number.padded()))
            .unwrap_or(body);
        lines.extend(body.lines().filter(|line| !is_noise(line)));
    } else {
        lines.push(resolve::strip_number_prefix(summary));
        lines.extend(body.lines().filter(|line| !is_noise(line)));
    }

    lines.join("\n").trim().to_owned()
}

fn is_noise(line: &str) -> bool {
    let lowered = line.to_lowercase();
    lowered.starts_with("co-authored-by:") || CHERRY_PICK_RE.is_match(line)
}

/// Scan the bundled-versions patch for `-_<NAME>_VERSION = "<version>"`
/// removals and render the `%global` trailer, one version per name, sorted.
fn bundled_versions_trailer(diff: &str) -> Result<String, EngineError> {
    let mut versions: BTreeMap<String, String> = BTreeMap::new();
    for line in diff.lines() {
        if let Some(caps) = BUNDLED_VERSION_RE.captures(line.trim()) {
            let name = caps[1].to_owned();
            if versions.contains_key(&name) {
                return Err(EngineError::DuplicateBundledVersion { name });
            }
            versions.insert(name, caps[2].to_owned());
        }
    }

    let mut trailer = BUNDLED_VERSIONS_BLURB.to_owned();
    for (name, version) in &versions {
        trailer.push_str(&format!(
            "%global {}_version {}\n",
            name.to_lowercase(),
            version
        ));
    }
    Ok(trailer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRunner;
    use tempfile::TempDir;

    const DIFF: &str = "\
From 0000000000000000000000000000000000000000 Mon Sep 17 00:00:00 2001
From: A Developer <dev@example.org>
Subject: [PATCH] Fix thing

---
 thing.c | 2 +-
 1 file changed, 1 insertion(+), 1 deletion(-)
";

    fn build_with(message: &str, diff: &str) -> PatchInformation {
        let patch_dir = TempDir::new().unwrap();
        let staging = TempDir::new().unwrap();
        let runner = ScriptedRunner::new(vec![
            ("git show -s --format=%B deadbeef123", 0, message),
            (
                "git format-patch --stdout -1 --minimal --patience --abbrev=78 --find-renames --zero-commit --no-signature deadbeef123",
                0,
                diff,
            ),
            ("git patch-id --stable", 0, "fedcba98 deadbeef123\n"),
        ]);
        let git = Git::new(&runner, "/repo");
        let builder = ArtifactBuilder::new(&git, patch_dir.path(), staging.path());
        let info = builder.build("deadbeef123").expect("build");
        runner.assert_exhausted();

        let staged = staging.path().join(&info.filename);
        assert_eq!(std::fs::read_to_string(staged).unwrap(), diff);
        info
    }

    #[test]
    fn numeric_style_comment_is_summary_plus_filtered_body() {
        let info = build_with(
            "00042: Fix thing\n\nLong explanation.\nCo-Authored-By: Bot <bot@example.org>\n(cherry picked from commit 0123456789012345678901234567890123456789)\nFinal line.",
            DIFF,
        );
        assert_eq!(info.number, PatchNumber(42));
        assert_eq!(info.patch_id, PatchId::from("fedcba98"));
        assert_eq!(info.filename, "fix-thing.patch");
        assert_eq!(info.comment, "Fix thing\n\nLong explanation.\nFinal line.");
        assert!(info.trailer.is_none());
    }

    #[test]
    fn legacy_style_comment_drops_the_boilerplate_header() {
        let info = build_with(
            "old-fix.patch\n\n00016 #\nWhy this patch exists.\nSecond line.",
            DIFF,
        );
        assert_eq!(info.number, PatchNumber(16));
        assert_eq!(info.filename, "old-fix.patch");
        assert_eq!(info.comment, "Why this patch exists.\nSecond line.");
    }

    #[test]
    fn legacy_style_filters_cherry_pick_provenance() {
        // Scenario: number recovered from a digit run in the body, and the
        // provenance line never reaches the spec comment.
        let info = build_with(
            "old-fix.patch\n\nbug 12345 found\n(cherry picked from commit 0123456789012345678901234567890123456789)",
            DIFF,
        );
        assert_eq!(info.number, PatchNumber(12345));
        assert_eq!(info.comment, "bug 12345 found");
    }

    #[test]
    fn bundled_versions_patch_gets_a_sorted_trailer() {
        let diff = format!(
            "{DIFF}-_SETUPTOOLS_VERSION = \"65.5.0\"\n-_PIP_VERSION = \"22.3\"\n+removed\n"
        );
        let info = build_with("00189: Don't use bundled wheels", &diff);
        let trailer = info.trailer.expect("trailer");
        let pip = trailer.find("%global pip_version 22.3").expect("pip line");
        let setuptools = trailer
            .find("%global setuptools_version 65.5.0")
            .expect("setuptools line");
        assert!(pip < setuptools, "names must sort ascending: {trailer}");
        assert!(trailer.starts_with("\n# The following versions"));
    }

    #[test]
    fn duplicate_bundled_version_name_is_fatal() {
        let diff = format!("{DIFF}-_PIP_VERSION = \"22.3\"\n-_PIP_VERSION = \"22.4\"\n");
        let patch_dir = TempDir::new().unwrap();
        let staging = TempDir::new().unwrap();
        let runner = ScriptedRunner::new(vec![
            ("git show -s --format=%B deadbeef123", 0, "00189: Wheels"),
            (
                "git format-patch --stdout -1 --minimal --patience --abbrev=78 --find-renames --zero-commit --no-signature deadbeef123",
                0,
                &diff,
            ),
            ("git patch-id --stable", 0, "fedcba98 deadbeef123\n"),
        ]);
        let git = Git::new(&runner, "/repo");
        let builder = ArtifactBuilder::new(&git, patch_dir.path(), staging.path());
        let err = builder.build("deadbeef123").unwrap_err();
        match err {
            EngineError::DuplicateBundledVersion { name } => assert_eq!(name, "PIP"),
            other => panic!("expected DuplicateBundledVersion, got {other:?}"),
        }
    }

    #[test]
    fn indented_version_lines_still_match() {
        let trailer = bundled_versions_trailer("  -_PIP_VERSION = \"22.3\"\n").unwrap();
        assert!(trailer.contains("%global pip_version 22.3"));
    }
}
