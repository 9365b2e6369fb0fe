//! Patch identity resolution from commit messages.
//!
//! Two summary styles are accepted:
//!
//! 1. numeric-prefixed — `NNNNN: Summary line`; the digits are the number
//!    and the filename is an existing `NNNNN-*.patch` (exactly one) or a
//!    slug of the summary
//! 2. legacy filename — the summary *is* a `.patch` filename; the number
//!    comes from the first 5-or-more-digit run in the full message, or from
//!    the historical filename table
//!
//! Anything else cannot be synchronized and fails resolution.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use patchsync_core::PatchNumber;

use crate::error::{io_err, EngineError};

static NUMBER_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+):").unwrap());

static SAFE_FILENAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._-]+$").unwrap());

static LONG_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{5,}").unwrap());

static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9_-]+").unwrap());

/// Historical patches whose filenames predate number prefixes entirely.
pub const SPECIAL_FILENAME_NUMBERS: &[(&str, u32)] = &[
    ("python-2.7.1-config.patch", 0),
    ("python-2.6-rpath.patch", 16),
    ("python-2.6.4-distutils-rpath.patch", 17),
];

/// A patch's recovered identity: number plus canonical on-disk filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchIdentity {
    pub number: PatchNumber,
    pub filename: String,
}

/// Derive `(number, filename)` for the commit whose message starts with
/// `summary`. `commit` is only used for error context (a short id prefix);
/// `message` is the full message; `patch_dir` is where existing patch files
/// are looked up.
pub fn resolve(
    commit: &str,
    summary: &str,
    message: &str,
    patch_dir: &Path,
) -> Result<PatchIdentity, EngineError> {
    if let Some(caps) = NUMBER_PREFIX_RE.captures(summary) {
        let number: PatchNumber = caps[1].parse().map_err(|_| EngineError::Identity {
            commit: commit.to_owned(),
            summary: summary.to_owned(),
        })?;

        let mut candidates = numbered_patch_files(patch_dir, number)?;
        let filename = match candidates.len() {
            0 => format!("{}.patch", slugify(strip_number_prefix(summary))),
            1 => candidates.remove(0),
            _ => {
                return Err(EngineError::AmbiguousPatchFile { number, candidates });
            }
        };
        return Ok(PatchIdentity { number, filename });
    }

    if summary.ends_with(".patch") && SAFE_FILENAME_RE.is_match(summary) {
        let number = if let Some(found) = LONG_NUMBER_RE.find(message) {
            found
                .as_str()
                .parse()
                .map_err(|_| EngineError::MissingNumber {
                    commit: commit.to_owned(),
                    summary: summary.to_owned(),
                })?
        } else if let Some((_, number)) = SPECIAL_FILENAME_NUMBERS
            .iter()
            .find(|(name, _)| *name == summary)
        {
            PatchNumber(*number)
        } else {
            return Err(EngineError::MissingNumber {
                commit: commit.to_owned(),
                summary: summary.to_owned(),
            });
        };
        return Ok(PatchIdentity {
            number,
            filename: summary.to_owned(),
        });
    }

    Err(EngineError::Identity {
        commit: commit.to_owned(),
        summary: summary.to_owned(),
    })
}

/// The summary minus its `NNNNN:` prefix, trimmed.
pub fn strip_number_prefix(summary: &str) -> &str {
    match NUMBER_PREFIX_RE.find(summary) {
        Some(found) => summary[found.end()..].trim(),
        None => summary.trim(),
    }
}

/// Massage a string for filename safety.
///
/// Similar to how git-format-patch generates filenames: lower-case,
/// non-alphanumeric runs collapsed to a single hyphen, hyphens trimmed.
pub fn slugify(text: &str) -> String {
    SLUG_RE
        .replace_all(&text.to_lowercase(), "-")
        .trim_matches('-')
        .to_owned()
}

/// Existing `NNNNN-*.patch` files for `number`, sorted by name.
fn numbered_patch_files(patch_dir: &Path, number: PatchNumber) -> Result<Vec<String>, EngineError> {
    let prefix = format!("{}-", number.padded());
    let mut names: Vec<String> = std::fs::read_dir(patch_dir)
        .map_err(|e| io_err(patch_dir, e))?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with(&prefix) && name.ends_with(".patch"))
        .collect();
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) {
        std::fs::write(dir.path().join(name), "").unwrap();
    }

    #[test]
    fn numeric_summary_without_existing_file_synthesizes_slug() {
        let dir = TempDir::new().unwrap();
        let identity =
            resolve("abc123def", "00042: Fix thing", "00042: Fix thing", dir.path()).unwrap();
        assert_eq!(identity.number, PatchNumber(42));
        assert_eq!(identity.filename, "fix-thing.patch");
    }

    #[test]
    fn numeric_summary_reuses_the_single_existing_file() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "00042-original-name.patch");
        touch(&dir, "00043-unrelated.patch");
        let identity =
            resolve("abc123def", "42: Renamed summary", "42: Renamed summary", dir.path())
                .unwrap();
        assert_eq!(identity.number, PatchNumber(42));
        assert_eq!(identity.filename, "00042-original-name.patch");
    }

    #[test]
    fn two_existing_files_for_one_number_is_fatal() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "00042-one.patch");
        touch(&dir, "00042-two.patch");
        let err = resolve("abc123def", "00042: Fix", "00042: Fix", dir.path()).unwrap_err();
        match err {
            EngineError::AmbiguousPatchFile { number, candidates } => {
                assert_eq!(number, PatchNumber(42));
                assert_eq!(candidates, vec!["00042-one.patch", "00042-two.patch"]);
            }
            other => panic!("expected AmbiguousPatchFile, got {other:?}"),
        }
    }

    #[test]
    fn legacy_filename_takes_number_from_the_message() {
        let dir = TempDir::new().unwrap();
        let message = "old-fix.patch\n\nbug 12345 found\nmore text";
        let identity = resolve("abc123def", "old-fix.patch", message, dir.path()).unwrap();
        assert_eq!(identity.number, PatchNumber(12345));
        assert_eq!(identity.filename, "old-fix.patch");
    }

    #[test]
    fn legacy_filename_falls_back_to_the_historical_table() {
        let dir = TempDir::new().unwrap();
        let identity = resolve(
            "abc123def",
            "python-2.6-rpath.patch",
            "python-2.6-rpath.patch\n\nno digits worth five",
            dir.path(),
        )
        .unwrap();
        assert_eq!(identity.number, PatchNumber(16));
    }

    #[test]
    fn legacy_filename_without_any_number_fails() {
        let dir = TempDir::new().unwrap();
        let err = resolve(
            "abc123def",
            "mystery.patch",
            "mystery.patch\n\nnothing here",
            dir.path(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::MissingNumber { .. }));
    }

    #[test]
    fn unsafe_legacy_filename_is_not_accepted() {
        let dir = TempDir::new().unwrap();
        let err = resolve(
            "abc123def",
            "has spaces.patch",
            "has spaces.patch",
            dir.path(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Identity { .. }));
    }

    #[test]
    fn freeform_summary_fails_resolution() {
        let dir = TempDir::new().unwrap();
        let err = resolve("abc123def", "Fix stuff", "Fix stuff", dir.path()).unwrap_err();
        match err {
            EngineError::Identity { commit, summary } => {
                assert_eq!(commit, "abc123def");
                assert_eq!(summary, "Fix stuff");
            }
            other => panic!("expected Identity, got {other:?}"),
        }
    }

    #[test]
    fn number_comparison_is_numeric_not_lexical() {
        let dir = TempDir::new().unwrap();
        let identity = resolve("abc123def", "007: Short", "007: Short", dir.path()).unwrap();
        assert_eq!(identity.number, PatchNumber(7));
        assert_eq!(identity.number.padded(), "00007");
    }

    #[test]
    fn slugify_collapses_and_trims() {
        assert_eq!(slugify("Fix thing"), "fix-thing");
        assert_eq!(slugify("Add C.UTF-8 locale!"), "add-c-utf-8-locale");
        assert_eq!(slugify("  --weird--  "), "weird");
        assert_eq!(slugify("keep_underscores"), "keep_underscores");
    }

    #[test]
    fn strip_number_prefix_trims_what_remains() {
        assert_eq!(strip_number_prefix("00042: Fix thing"), "Fix thing");
        assert_eq!(strip_number_prefix("no prefix"), "no prefix");
    }
}
