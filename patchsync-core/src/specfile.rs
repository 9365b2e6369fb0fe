//! Spec-file loading, patch-directive scanning, and the plain-string field
//! helpers the CLI uses for argument defaulting.
//!
//! Directive scanning returns entries in file order — export replays patches
//! in exactly the order they appear in the spec, not numeric order.

use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{io_err, SpecError};
use crate::types::{PatchDirective, PatchNumber};

static DIRECTIVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Patch(\d+):\s*(.+?)\s*$").unwrap());

static RELEASE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").unwrap());

/// Read the spec file into memory.
pub fn load(path: &Path) -> Result<String, SpecError> {
    std::fs::read_to_string(path).map_err(|e| io_err(path, e))
}

/// Scan all `Patch<number>: <source>` directives, in file order.
///
/// A line starting with `Patch` followed by a digit must parse as a full
/// directive; anything else of that shape is a malformed spec. Duplicate
/// numbers are rejected — the number is the patch's primary identity.
pub fn scan_directives(text: &str) -> Result<Vec<PatchDirective>, SpecError> {
    let mut directives = Vec::new();
    let mut seen: HashSet<u32> = HashSet::new();

    for raw in text.lines() {
        let line = raw.trim();
        if !line.starts_with("Patch") || !line[5..].starts_with(|c: char| c.is_ascii_digit()) {
            continue;
        }
        let caps = DIRECTIVE_RE
            .captures(line)
            .ok_or_else(|| SpecError::BadDirective {
                line: line.to_owned(),
            })?;
        let number: PatchNumber = caps[1].parse().map_err(|_| SpecError::BadDirective {
            line: line.to_owned(),
        })?;
        if !seen.insert(number.0) {
            return Err(SpecError::DuplicateNumber { number: number.0 });
        }
        directives.push(PatchDirective {
            number,
            source: caps[2].to_owned(),
        });
    }
    Ok(directives)
}

/// First numeric run on the `Release:` line, as a plain string.
pub fn release(text: &str) -> Option<String> {
    for raw in text.lines() {
        let line = raw.trim();
        if let Some(rest) = line.strip_prefix("Release:") {
            return RELEASE_RE.find(rest).map(|m| m.as_str().to_owned());
        }
    }
    None
}

/// All `%global` definitions, minus the `%global ` prefix, in file order.
///
/// Definitions containing `%{expand:` are skipped — they cannot be replayed
/// as `-D` arguments to rpm.
pub fn global_definitions(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|raw| {
            let line = raw.trim();
            let def = line.strip_prefix("%global ")?;
            if line.contains("%{expand:") {
                return None;
            }
            Some(def.to_owned())
        })
        .collect()
}

/// Whether the spec defines `%global upstream_version`.
pub fn defines_upstream_version(text: &str) -> bool {
    text.lines()
        .any(|raw| raw.trim().starts_with("%global upstream_version"))
}
