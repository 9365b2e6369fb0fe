//! Domain types for the patchsync patch series.
//!
//! A patch's primary identity is its [`PatchNumber`]; the [`PatchId`] is a
//! content fingerprint of the diff text, stable across commit-metadata
//! changes, used only for change detection in the spec's comment header.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A patch number — unique within a series, compared numerically.
///
/// Displays unpadded (`Patch189: ...`); use [`PatchNumber::padded`] for the
/// five-digit form used in commit-message prefixes and comment headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PatchNumber(pub u32);

impl PatchNumber {
    /// Five-digit zero-padded form, e.g. `00189`.
    pub fn padded(self) -> String {
        format!("{:05}", self.0)
    }
}

impl fmt::Display for PatchNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u32> for PatchNumber {
    fn from(n: u32) -> Self {
        Self(n)
    }
}

impl FromStr for PatchNumber {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>().map(Self)
    }
}

/// A stable fingerprint of a patch's textual diff (a "patch id").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatchId(pub String);

impl PatchId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for PatchId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PatchId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// Everything an import run needs to know about one patch.
///
/// Instances are created fresh each run; the spec file is the only
/// persistence between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchInformation {
    pub number: PatchNumber,
    pub patch_id: PatchId,
    /// Human-authored rationale, newline-joined, already stripped of noise.
    pub comment: String,
    /// On-disk patch file name (no directory component).
    pub filename: String,
    /// Extra text appended after the directive line; used only by the
    /// bundled-versions patch.
    pub trailer: Option<String>,
}

impl PatchInformation {
    /// Render this patch's block of the spec patch section:
    ///
    /// ```text
    ///
    /// # NNNNN # <patch-id>
    /// # <comment line>
    /// #
    /// Patch<number>: <filename>
    /// ```
    ///
    /// Comment lines are `#`-prefixed (a bare `#` for blank lines) and `%`
    /// is doubled so rpm does not expand anything an author wrote. The
    /// trailer, when present, replaces the newline after the directive.
    pub fn section_block(&self) -> String {
        let comment = self
            .comment
            .lines()
            .map(|line| {
                if line.is_empty() {
                    "#".to_owned()
                } else {
                    format!("# {}", line.replace('%', "%%"))
                }
            })
            .collect::<Vec<_>>()
            .join("\n");

        let mut block = format!(
            "\n# {} # {}\n{}\nPatch{}: {}\n",
            self.number.padded(),
            self.patch_id,
            comment,
            self.number,
            self.filename,
        );
        if let Some(trailer) = &self.trailer {
            block.truncate(block.trim_end().len());
            block.push_str(trailer);
        }
        block
    }
}

/// One `Patch<number>: <source>` directive as it appears in the spec.
///
/// `source` may be a bare filename or a URL; [`PatchDirective::filename`]
/// yields the on-disk name either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchDirective {
    pub number: PatchNumber,
    pub source: String,
}

impl PatchDirective {
    /// The final path segment of `source`.
    pub fn filename(&self) -> &str {
        self.source.rsplit('/').next().unwrap_or(&self.source)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
