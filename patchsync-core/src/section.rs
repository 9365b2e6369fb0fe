//! The delimited patch section of a spec file.
//!
//! # Layout
//!
//! ```text
//! <preamble — copied byte-for-byte>
//! # (Patches taken from github.com/fedora-python/cpython)   <- start marker
//! <generated patch blocks>
//! # (New patches go here ^^^)                               <- end marker
//! <trailer — copied byte-for-byte>
//! ```
//!
//! Several historical spellings of the start marker are recognized on read;
//! only the canonical spelling is ever written back. The end-marker line is
//! preserved exactly as found, trailing whitespace included.

use crate::error::SpecError;

/// Canonical start marker — always written on rewrite.
pub const SECTION_START: &str = "# (Patches taken from github.com/fedora-python/cpython)";

/// Legacy start-marker spellings still accepted on read.
pub const SECTION_START_LEGACY: &[&str] = &[
    "# 00001 #",
    "# Modules/Setup.dist is ultimately used by the \"makesetup\" script to construct",
];

/// End marker — a single fixed string.
pub const SECTION_END: &str = "# (New patches go here ^^^)";

fn is_start_marker(line: &str) -> bool {
    line == SECTION_START || SECTION_START_LEGACY.contains(&line)
}

/// Replace the patch section of `spec_text` with `new_body`.
///
/// `new_body` is spliced verbatim between the canonical start marker and the
/// existing end-marker line. All lines before the start marker and from the
/// end marker onward are copied unchanged, line endings included, so a
/// failed or successful rewrite never perturbs unrelated content.
///
/// Fails without producing output when the section structure is broken:
/// no start marker, more than one start marker, or no end marker after the
/// start.
pub fn rewrite(spec_text: &str, new_body: &str) -> Result<String, SpecError> {
    let mut out = String::with_capacity(spec_text.len() + new_body.len());
    let mut echoing = true;
    let mut found_start = false;

    for line in spec_text.split_inclusive('\n') {
        let stripped = line.trim_end();
        if stripped == SECTION_END {
            echoing = true;
        }
        if is_start_marker(stripped) {
            if found_start {
                return Err(SpecError::DuplicateSection);
            }
            found_start = true;
            echoing = false;
            out.push_str(SECTION_START);
            out.push('\n');
            out.push_str(new_body);
        }
        if echoing {
            out.push_str(line);
        }
    }

    if !found_start {
        return Err(SpecError::SectionNotFound);
    }
    if !echoing {
        return Err(SpecError::SectionUnterminated);
    }
    Ok(out)
}
