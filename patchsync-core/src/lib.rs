//! Patchsync core library — patch-series domain types, spec-file scanning,
//! and the delimited patch-section editor.
//!
//! Everything in this crate is a pure text transform: no process execution,
//! no prompts, no network. The spec file itself is the persisted registry of
//! patch number → filename/comment; there is no other state.
//!
//! Public API surface:
//! - [`types`] — newtypes and domain structs
//! - [`error`] — [`SpecError`]
//! - [`specfile`] — load / directive scan / plain-string field helpers
//! - [`section`] — patch-section markers and the splice rewrite

pub mod error;
pub mod section;
pub mod specfile;
pub mod types;

pub use error::SpecError;
pub use types::{PatchDirective, PatchId, PatchInformation, PatchNumber};
