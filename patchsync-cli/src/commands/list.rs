//! `patchsync list` — read-only view of the spec's patch directives.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use patchsync_core::specfile;

use super::defaults;

/// Arguments for `patchsync list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Spec file to read (default: the single *.spec in the current directory).
    pub spec: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct DirectiveRow {
    #[tabled(rename = "number")]
    number: u32,
    #[tabled(rename = "file")]
    filename: String,
    #[tabled(rename = "source")]
    source: String,
}

#[derive(Serialize)]
struct DirectiveJson {
    number: u32,
    filename: String,
    source: String,
}

impl ListArgs {
    pub fn run(self) -> Result<()> {
        let cwd = std::env::current_dir()?;
        let spec = defaults::find_spec_in(&cwd, self.spec)?;
        let text = specfile::load(&spec)?;
        let directives = specfile::scan_directives(&text)?;

        if self.json {
            let rows: Vec<DirectiveJson> = directives
                .iter()
                .map(|d| DirectiveJson {
                    number: d.number.0,
                    filename: d.filename().to_owned(),
                    source: d.source.clone(),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
            return Ok(());
        }

        if directives.is_empty() {
            println!("No patch directives in {}", spec.display());
            return Ok(());
        }

        let rows: Vec<DirectiveRow> = directives
            .iter()
            .map(|d| DirectiveRow {
                number: d.number.0,
                filename: d.filename().to_owned(),
                source: d.source.clone(),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::sharp());
        println!("{table}");
        println!("{} patches in {}", directives.len(), spec.display());
        Ok(())
    }
}
