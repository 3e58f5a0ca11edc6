// kakusu/src/commands/decode.rs
//! `kakusu decode`: restore a masked text from its mapping.

use anyhow::Result;
use is_terminal::IsTerminal;
use log::info;
use serde::Deserialize;
use std::io;

use kakusu_core::{EntityMapping, decode_with_report};

use crate::cli::DecodeCommand;
use crate::ui::output_format;
use crate::utils::files::{read_input, read_json, write_output};

/// A mapping file: either the `mapping` written by `--mapping-out`, or the full
/// `mask --json` output that contains it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MappingFile {
    Outcome { mapping: EntityMapping },
    Bare(EntityMapping),
}

impl MappingFile {
    pub fn into_mapping(self) -> EntityMapping {
        match self {
            MappingFile::Outcome { mapping } => mapping,
            MappingFile::Bare(mapping) => mapping,
        }
    }
}

/// Runs the `decode` command.
pub fn run_decode(cmd: &DecodeCommand, quiet: bool) -> Result<()> {
    info!("Starting decode operation.");

    let mapping = read_json::<MappingFile>(&cmd.mapping, "mapping")?.into_mapping();
    let input = read_input(cmd.text.as_deref(), cmd.input_file.as_deref())?;

    let report = decode_with_report(&input, &mapping);
    write_output(cmd.output.as_deref(), &report.decoded_text)?;

    if !quiet {
        let supports_color = io::stderr().is_terminal();
        let mut stderr = io::stderr();
        if !report.unresolved.is_empty() {
            let _ = output_format::print_warn_message(
                &mut stderr,
                &format!(
                    "{} mapping entr{} not found in the input.",
                    report.unresolved.len(),
                    if report.unresolved.len() == 1 { "y was" } else { "ies were" }
                ),
                supports_color,
            );
        }
        if !report.residual_masks.is_empty() {
            let _ = output_format::print_warn_message(
                &mut stderr,
                &format!(
                    "Masks without a mapping entry remain: {}",
                    report.residual_masks.join(", ")
                ),
                supports_color,
            );
        }
    }

    info!("Decode operation completed.");
    Ok(())
}
