// kakusu/src/commands/mask.rs
//! `kakusu mask`: detect, mask and report.

use anyhow::{Context, Result, bail};
use is_terminal::IsTerminal;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::io;
use std::time::Duration;

use kakusu_core::{
    Category, EntityRecognizer, HttpRecognizer, MaskRequest, MaskingConfig, StaticRecognizer,
    headless_mask_string, merge_rules,
};

use crate::cli::MaskCommand;
use crate::ui::{output_format, summary};
use crate::utils::files::{read_input, read_json, write_json, write_output};

/// Recognizer labels with no canonical category that `--category` still accepts.
pub const RECOGNIZER_ONLY_CODES: [&str; 8] = [
    "NORP", "FACILITY", "LAW", "LANGUAGE", "PERCENT", "QUANTITY", "ORDINAL", "CARDINAL",
];

fn is_well_formed_code(code: &str) -> bool {
    !code.is_empty() && code.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parses `--category` values.
///
/// Canonical codes and recognizer aliases (`GPE` is `LOCATION`) map onto their
/// category. Any other well-formed code is kept as a pass-through label, with a
/// warning unless it is a known recognizer label. Blank values are ignored, and
/// a list with nothing left means no filter.
pub fn parse_categories(values: &[String]) -> Result<Option<Vec<Category>>> {
    let mut categories = Vec::with_capacity(values.len());
    for value in values.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
        let code = value.to_uppercase();
        if !is_well_formed_code(&code) {
            let canonical = Category::CANONICAL;
            let valid: Vec<&str> = canonical
                .iter()
                .map(|c| c.as_str())
                .chain(RECOGNIZER_ONLY_CODES)
                .collect();
            bail!(
                "Invalid category '{}'. Valid categories: {}",
                value,
                valid.join(", ")
            );
        }
        let category = Category::from_ner_label(&code);
        if let Category::Other(label) = &category {
            if !RECOGNIZER_ONLY_CODES.contains(&label.as_str()) {
                warn!("Category '{}' is not a known code; only recognizer spans labelled '{}' will match it.", value, label);
            }
        }
        if !categories.contains(&category) {
            categories.push(category);
        }
    }
    if categories.is_empty() {
        return Ok(None);
    }
    Ok(Some(categories))
}

fn load_config(cmd: &MaskCommand) -> Result<MaskingConfig> {
    match &cmd.rules {
        Some(path) => {
            let user = MaskingConfig::load_from_file(path)
                .with_context(|| format!("Failed to load rule file: {}", path.display()))?;
            if cmd.extend_defaults {
                let defaults = MaskingConfig::load_default_rules()?;
                Ok(merge_rules(defaults, Some(user)))
            } else {
                Ok(user)
            }
        }
        None => MaskingConfig::resolve(None).context("Failed to resolve masking rules"),
    }
}

fn build_recognizer(cmd: &MaskCommand) -> Result<Box<dyn EntityRecognizer>> {
    if let Some(path) = &cmd.ner_spans {
        let recognizer = StaticRecognizer::from_json_file(path)
            .with_context(|| format!("Failed to load recognizer spans: {}", path.display()))?;
        return Ok(Box::new(recognizer));
    }
    if let Some(url) = &cmd.ner_url {
        debug!("Using recognizer service at {}", url);
        let recognizer = HttpRecognizer::with_timeout(url.clone(), Duration::from_secs(cmd.ner_timeout))?;
        return Ok(Box::new(recognizer));
    }
    if cmd.rules_only {
        return Ok(Box::new(StaticRecognizer::empty()));
    }
    bail!("No recognizer selected: pass --ner-spans, --ner-url or --rules-only.")
}

fn build_request(cmd: &MaskCommand) -> Result<MaskRequest> {
    let key_value_overrides = cmd
        .key_values
        .as_deref()
        .map(|path| read_json::<BTreeMap<String, String>>(path, "key-value"))
        .transpose()?;
    let literal_values = cmd
        .values
        .as_deref()
        .map(|path| read_json::<Vec<String>>(path, "values"))
        .transpose()?;

    Ok(MaskRequest {
        categories: parse_categories(&cmd.categories)?,
        style: cmd.style.into(),
        key_value_overrides,
        literal_values,
    })
}

/// Runs the `mask` command.
pub fn run_mask(cmd: &MaskCommand, quiet: bool) -> Result<()> {
    info!("Starting mask operation.");

    let request = build_request(cmd)?;
    let config = load_config(cmd)?;
    let recognizer = build_recognizer(cmd)?;
    let input = read_input(cmd.text.as_deref(), cmd.input_file.as_deref())?;

    let outcome = headless_mask_string(&config, recognizer, &input, &request)?;

    if cmd.json {
        let json = serde_json::to_string_pretty(&outcome).context("Failed to serialize mask result")?;
        write_output(cmd.output.as_deref(), &json)?;
    } else {
        write_output(cmd.output.as_deref(), &outcome.masked_text)?;
    }

    if let Some(path) = &cmd.mapping_out {
        write_json(path, &outcome.mapping)?;
    }

    if !quiet {
        let stderr_supports_color = io::stderr().is_terminal();
        let mut stderr = io::stderr();
        if let Some(path) = &cmd.output {
            let _ = output_format::print_info_message(
                &mut stderr,
                &format!("Masked output written to: {}", path.display()),
                stderr_supports_color,
            );
        }
        if let Some(path) = &cmd.mapping_out {
            let _ = output_format::print_info_message(
                &mut stderr,
                &format!("Mapping written to: {}", path.display()),
                stderr_supports_color,
            );
        } else if !cmd.json && !outcome.mapping.is_empty() {
            let _ = output_format::print_warn_message(
                &mut stderr,
                "No --mapping-out given; this masked text cannot be decoded later.",
                stderr_supports_color,
            );
        }
        if !cmd.no_summary {
            summary::print_summary(&outcome.audit, &mut stderr)?;
        }
    }

    info!("Mask operation completed.");
    Ok(())
}
