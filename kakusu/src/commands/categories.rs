// kakusu/src/commands/categories.rs
//! `kakusu categories`: list the category codes `--category` accepts.

use anyhow::Result;
use std::io::{self, Write};

use kakusu_core::Category;
use kakusu_core::config::default_mask_formats;

use crate::commands::mask::RECOGNIZER_ONLY_CODES;

/// One line per category: code and its descriptive label. Recognizer-only
/// codes follow with a `-` label.
pub fn run_categories() -> Result<()> {
    let formats = default_mask_formats();
    let descriptive = formats.get("descriptive");

    let stdout = io::stdout();
    let mut writer = stdout.lock();
    for category in Category::CANONICAL.iter() {
        let label = descriptive
            .and_then(|templates| templates.get(category.as_str()))
            .and_then(|template| template.trim_start_matches("<<").split('_').next())
            .unwrap_or("");
        writeln!(writer, "{}\t{}", category.as_str(), label)?;
    }
    for code in RECOGNIZER_ONLY_CODES {
        writeln!(writer, "{}\t-", code)?;
    }
    Ok(())
}
