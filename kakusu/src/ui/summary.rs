// kakusu/src/ui/summary.rs
//! Per-category masking summary, rendered as a table on stderr.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Table};
use kakusu_core::{AuditRecord, Category};
use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CategorySummary {
    pub occurrences: usize,
    pub distinct: usize,
    pub sources: BTreeSet<&'static str>,
}

/// Counts occurrences and distinct originals per category.
pub fn summarize(audit: &[AuditRecord]) -> BTreeMap<Category, CategorySummary> {
    let mut originals: BTreeMap<Category, BTreeSet<&str>> = BTreeMap::new();
    let mut summary: BTreeMap<Category, CategorySummary> = BTreeMap::new();

    for record in audit {
        let entry = summary.entry(record.category.clone()).or_default();
        entry.occurrences += 1;
        entry.sources.insert(record.source.as_str());
        originals
            .entry(record.category.clone())
            .or_default()
            .insert(record.original.as_str());
    }
    for (category, texts) in originals {
        if let Some(entry) = summary.get_mut(&category) {
            entry.distinct = texts.len();
        }
    }
    summary
}

/// Writes the summary table, or a one-line note when nothing was masked.
pub fn print_summary<W: Write>(audit: &[AuditRecord], writer: &mut W) -> io::Result<()> {
    if audit.is_empty() {
        return writeln!(writer, "No sensitive entities were masked.");
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Category").add_attribute(Attribute::Bold),
            Cell::new("Occurrences")
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Bold),
            Cell::new("Distinct")
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Bold),
            Cell::new("Sources").add_attribute(Attribute::Bold),
        ]);

    for (category, row) in summarize(audit) {
        let sources: Vec<&str> = row.sources.into_iter().collect();
        table.add_row(vec![
            Cell::new(category.as_str()),
            Cell::new(row.occurrences).set_alignment(CellAlignment::Right),
            Cell::new(row.distinct).set_alignment(CellAlignment::Right),
            Cell::new(sources.join(", ")),
        ]);
    }
    writeln!(writer, "{}", table)
}
