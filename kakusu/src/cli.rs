// kakusu/src/cli.rs
//! This file defines the command-line interface (CLI) for the kakusu application,
//! including all available commands and their arguments.
//! License: MIT OR APACHE 2.0

use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use kakusu_core::MaskStyle;
use std::path::PathBuf;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "kakusu",
    version = env!("CARGO_PKG_VERSION"),
    about = "Mask and restore sensitive entities in Japanese business text",
    long_about = "kakusu replaces company names, people, positions, departments, contact details and other sensitive entities in Japanese text with random mask tokens, and writes a mapping that restores the original text exactly.",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Disable informational messages
    #[arg(long, short = 'q', global = true, help = "Suppress all informational and debug messages.")]
    pub quiet: bool,

    /// Enable debug logging (overrides RUST_LOG for the kakusu crates)
    #[arg(long, short = 'd', global = true, help = "Enable debug logging.")]
    pub debug: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// All available commands for the `kakusu` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Masks sensitive entities in a text.
    #[command(about = "Masks sensitive entities in the given text, a file or stdin.")]
    Mask(MaskCommand),

    /// Restores a masked text with its mapping.
    #[command(about = "Restores a masked text using the mapping written by `mask`.")]
    Decode(DecodeCommand),

    /// Lists the canonical category codes.
    #[command(about = "Lists the category codes accepted by --category.")]
    Categories,
}

/// Arguments for the `mask` command.
#[derive(Parser, Debug)]
#[command(group(
    ArgGroup::new("recognizer")
        .required(true)
        .args(["ner_spans", "ner_url", "rules_only"]),
))]
pub struct MaskCommand {
    /// Text to mask (reads --input-file or stdin if not provided).
    #[arg(value_name = "TEXT", conflicts_with = "input_file")]
    pub text: Option<String>,

    /// Path to an input file.
    #[arg(long, short = 'i', value_name = "FILE", help = "Read input from a specified file instead of stdin.")]
    pub input_file: Option<PathBuf>,

    /// Write the masked text (or JSON with --json) to this file instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE", help = "Write output to a specified file instead of stdout.")]
    pub output: Option<PathBuf>,

    /// Recognizer categories to keep (comma-separated or repeated).
    #[arg(long = "category", short = 'c', value_name = "CATEGORY", value_delimiter = ',', help = "Only keep recognizer entities of these categories (see `kakusu categories`).")]
    pub categories: Vec<String>,

    /// Mask template family.
    #[arg(long, value_enum, default_value = "descriptive", help = "Mask style: 'descriptive' (<<人物_…>>) or 'simple' (<<PERSON_…>>).")]
    pub style: StyleChoice,

    /// Path to a masking rule file (YAML).
    #[arg(long = "rules", value_name = "FILE", env = "KAKUSU_RULES_FILE", help = "Path to a masking rule file (YAML).")]
    pub rules: Option<PathBuf>,

    /// Layer the rule file over the built-in rules instead of replacing them.
    #[arg(long = "extend-defaults", requires = "rules", help = "Merge --rules with the built-in rules instead of replacing them.")]
    pub extend_defaults: bool,

    /// JSON object mapping original texts to replacement strings.
    #[arg(long = "key-values", short = 'k', value_name = "FILE", help = "JSON object file: original text -> replacement for its mask.")]
    pub key_values: Option<PathBuf>,

    /// JSON array of literal values that are always masked with UUIDs.
    #[arg(long = "values", short = 'v', value_name = "FILE", help = "JSON array file of literal values to mask with UUIDs.")]
    pub values: Option<PathBuf>,

    /// Precomputed recognizer spans.
    #[arg(long = "ner-spans", value_name = "FILE", help = "JSON file with recognizer spans ([{label, start, end}] or {\"entities\": [...]}).")]
    pub ner_spans: Option<PathBuf>,

    /// Recognizer service endpoint.
    #[arg(long = "ner-url", value_name = "URL", env = "KAKUSU_NER_URL", help = "URL of a recognizer service accepting POST {\"text\": ...}.")]
    pub ner_url: Option<String>,

    /// Recognizer request timeout in seconds.
    #[arg(long = "ner-timeout", value_name = "SECS", default_value_t = 30, requires = "ner_url", help = "Timeout for recognizer requests, in seconds.")]
    pub ner_timeout: u64,

    /// Mask with rules and literal values only.
    #[arg(long = "rules-only", help = "Do not use a recognizer; mask with rules and literal values only.")]
    pub rules_only: bool,

    /// Print the full outcome (masked text, mapping, audit trail) as JSON.
    #[arg(long, help = "Print the full result as JSON instead of the masked text.")]
    pub json: bool,

    /// Write the mapping as JSON to this file.
    #[arg(long = "mapping-out", short = 'm', value_name = "FILE", help = "Write the token mapping to a JSON file.")]
    pub mapping_out: Option<PathBuf>,

    /// Suppress the per-category summary.
    #[arg(long = "no-summary", help = "Suppress the masking summary on stderr.")]
    pub no_summary: bool,
}

/// Arguments for the `decode` command.
#[derive(Parser, Debug)]
pub struct DecodeCommand {
    /// Masked text (reads --input-file or stdin if not provided).
    #[arg(value_name = "TEXT", conflicts_with = "input_file")]
    pub text: Option<String>,

    /// Path to an input file.
    #[arg(long, short = 'i', value_name = "FILE", help = "Read input from a specified file instead of stdin.")]
    pub input_file: Option<PathBuf>,

    /// Mapping JSON: a bare mapping or the output of `mask --json`.
    #[arg(long, short = 'm', value_name = "FILE", help = "Mapping file written by `mask --mapping-out` or `mask --json`.")]
    pub mapping: PathBuf,

    /// Write the decoded text to this file instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE", help = "Write output to a specified file instead of stdout.")]
    pub output: Option<PathBuf>,
}

/// Enum for selecting the mask template family.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum StyleChoice {
    /// Localized category names.
    Descriptive,
    /// Category codes.
    Simple,
}

impl From<StyleChoice> for MaskStyle {
    fn from(choice: StyleChoice) -> Self {
        match choice {
            StyleChoice::Descriptive => MaskStyle::Descriptive,
            StyleChoice::Simple => MaskStyle::Simple,
        }
    }
}
