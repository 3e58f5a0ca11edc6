// kakusu/src/utils/files.rs
//! Input and output plumbing shared by the commands.

use anyhow::{Context, Result, bail};
use is_terminal::IsTerminal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

/// Returns the text argument, else the file contents, else stdin.
///
/// Refuses to wait on an interactive terminal when no input was given.
pub fn read_input(text: Option<&str>, input_file: Option<&Path>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text.to_string());
    }
    if let Some(path) = input_file {
        return fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {}", path.display()));
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        bail!("No input provided: pass TEXT, --input-file or pipe text on stdin.");
    }
    let mut buffer = String::new();
    stdin
        .lock()
        .read_to_string(&mut buffer)
        .context("Failed to read from stdin")?;
    Ok(buffer)
}

/// Writes `content` to `path`, or to stdout followed by a newline when stdout
/// is the target and `content` does not already end with one.
pub fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => fs::write(path, content)
            .with_context(|| format!("Failed to write output file: {}", path.display())),
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            writer.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                writeln!(writer)?;
            }
            writer.flush()?;
            Ok(())
        }
    }
}

/// Parses a JSON file into `T`.
pub fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} file: {}", what, path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {} file as JSON: {}", what, path.display()))
}

/// Serializes `value` as pretty JSON into `path`.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
    fs::write(path, json).with_context(|| format!("Failed to write JSON file: {}", path.display()))
}
