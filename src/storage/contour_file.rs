use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::dsp::contour::Contour;

/// Read a contour from a JSON file of the form
/// `{ "times": [...], "frequencies": [f64 | null, ...] }`.
pub fn load_contour(path: &Path) -> Result<Contour> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read contour file: {}", path.display()))?;

    serde_json::from_str(&json).with_context(|| format!("Failed to parse contour file: {}", path.display()))
}

/// Write a contour as pretty JSON, creating parent directories as needed.
pub fn save_contour(path: &Path, contour: &Contour) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(contour).context("Failed to serialize contour")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write contour file: {}", path.display()))
}

/// Write a contour as pretty JSON to any writer (stdout for the CLI).
pub fn write_contour<W: Write>(mut out: W, contour: &Contour) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, contour).context("Failed to serialize contour")?;
    writeln!(out)?;
    Ok(())
}
