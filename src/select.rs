//! Interactive choice of extension groups.
//!
//! After the scan, the discovered extensions are listed with their file counts
//! and the user picks which ones to copy by entering comma-separated indices.

use crate::error::{ExtcopyError, Result};
use crate::filter::ExtensionSelection;
use crate::traverse::{ExtensionGroups, extension_label};
use std::io::{BufRead, Write};

/// How a run decides which extension groups to copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionMode {
    /// Use this selection without asking.
    Fixed(ExtensionSelection),
    /// Ask on the terminal once the tree has been scanned.
    Prompt,
}

impl Default for SelectionMode {
    fn default() -> Self {
        Self::Fixed(ExtensionSelection::All)
    }
}

/// Lists the extensions in `groups` on `output` and reads the choice from `input`.
///
/// Indices are 1-based, as printed. Each index selects exactly the listed
/// group, so `.JPG` and `.jpg` stay separate choices. Blank input, unknown
/// indices and non-numeric tokens are rejected.
pub fn prompt_extensions<R, W>(
    groups: &ExtensionGroups,
    mut input: R,
    mut output: W,
) -> Result<ExtensionSelection>
where
    R: BufRead,
    W: Write,
{
    let available = groups.extensions();
    let io_err = |e: std::io::Error| ExtcopyError::Selection(format!("terminal I/O failed: {}", e));

    writeln!(output, "Available file extensions:").map_err(io_err)?;
    for (idx, (ext, count)) in available.iter().enumerate() {
        writeln!(
            output,
            "{}. {} ({} {})",
            idx + 1,
            extension_label(*ext),
            count,
            if *count == 1 { "file" } else { "files" }
        )
        .map_err(io_err)?;
    }
    write!(
        output,
        "Select the extensions you want to copy (comma-separated indices): "
    )
    .map_err(io_err)?;
    output.flush().map_err(io_err)?;

    let mut line = String::new();
    input.read_line(&mut line).map_err(io_err)?;

    let chosen = parse_indices(&line, available.len())?;
    Ok(ExtensionSelection::Groups(
        chosen
            .into_iter()
            .map(|idx| available[idx - 1].0.map(str::to_string))
            .collect(),
    ))
}

/// Parses `1, 3,4` into indices, checking each against `1..=max`.
fn parse_indices(line: &str, max: usize) -> Result<Vec<usize>> {
    let tokens: Vec<&str> = line
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();

    if tokens.is_empty() {
        return Err(ExtcopyError::Selection(
            "no extensions selected for copying".to_string(),
        ));
    }

    tokens
        .into_iter()
        .map(|token| match token.parse::<usize>() {
            Ok(idx) if (1..=max).contains(&idx) => Ok(idx),
            Ok(idx) => Err(ExtcopyError::Selection(format!(
                "index {} is out of range (1-{})",
                idx, max
            ))),
            Err(_) => Err(ExtcopyError::Selection(format!(
                "'{}' is not a number",
                token
            ))),
        })
        .collect()
}
