//! Batch checksum of saved listings.

use {
    anyhow::{Context, Result, bail},
    console::style,
    dataio::{FileChecksum, checksum_dir},
    std::path::Path,
};

use crate::Cli;

fn file_name(result: &FileChecksum) -> String {
    result
        .path
        .file_name()
        .map_or_else(
            || {
                result
                    .path
                    .display()
                    .to_string()
            },
            |name| {
                name.to_string_lossy()
                    .into_owned()
            },
        )
}

/// Checksum command implementation.
///
/// Every file gets a line of its own; the command fails once all files have
/// been processed if any of them could not be checksummed.
pub(crate) fn cmd_checksum(cli: &Cli, dir: &Path, json: bool) -> Result<()> {
    let results =
        checksum_dir(dir).with_context(|| format!("Could not scan {}", dir.display()))?;
    let failed = results
        .iter()
        .filter(|r| r.result.is_err())
        .count();

    if json {
        let files: Vec<serde_json::Value> = results
            .iter()
            .map(|r| match &r.result {
                Ok(sum) => serde_json::json!({
                    "file": file_name(r),
                    "checksum": format!("{sum:04X}"),
                }),
                Err(e) => serde_json::json!({
                    "file": file_name(r),
                    "error": e.to_string(),
                }),
            })
            .collect();
        let output = serde_json::json!({
            "ok": failed == 0,
            "data": {
                "files": files,
            }
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output)?
        );
    } else {
        if results.is_empty() && !cli.quiet {
            eprintln!(
                "  {}",
                style(format!("No listings found in {}", dir.display())).dim()
            );
        }
        for result in &results {
            match &result.result {
                Ok(sum) => println!("{}: Checksum = {sum:04X}", file_name(result)),
                Err(e) => eprintln!(
                    "{} {}: {e}",
                    style("✗").red(),
                    file_name(result)
                ),
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} listing(s) could not be checksummed", results.len());
    }
    Ok(())
}
