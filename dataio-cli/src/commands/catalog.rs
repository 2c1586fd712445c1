//! Device catalog commands.

use {
    anyhow::Result,
    console::style,
    dataio::{DeviceCatalog, block_count},
    log::debug,
};

use crate::config::Config;
use crate::{Cli, CliError};

/// Load the catalog selected by flags, environment or config.
pub(crate) fn load_catalog(cli: &Cli, config: &Config) -> Result<DeviceCatalog> {
    let path = cli.catalog_path(config);
    if !path.is_file() {
        return Err(CliError::Config(format!(
            "Device catalog not found at {}. Use --catalog or DATAIO_CATALOG",
            path.display()
        ))
        .into());
    }
    debug!("Using catalog {}", path.display());
    Ok(DeviceCatalog::from_path(&path)?)
}

/// Devices command implementation.
pub(crate) fn cmd_devices(cli: &Cli, config: &Config, json: bool) -> Result<()> {
    let catalog = load_catalog(cli, config)?;

    if json {
        let devices: Vec<serde_json::Value> = catalog
            .iter()
            .map(|d| {
                serde_json::json!({
                    "name": d.display_name,
                    "start": format!("0x{:04X}", d.start_address),
                    "end": format!("0x{:04X}", d.end_address),
                    "size": d.size(),
                    "blocks": block_count(d.start_address, d.end_address),
                })
            })
            .collect();
        let output = serde_json::json!({
            "ok": true,
            "data": {
                "devices": devices,
            }
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output)?
        );
        return Ok(());
    }

    if !cli.quiet {
        eprintln!(
            "{}",
            style("Supported devices")
                .bold()
                .underlined()
        );
    }

    let width = catalog
        .names()
        .map(str::len)
        .max()
        .unwrap_or(0);
    for device in &catalog {
        println!(
            "  {:width$}  {:04X}-{:04X}  {:>3} block(s)",
            device.display_name,
            device.start_address,
            device.end_address,
            block_count(device.start_address, device.end_address),
        );
    }

    Ok(())
}
