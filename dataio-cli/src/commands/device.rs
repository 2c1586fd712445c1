//! Commands that talk to the programmer or the serial subsystem.

use {
    anyhow::{Context, Result},
    console::style,
    dataio::{
        NativePortEnumerator, PortEnumerator, Programmer, block_count, checksum_file,
        listing_checksum, save_listing,
    },
    indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle},
    std::path::{Path, PathBuf},
};

use crate::commands::catalog::load_catalog;
use crate::config::Config;
use crate::{Cli, CliError, use_fancy_output};

fn connect(cli: &Cli, config: &Config) -> Result<Programmer<dataio::NativePort>> {
    let serial = cli.serial_config(config)?;
    if !cli.quiet {
        eprintln!(
            "{} Using {} at {} baud",
            style("🔌").cyan(),
            serial.port_name,
            serial.baud_rate
        );
    }

    let programmer = Programmer::connect(&serial)
        .with_context(|| format!("Could not reach the programmer on {}", serial.port_name))?;
    if !cli.quiet {
        eprintln!("{} Connected", style("✓").green());
    }
    Ok(programmer)
}

fn block_progress(cli: &Cli, total: u64) -> ProgressBar {
    if cli.quiet || !use_fancy_output() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} blocks {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb
}

/// Status command implementation.
pub(crate) fn cmd_status(cli: &Cli, config: &Config) -> Result<()> {
    let mut programmer = connect(cli, config)?;
    let status = programmer.status();
    programmer.close();

    let status = status.context("Status request failed")?;
    if status.is_empty() {
        return Err(
            CliError::Device("Programmer did not answer the status request".to_string()).into(),
        );
    }
    println!("{status}");
    Ok(())
}

/// Load command implementation.
pub(crate) fn cmd_load(
    cli: &Cli,
    config: &Config,
    device: &str,
    output: Option<&Path>,
    to_stdout: bool,
) -> Result<()> {
    let catalog = load_catalog(cli, config)?;
    let profile = catalog.find(device)?;
    let total = block_count(profile.start_address, profile.end_address);

    if !cli.quiet {
        eprintln!(
            "{} {} {:04X}-{:04X} ({} blocks)",
            style("📦").cyan(),
            profile.display_name,
            profile.start_address,
            profile.end_address,
            total
        );
    }

    let mut programmer = connect(cli, config)?;
    let pb = block_progress(cli, total);
    let listing = programmer.load_device(profile, |block, _| {
        pb.set_position(u64::from(block.index));
        pb.set_message(format!("{:04X}-{:04X}", block.start, block.end));
    });
    programmer.close();

    let listing = match listing {
        Ok(listing) => {
            pb.finish_with_message("done");
            listing
        },
        Err(e) => {
            pb.abandon();
            return Err(e).with_context(|| format!("Reading {} failed", profile.display_name));
        },
    };

    if to_stdout {
        println!("{listing}");
        if !cli.quiet {
            eprintln!(
                "{} Checksum = {:04X}",
                style("✓").green(),
                listing_checksum(&listing)?
            );
        }
        return Ok(());
    }

    let dir = output
        .map(Path::to_path_buf)
        .or_else(|| {
            config
                .output
                .dir
                .clone()
        })
        .unwrap_or_else(|| PathBuf::from("."));
    let path = save_listing(&dir, &profile.display_name, &listing)
        .with_context(|| format!("Could not save listing into {}", dir.display()))?;
    let checksum = checksum_file(&path)?;

    if !cli.quiet {
        eprintln!("{} Saved {}", style("✓").green(), path.display());
    }
    println!("{}: Checksum = {checksum:04X}", path.display());
    Ok(())
}

/// List ports command implementation.
pub(crate) fn cmd_list_ports(json: bool) -> Result<()> {
    let ports = NativePortEnumerator::list_ports()?;

    if json {
        let ports: Vec<serde_json::Value> = ports
            .iter()
            .map(|p| {
                serde_json::json!({
                    "name": p.name,
                    "vid": p.vid,
                    "pid": p.pid,
                    "manufacturer": p.manufacturer,
                    "product": p.product,
                })
            })
            .collect();
        let output = serde_json::json!({
            "ok": true,
            "data": {
                "ports": ports,
            }
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output)?
        );
        return Ok(());
    }

    eprintln!(
        "{}",
        style("Available serial ports")
            .bold()
            .underlined()
    );

    if ports.is_empty() {
        eprintln!("  {}", style("No serial ports found").dim());
        return Ok(());
    }

    for port in &ports {
        let vid_pid = if let (Some(vid), Some(pid)) = (port.vid, port.pid) {
            format!(" ({vid:04X}:{pid:04X})")
        } else {
            String::new()
        };
        let product = port
            .product
            .as_deref()
            .map(|p| format!(" - {}", style(p).dim()))
            .unwrap_or_default();

        eprintln!(
            "  {} {}{}{}",
            style("•").green(),
            style(&port.name).cyan(),
            vid_pid,
            product
        );
    }

    Ok(())
}
