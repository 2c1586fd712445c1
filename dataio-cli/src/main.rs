//! dataio CLI - Command-line tool for reading EPROMs through a Data I/O 20B.
//!
//! ## Features
//!
//! - Read a catalogued device into a hex listing
//! - Batch checksum of saved listings
//! - Programmer status query
//! - Serial port listing
//! - Shell completion generation
//! - Environment variable support

use {
    anyhow::Result,
    clap::{Parser, Subcommand},
    clap_complete::Shell,
    console::style,
    dataio::{DEFAULT_BAUD, DEFAULT_CATALOG_FILE, SerialConfig},
    env_logger::Env,
    log::debug,
    std::{
        env,
        path::PathBuf,
        process,
        sync::atomic::{AtomicBool, Ordering},
        time::Duration,
    },
};

mod commands;
mod config;

use config::Config;

/// Whether stderr is a terminal (set once at startup).
static STDERR_IS_TTY: AtomicBool = AtomicBool::new(true);

/// Check if emoji/animations should be used (TTY and colors enabled).
pub(crate) fn use_fancy_output() -> bool {
    STDERR_IS_TTY.load(Ordering::Relaxed) && console::colors_enabled_stderr()
}

/// dataio - Read EPROMs through a Data I/O 20B programmer in remote mode.
///
/// Environment variables:
///   DATAIO_PORT      - Serial port of the programmer
///   DATAIO_BAUD      - Baud rate (default: 9600)
///   DATAIO_CATALOG   - Device catalog CSV
#[derive(Parser)]
#[command(name = "dataio")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = "Examples:\n  dataio -p /dev/ttyUSB0 load 2716\n  dataio checksum .")]
pub(crate) struct Cli {
    /// Serial port the programmer is attached to.
    #[arg(short, long, global = true, env = "DATAIO_PORT")]
    pub port: Option<String>,

    /// Baud rate [default: 9600].
    #[arg(short, long, global = true, env = "DATAIO_BAUD")]
    pub baud: Option<u32>,

    /// Device catalog CSV.
    #[arg(long, global = true, env = "DATAIO_CATALOG", value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    /// Path to a configuration file.
    #[arg(long = "config", global = true, value_name = "PATH")]
    pub config_path: Option<PathBuf>,

    /// Verbose output level (-v, -vv for increasing detail).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output).
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Query the programmer status.
    Status,

    /// Read a device and save it as a hex listing.
    Load {
        /// Display name of the device in the catalog.
        device: String,

        /// Directory to save the listing in (default: current directory).
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Write the listing to stdout instead of a file.
        #[arg(long, conflicts_with = "output")]
        stdout: bool,
    },

    /// Checksum every saved listing (*.hex) in a directory.
    Checksum {
        /// Directory to scan.
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Output results as JSON to stdout.
        #[arg(long)]
        json: bool,
    },

    /// List the devices in the catalog.
    Devices {
        /// Output the catalog as JSON to stdout.
        #[arg(long)]
        json: bool,
    },

    /// List available serial ports.
    ListPorts {
        /// Output port list as JSON to stdout.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell type for completions.
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Serial settings from flags, environment and config files.
    pub(crate) fn serial_config(&self, config: &Config) -> Result<SerialConfig> {
        let port = self
            .port
            .clone()
            .or_else(|| {
                config
                    .connection
                    .serial
                    .clone()
            })
            .ok_or_else(|| {
                CliError::Usage(
                    "No serial port given. Use --port, DATAIO_PORT or [connection] serial"
                        .to_string(),
                )
            })?;
        let baud = self
            .baud
            .or(config.connection.baud)
            .unwrap_or(DEFAULT_BAUD);

        let connection = &config.connection;
        let mut serial = SerialConfig::new(port, baud).with_framing(
            connection
                .data_bits
                .unwrap_or_default(),
            connection
                .parity
                .unwrap_or_default(),
            connection
                .stop_bits
                .unwrap_or_default(),
        );
        if let Some(ms) = connection.timeout_ms {
            serial = serial.with_timeout(Duration::from_millis(ms));
        }
        Ok(serial)
    }

    /// Catalog location from flags, environment and config files.
    pub(crate) fn catalog_path(&self, config: &Config) -> PathBuf {
        self.catalog
            .clone()
            .or_else(|| {
                config
                    .catalog
                    .path
                    .clone()
            })
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_FILE))
    }
}

/// Errors that select a specific exit code.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    /// Invalid invocation.
    #[error("{0}")]
    Usage(String),
    /// Unusable configuration or catalog.
    #[error("{0}")]
    Config(String),
    /// Programmer unreachable or not answering.
    #[error("{0}")]
    Device(String),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => 2,
            Self::Config(_) => 3,
            Self::Device(_) => 4,
        }
    }
}

/// Exit code class of a library error, if it has one.
fn library_exit_code(err: &dataio::Error) -> Option<i32> {
    use dataio::Error;

    match err {
        Error::Catalog(_) | Error::MalformedCatalogEntry { .. } | Error::DeviceNotFound(_) => {
            Some(3)
        },
        Error::Serial(_) | Error::NotConnected | Error::HandshakeFailed(_) => Some(4),
        _ => None,
    }
}

/// Map an error chain to the process exit code.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(cli_err) = cause.downcast_ref::<CliError>() {
            return cli_err.exit_code();
        }
        if let Some(code) = cause
            .downcast_ref::<dataio::Error>()
            .and_then(library_exit_code)
        {
            return code;
        }
    }
    1
}

fn init_logging(cli: &Cli) {
    let log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_target(cli.verbose >= 2)
        .format_timestamp(if cli.verbose >= 2 {
            Some(env_logger::TimestampPrecision::Millis)
        } else {
            None
        })
        .init();
}

fn main() {
    // --- NO_COLOR and TTY detection ---
    let stderr_is_tty = console::Term::stderr().is_term();
    STDERR_IS_TTY.store(stderr_is_tty, Ordering::Relaxed);

    if env::var_os("NO_COLOR").is_some() || !stderr_is_tty {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let cli = Cli::parse();
    init_logging(&cli);

    debug!(
        "dataio v{} (verbose level: {})",
        env!("CARGO_PKG_VERSION"),
        cli.verbose
    );

    if let Err(err) = run(&cli) {
        eprintln!("{} {err:#}", style("Error:").red().bold());
        process::exit(exit_code_for(&err));
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = if let Some(ref path) = cli.config_path {
        Config::load_from_path(path)
    } else {
        Config::load()
    };

    match &cli.command {
        Commands::Status => commands::device::cmd_status(cli, &config),
        Commands::Load {
            device,
            output,
            stdout,
        } => commands::device::cmd_load(cli, &config, device, output.as_deref(), *stdout),
        Commands::Checksum { dir, json } => commands::checksum::cmd_checksum(cli, dir, *json),
        Commands::Devices { json } => commands::catalog::cmd_devices(cli, &config, *json),
        Commands::ListPorts { json } => commands::device::cmd_list_ports(*json),
        Commands::Completions { shell } => {
            commands::completions::cmd_completions(*shell);
            Ok(())
        },
    }
}
