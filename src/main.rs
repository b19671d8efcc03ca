//! serial-snap
//!
//! Downloads a screenshot from a serial-attached embedded dashboard. The
//! device stores its capture on internal flash; this tool drives the
//! `SCREENSHOT`/`DOWNLOAD` console commands and reassembles the hex chunk
//! stream into a local file.
//!
//! # Usage
//!
//! ```bash
//! # Capture and download in one go
//! serial-snap -s
//!
//! # Download the existing screenshot from a specific port
//! serial-snap /dev/ttyUSB0 115200
//!
//! # List the files on the device filesystem
//! serial-snap --list-files
//! ```

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use serial_snap::config::{FileConfig, TransferConfig};
use serial_snap::interrupt;
use std::path::PathBuf;
use std::time::Duration;

#[cfg(feature = "serial")]
use anyhow::Context;
#[cfg(feature = "serial")]
use serial_snap::error::Error;
#[cfg(feature = "serial")]
use serial_snap::serial::{PortConfig, SerialConnection};
#[cfg(feature = "serial")]
use serial_snap::transfer::ScreenshotClient;

/// Screenshot downloader for serial-attached embedded dashboards
#[derive(Parser)]
#[command(name = "serial-snap")]
#[command(version = "0.1.0")]
#[command(about = "Download screenshots from an embedded dashboard over a serial link")]
struct Cli {
    /// Serial port path (default: /dev/ttyUSB0, /dev/cu.usbserial-10 on macOS)
    port: Option<String>,

    /// Baud rate (default: 115200)
    baudrate: Option<u32>,

    /// Take a screenshot before downloading
    #[arg(short, long)]
    screenshot: bool,

    /// Output file (default: dashboard.bmp)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// List the files on the device instead of downloading
    #[arg(short, long)]
    list_files: bool,

    /// Per-read timeout in seconds (default: 5)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// TOML config file supplying defaults for these options
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Append a timestamped transcript of device output to this file
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let code = match run() {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(err) => {
            eprintln!("{} {err:#}", "[ERROR]".red().bold());
            1
        }
    };
    std::process::exit(code);
}

fn run() -> Result<bool> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    interrupt::install();

    let mut config = TransferConfig::default();
    if let Some(path) = &cli.config {
        FileConfig::parse(path)?.apply(&mut config);
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(baud) = cli.baudrate {
        config.baud_rate = baud;
    }
    if let Some(secs) = cli.timeout {
        config.read_timeout = Duration::from_secs(secs);
    }
    if let Some(output) = cli.output {
        config.output_path = output;
    }
    if let Some(log) = cli.log {
        config.log_file = Some(log);
    }
    if cli.screenshot {
        config.capture_first = true;
    }

    execute(config, cli.list_files)
}

#[cfg(feature = "serial")]
fn execute(config: TransferConfig, list_files: bool) -> Result<bool> {
    println!(
        "{} Connecting to {} at {} baud...",
        "[*]".cyan().bold(),
        config.port.white(),
        config.baud_rate
    );

    let port_config = PortConfig::new(&config.port)
        .with_baud_rate(config.baud_rate)
        .with_timeout(config.read_timeout);
    let conn = SerialConnection::open(port_config)
        .context("is the device connected and the port path correct?")?;

    println!(
        "{} Connected to {}, waiting for device to settle...",
        "[OK]".green().bold(),
        conn.config().port_path.white()
    );
    std::thread::sleep(Duration::from_secs(2));

    let mut client = ScreenshotClient::new(conn, config)?;

    let result = if list_files {
        client.list_files().map(|()| true)
    } else {
        client.run().map(|outcome| outcome.is_success())
    };

    match result {
        Err(Error::Interrupted) => {
            println!("\n{}", "Aborted by user".yellow());
            Ok(false)
        }
        other => other.map_err(Into::into),
    }
}

#[cfg(not(feature = "serial"))]
fn execute(_config: TransferConfig, _list_files: bool) -> Result<bool> {
    anyhow::bail!("built without serial support; rebuild with --features serial")
}
