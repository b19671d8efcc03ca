//! Screenshot transfer client.
//!
//! Drives the capture/download exchange against a device speaking the
//! protocol in [`crate::protocol`]. The exchange is strictly sequential:
//! one command goes out, lines are read until the terminal marker of its
//! response, and only then may the next command be sent.

use crate::config::TransferConfig;
use crate::error::{Error, Result};
use crate::interrupt;
use crate::protocol::{self, DeviceLine};
use crate::serial::LineIo;
use chrono::Local;
use colored::Colorize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::time::{Duration, Instant};

/// Pause between a confirmed capture and the download command, giving the
/// device time to finish flushing the file to flash.
const POST_CAPTURE_DELAY: Duration = Duration::from_millis(500);

/// Progress is reported at most once per this interval.
const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Terminal classification of a transfer run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Success,
    /// The device reported the capture failed; no download was attempted.
    CaptureFailed,
    /// No screenshot exists on the device yet.
    FileNotFound,
    /// The line stream went quiet past the configured data timeout.
    Timeout,
    /// The chunk stream ended without contributing a single byte.
    NoData,
}

/// Structured result of a transfer run.
#[derive(Debug)]
pub struct Outcome {
    pub kind: OutcomeKind,
    /// Bytes persisted to the output file; zero on any failure.
    pub bytes_written: usize,
    pub message: String,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        self.kind == OutcomeKind::Success
    }

    fn failed(kind: OutcomeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            bytes_written: 0,
            message: message.into(),
        }
    }
}

/// Download exchange states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Waiting for `SIZE:`, `ERROR: File not found`, or `DATA_START`.
    AwaitingStart,
    /// Inside the `DATA_START`..`DATA_END` chunk stream.
    Streaming,
}

/// Mutable bookkeeping for one download.
struct TransferState {
    buffer: Vec<u8>,
    /// Advertised total size; display only, never terminates the transfer.
    expected_size: u64,
    chunk_count: usize,
    empty_streak: usize,
    last_progress: Instant,
    last_data: Instant,
}

impl TransferState {
    fn new() -> Self {
        Self {
            buffer: Vec::new(),
            expected_size: 1,
            chunk_count: 0,
            empty_streak: 0,
            last_progress: Instant::now(),
            last_data: Instant::now(),
        }
    }

    fn saw_activity(&mut self) {
        if self.empty_streak > 0 {
            log::debug!("skipped {} empty lines", self.empty_streak);
            self.empty_streak = 0;
        }
        self.last_data = Instant::now();
    }
}

/// Client for the device's screenshot console.
///
/// Owns the connection for the duration of one run; every exit path drops
/// it, which closes the port.
pub struct ScreenshotClient<T: LineIo> {
    conn: T,
    config: TransferConfig,
    transcript: Option<BufWriter<File>>,
}

impl<T: LineIo> ScreenshotClient<T> {
    pub fn new(conn: T, config: TransferConfig) -> Result<Self> {
        let transcript = match &config.log_file {
            Some(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Some(BufWriter::new(file))
            }
            None => None,
        };

        Ok(Self {
            conn,
            config,
            transcript,
        })
    }

    /// Release the underlying connection (used by tests to inspect writes).
    pub fn into_conn(self) -> T {
        self.conn
    }

    /// Run the full exchange: optional capture, then download and persist.
    pub fn run(&mut self) -> Result<Outcome> {
        if self.config.capture_first {
            if !self.capture()? {
                return Ok(Outcome::failed(
                    OutcomeKind::CaptureFailed,
                    "device reported the screenshot failed",
                ));
            }
            std::thread::sleep(POST_CAPTURE_DELAY);
        }

        self.download()
    }

    /// Ask the device to take a screenshot; true once it confirms.
    fn capture(&mut self) -> Result<bool> {
        println!("{} Taking screenshot...", "[*]".cyan().bold());
        self.conn.write_line(protocol::CMD_SCREENSHOT)?;

        let start = Instant::now();
        loop {
            interrupt::check()?;

            if start.elapsed() > self.config.data_timeout {
                return Err(Error::Protocol(format!(
                    "no capture confirmation within {}s",
                    self.config.data_timeout.as_secs()
                )));
            }

            let Some(line) = self.conn.read_line()? else {
                continue;
            };

            match protocol::classify(&line) {
                DeviceLine::Empty => continue,
                DeviceLine::CaptureSaved => {
                    self.echo(&line)?;
                    println!("{} Screenshot taken", "[OK]".green().bold());
                    return Ok(true);
                }
                DeviceLine::CaptureFailed => {
                    self.echo(&line)?;
                    return Ok(false);
                }
                _ => self.echo(&line)?,
            }
        }
    }

    /// Request the stored screenshot and reassemble the chunk stream.
    fn download(&mut self) -> Result<Outcome> {
        println!(
            "{} Sending {} command...",
            "[*]".cyan().bold(),
            protocol::CMD_DOWNLOAD
        );
        self.conn.write_line(protocol::CMD_DOWNLOAD)?;

        let mut phase = Phase::AwaitingStart;
        let mut state = TransferState::new();

        let outcome = loop {
            interrupt::check()?;

            if state.last_data.elapsed() > self.config.data_timeout {
                let secs = self.config.data_timeout.as_secs();
                break match phase {
                    Phase::AwaitingStart => Outcome::failed(
                        OutcomeKind::Timeout,
                        format!("no response to {} within {secs}s", protocol::CMD_DOWNLOAD),
                    ),
                    Phase::Streaming => Outcome::failed(
                        OutcomeKind::Timeout,
                        format!(
                            "transfer stalled (no data for {secs}s, {} bytes in {} chunks buffered)",
                            state.buffer.len(),
                            state.chunk_count
                        ),
                    ),
                };
            }

            let Some(line) = self.conn.read_line()? else {
                continue;
            };

            match phase {
                Phase::AwaitingStart => match protocol::classify(&line) {
                    DeviceLine::Empty => continue,
                    DeviceLine::Size(size) => {
                        state.saw_activity();
                        self.echo(&line)?;
                        println!("File size: {size} bytes");
                        // SIZE:0 would make the percentage meaningless
                        state.expected_size = size.max(1);
                    }
                    DeviceLine::DataStart => {
                        state.saw_activity();
                        self.echo(&line)?;
                        println!("Receiving data chunks...");
                        phase = Phase::Streaming;
                    }
                    DeviceLine::FileNotFound => {
                        self.echo(&line)?;
                        break Outcome::failed(
                            OutcomeKind::FileNotFound,
                            "no screenshot on device; allow ~30s after WiFi connects before downloading",
                        );
                    }
                    _ => {
                        state.saw_activity();
                        self.echo(&line)?;
                    }
                },

                Phase::Streaming => match protocol::classify(&line) {
                    DeviceLine::DataEnd => {
                        println!("Received {} marker", protocol::DATA_END);
                        break self.finish(&state)?;
                    }
                    DeviceLine::Empty => {
                        state.empty_streak += 1;
                    }
                    DeviceLine::Chunk(payload) => {
                        state.saw_activity();
                        state.chunk_count += 1;
                        match protocol::decode_chunk(payload) {
                            Ok(bytes) => state.buffer.extend_from_slice(&bytes),
                            Err(err) => {
                                log::warn!("chunk {} dropped: {err}", state.chunk_count);
                            }
                        }
                        self.report_progress(&mut state)?;
                    }
                    // Stray console output between chunks still counts as
                    // liveness; it is not an error.
                    _ => state.saw_activity(),
                },
            }
        };

        self.report(&outcome);
        Ok(outcome)
    }

    /// Print the device's file listing (its `LIST` console command).
    pub fn list_files(&mut self) -> Result<()> {
        println!("{} Requesting file listing...", "[*]".cyan().bold());
        self.conn.write_line(protocol::CMD_LIST)?;

        let mut last_line = Instant::now();
        loop {
            interrupt::check()?;

            if last_line.elapsed() > self.config.data_timeout {
                return Err(Error::Protocol(
                    "device did not complete the file listing".to_string(),
                ));
            }

            let Some(line) = self.conn.read_line()? else {
                continue;
            };

            if line.trim() == protocol::LIST_DONE {
                return Ok(());
            }
            if line.is_empty() {
                continue;
            }

            last_line = Instant::now();
            self.echo(&line)?;
        }
    }

    /// Persist the buffer once the device has sent `DATA_END`.
    fn finish(&mut self, state: &TransferState) -> Result<Outcome> {
        println!(
            "Received {} bytes in {} chunks",
            state.buffer.len(),
            state.chunk_count
        );

        if state.buffer.is_empty() {
            return Ok(Outcome::failed(OutcomeKind::NoData, "no data received"));
        }

        std::fs::write(&self.config.output_path, &state.buffer)?;

        Ok(Outcome {
            kind: OutcomeKind::Success,
            bytes_written: state.buffer.len(),
            message: format!(
                "saved {} ({} bytes)",
                self.config.output_path.display(),
                state.buffer.len()
            ),
        })
    }

    fn report_progress(&mut self, state: &mut TransferState) -> Result<()> {
        if state.last_progress.elapsed() < PROGRESS_INTERVAL {
            return Ok(());
        }
        state.last_progress = Instant::now();

        let percent = state.buffer.len() as u64 * 100 / state.expected_size;
        let line = format!(
            "Progress: {percent}% ({}/{} bytes, {} chunks)",
            state.buffer.len(),
            state.expected_size,
            state.chunk_count
        );
        println!("{line}");
        self.log_line(&line)
    }

    fn report(&self, outcome: &Outcome) {
        if outcome.is_success() {
            println!("{} {}", "[OK]".green().bold(), outcome.message);
        } else {
            println!("{} {}", "[ERROR]".red().bold(), outcome.message);
        }
    }

    /// Echo a device line to stdout and the transcript log.
    fn echo(&mut self, line: &str) -> Result<()> {
        println!("{} {}", "<".dimmed(), line);
        self.log_line(line)
    }

    fn log_line(&mut self, line: &str) -> Result<()> {
        if let Some(writer) = self.transcript.as_mut() {
            let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
            writeln!(writer, "[{timestamp}] {line}")?;
            writer.flush()?;
        }
        Ok(())
    }
}
