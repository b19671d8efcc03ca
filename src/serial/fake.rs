//! Scripted serial port for tests.

use crate::error::{Error, Result};
use crate::serial::LineIo;
use std::collections::VecDeque;
use std::time::Duration;

/// One scripted read result.
pub struct FakeEntry {
    response: Result<Option<String>>,
    delay: Option<Duration>,
}

impl FakeEntry {
    /// A line received from the device.
    pub fn line(line: &str) -> Self {
        Self {
            response: Ok(Some(line.to_string())),
            delay: None,
        }
    }

    /// A quiet read timeout lasting `delay`.
    pub fn quiet(delay: Duration) -> Self {
        Self {
            response: Ok(None),
            delay: Some(delay),
        }
    }

    /// A transport error.
    pub fn error(err: Error) -> Self {
        Self {
            response: Err(err),
            delay: None,
        }
    }
}

/// Minimal fake serial port used in tests to script reads and record writes.
///
/// Once the script is exhausted, reads return `Ok(None)` immediately, like a
/// port that has gone quiet.
#[derive(Default)]
pub struct FakeSerialPort {
    script: VecDeque<FakeEntry>,
    writes: Vec<String>,
}

impl FakeSerialPort {
    pub fn new(lines: &[&str]) -> Self {
        Self::with_entries(lines.iter().map(|l| FakeEntry::line(l)).collect())
    }

    pub fn with_entries(script: Vec<FakeEntry>) -> Self {
        Self {
            script: script.into(),
            writes: Vec::new(),
        }
    }

    /// Commands the client has sent, in order, without trailing newlines.
    pub fn writes(&self) -> &[String] {
        &self.writes
    }
}

impl LineIo for FakeSerialPort {
    fn write_line(&mut self, line: &str) -> Result<()> {
        self.writes.push(line.to_string());
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        match self.script.pop_front() {
            Some(entry) => {
                if let Some(delay) = entry.delay {
                    std::thread::sleep(delay);
                }
                entry.response
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_script_then_goes_quiet() {
        let mut fake = FakeSerialPort::new(&["hello", "world"]);
        assert_eq!(fake.read_line().unwrap().as_deref(), Some("hello"));
        assert_eq!(fake.read_line().unwrap().as_deref(), Some("world"));
        assert_eq!(fake.read_line().unwrap(), None);
    }

    #[test]
    fn records_writes() {
        let mut fake = FakeSerialPort::new(&[]);
        fake.write_line("DOWNLOAD").unwrap();
        assert_eq!(fake.writes(), ["DOWNLOAD"]);
    }

    #[test]
    fn quiet_entry_blocks_for_its_delay() {
        let mut fake = FakeSerialPort::with_entries(vec![FakeEntry::quiet(
            Duration::from_millis(20),
        )]);
        let start = std::time::Instant::now();
        assert_eq!(fake.read_line().unwrap(), None);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
