//! Wire protocol spoken by the on-device screenshot server.
//!
//! The device console is newline-delimited ASCII: single-word commands from
//! the host, status and data lines back. Binary payloads arrive as uppercase
//! hex pairs inside `<SDATA>...</>` frames between `DATA_START` and
//! `DATA_END` markers.

use crate::error::{Error, Result};

/// Request a screenshot capture on the device.
pub const CMD_SCREENSHOT: &str = "SCREENSHOT";

/// Request transfer of the stored screenshot.
pub const CMD_DOWNLOAD: &str = "DOWNLOAD";

/// Request a listing of the device filesystem.
pub const CMD_LIST: &str = "LIST";

/// Marks the start of the chunk stream.
pub const DATA_START: &str = "DATA_START";

/// Marks the end of the chunk stream.
pub const DATA_END: &str = "DATA_END";

/// Prefix advertising the total file size in bytes.
pub const SIZE_PREFIX: &str = "SIZE:";

/// Device response when no screenshot file exists yet.
pub const ERR_FILE_NOT_FOUND: &str = "ERROR: File not found";

/// Substring of the status line confirming a capture.
pub const CAPTURE_SAVED: &str = "[CMD] Screenshot saved";

/// Substring of the status line reporting a failed capture.
pub const CAPTURE_FAILED: &str = "[CMD] Screenshot failed";

/// Terminates a `LIST` response.
pub const LIST_DONE: &str = "OK";

const CHUNK_OPEN: &str = "<SDATA>";
const CHUNK_CLOSE: &str = "</>";

/// One classified line of device output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceLine<'a> {
    /// `SIZE:<n>` advertisement. Informational; never terminates a transfer.
    Size(u64),
    DataStart,
    DataEnd,
    /// `<SDATA>...</>` frame; the payload is the undecoded hex text.
    Chunk(&'a str),
    FileNotFound,
    CaptureSaved,
    CaptureFailed,
    Empty,
    /// Anything else; echoed or ignored depending on the transfer phase.
    Other(&'a str),
}

/// Classify a single trimmed line of device output.
pub fn classify(line: &str) -> DeviceLine<'_> {
    if line.is_empty() {
        return DeviceLine::Empty;
    }

    if let Some(rest) = line.strip_prefix(SIZE_PREFIX) {
        if let Ok(size) = rest.trim().parse::<u64>() {
            return DeviceLine::Size(size);
        }
        // A malformed size advertisement is ignored like any other
        // unrecognized status line.
        return DeviceLine::Other(line);
    }

    match line {
        DATA_START => return DeviceLine::DataStart,
        DATA_END => return DeviceLine::DataEnd,
        ERR_FILE_NOT_FOUND => return DeviceLine::FileNotFound,
        _ => {}
    }

    if let Some(payload) = line
        .strip_prefix(CHUNK_OPEN)
        .and_then(|rest| rest.strip_suffix(CHUNK_CLOSE))
    {
        return DeviceLine::Chunk(payload);
    }

    // Capture results arrive embedded in longer status lines, e.g.
    // "[CMD] Screenshot saved to /dashboard.bmp".
    if line.contains(CAPTURE_SAVED) {
        return DeviceLine::CaptureSaved;
    }
    if line.contains(CAPTURE_FAILED) {
        return DeviceLine::CaptureFailed;
    }

    DeviceLine::Other(line)
}

/// Decode a chunk payload of uppercase hex pairs.
///
/// The whole payload is validated before any byte is produced: a single
/// character outside `0-9A-F` rejects the chunk. Lowercase hex is rejected,
/// not normalized; the device only ever emits uppercase. An odd trailing
/// digit has no pairing byte and is dropped.
pub fn decode_chunk(payload: &str) -> Result<Vec<u8>> {
    if !payload
        .bytes()
        .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
    {
        let preview: String = payload.chars().take(20).collect();
        return Err(Error::Data(format!("non-hex character in chunk: {preview}")));
    }

    let bytes = payload.as_bytes();
    let mut out = Vec::with_capacity(bytes.len() / 2);
    for pair in bytes.chunks_exact(2) {
        out.push((hex_val(pair[0]) << 4) | hex_val(pair[1]));
    }
    Ok(out)
}

fn hex_val(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        _ => b - b'A' + 10,
    }
}
