//! End-to-end transfer scenarios driven through a scripted serial port.

use serial_snap::config::TransferConfig;
use serial_snap::serial::fake::{FakeEntry, FakeSerialPort};
use serial_snap::transfer::{OutcomeKind, ScreenshotClient};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::tempdir;

fn config_for(output: PathBuf) -> TransferConfig {
    TransferConfig {
        output_path: output,
        data_timeout: Duration::from_millis(200),
        ..TransferConfig::default()
    }
}

#[test]
fn download_reassembles_the_advertised_file() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("dashboard.bmp");
    let fake = FakeSerialPort::new(&[
        "SIZE:10",
        "DATA_START",
        "<SDATA>0102030405060708090A</>",
        "DATA_END",
    ]);
    let mut client = ScreenshotClient::new(fake, config_for(out.clone())).unwrap();

    let outcome = client.run().unwrap();

    assert_eq!(outcome.kind, OutcomeKind::Success);
    assert_eq!(outcome.bytes_written, 10);
    assert_eq!(std::fs::read(&out).unwrap(), (1u8..=10).collect::<Vec<_>>());
    assert_eq!(client.into_conn().writes(), ["DOWNLOAD"]);
}

#[test]
fn chunks_accumulate_across_frames() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out.bmp");
    let fake = FakeSerialPort::new(&[
        "SIZE:4",
        "DATA_START",
        "<SDATA>DEAD</>",
        "<SDATA>BEEF</>",
        "DATA_END",
    ]);
    let mut client = ScreenshotClient::new(fake, config_for(out.clone())).unwrap();

    let outcome = client.run().unwrap();

    assert_eq!(outcome.kind, OutcomeKind::Success);
    assert_eq!(std::fs::read(&out).unwrap(), vec![0xDE, 0xAD, 0xBE, 0xEF]);
}

#[test]
fn invalid_chunk_is_discarded_whole() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out.bmp");
    // Second frame carries lowercase hex and must contribute nothing
    let fake = FakeSerialPort::new(&[
        "DATA_START",
        "<SDATA>0102</>",
        "<SDATA>ab03</>",
        "<SDATA>04</>",
        "DATA_END",
    ]);
    let mut client = ScreenshotClient::new(fake, config_for(out.clone())).unwrap();

    let outcome = client.run().unwrap();

    assert_eq!(outcome.kind, OutcomeKind::Success);
    assert_eq!(std::fs::read(&out).unwrap(), vec![0x01, 0x02, 0x04]);
}

#[test]
fn empty_stream_reports_no_data_and_writes_nothing() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out.bmp");
    let fake = FakeSerialPort::new(&["SIZE:128", "DATA_START", "DATA_END"]);
    let mut client = ScreenshotClient::new(fake, config_for(out.clone())).unwrap();

    let outcome = client.run().unwrap();

    assert_eq!(outcome.kind, OutcomeKind::NoData);
    assert_eq!(outcome.bytes_written, 0);
    assert!(!out.exists());
}

#[test]
fn file_not_found_fails_before_streaming() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out.bmp");
    let fake = FakeSerialPort::new(&["ERROR: File not found"]);
    let mut client = ScreenshotClient::new(fake, config_for(out.clone())).unwrap();

    let outcome = client.run().unwrap();

    assert_eq!(outcome.kind, OutcomeKind::FileNotFound);
    assert!(!out.exists());
}

#[test]
fn stalled_stream_times_out_despite_buffered_data() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out.bmp");
    let fake = FakeSerialPort::with_entries(vec![
        FakeEntry::line("DATA_START"),
        FakeEntry::line("<SDATA>0102</>"),
        FakeEntry::quiet(Duration::from_millis(250)),
    ]);
    let mut client = ScreenshotClient::new(fake, config_for(out.clone())).unwrap();

    let outcome = client.run().unwrap();

    assert_eq!(outcome.kind, OutcomeKind::Timeout);
    assert_eq!(outcome.bytes_written, 0);
    assert!(!out.exists());
}

#[test]
fn silent_device_times_out_before_data_start() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out.bmp");
    let fake = FakeSerialPort::with_entries(vec![FakeEntry::quiet(Duration::from_millis(250))]);
    let mut client = ScreenshotClient::new(fake, config_for(out.clone())).unwrap();

    let outcome = client.run().unwrap();

    assert_eq!(outcome.kind, OutcomeKind::Timeout);
}

#[test]
fn unrecognized_lines_are_ignored() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out.bmp");
    let fake = FakeSerialPort::new(&[
        "[DOWNLOAD] Starting file transfer...",
        "SIZE:2",
        "DATA_START",
        "[WIFI] reconnecting...",
        "<SDATA>CAFE</>",
        "DATA_END",
    ]);
    let mut client = ScreenshotClient::new(fake, config_for(out.clone())).unwrap();

    let outcome = client.run().unwrap();

    assert_eq!(outcome.kind, OutcomeKind::Success);
    assert_eq!(std::fs::read(&out).unwrap(), vec![0xCA, 0xFE]);
}

#[test]
fn capture_then_download_issues_commands_in_order() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out.bmp");
    let fake = FakeSerialPort::new(&[
        "[CMD] Taking screenshot...",
        "[CMD] Screenshot saved to /dashboard.bmp",
        "SIZE:2",
        "DATA_START",
        "<SDATA>4142</>",
        "DATA_END",
    ]);
    let config = TransferConfig {
        capture_first: true,
        ..config_for(out.clone())
    };
    let mut client = ScreenshotClient::new(fake, config).unwrap();

    let outcome = client.run().unwrap();

    assert_eq!(outcome.kind, OutcomeKind::Success);
    assert_eq!(std::fs::read(&out).unwrap(), b"AB");
    assert_eq!(client.into_conn().writes(), ["SCREENSHOT", "DOWNLOAD"]);
}

#[test]
fn rerun_overwrites_the_output_identically() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out.bmp");
    let script = [
        "SIZE:3",
        "DATA_START",
        "<SDATA>010203</>",
        "DATA_END",
    ];

    for _ in 0..2 {
        let fake = FakeSerialPort::new(&script);
        let mut client = ScreenshotClient::new(fake, config_for(out.clone())).unwrap();
        let outcome = client.run().unwrap();
        assert_eq!(outcome.kind, OutcomeKind::Success);
        assert_eq!(std::fs::read(&out).unwrap(), vec![0x01, 0x02, 0x03]);
    }
}

#[test]
fn transcript_log_records_device_lines() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out.bmp");
    let log = dir.path().join("session.log");
    let fake = FakeSerialPort::new(&["SIZE:1", "DATA_START", "<SDATA>FF</>", "DATA_END"]);
    let config = TransferConfig {
        log_file: Some(log.clone()),
        ..config_for(out)
    };
    let mut client = ScreenshotClient::new(fake, config).unwrap();

    client.run().unwrap();

    let transcript = std::fs::read_to_string(&log).unwrap();
    assert!(transcript.contains("SIZE:1"));
    assert!(transcript.contains("DATA_START"));
    // Chunk frames are not logged
    assert!(!transcript.contains("<SDATA>"));
}
