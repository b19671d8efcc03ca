//! Error types shared across the crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The serial port could not be opened or configured.
    #[error("serial connection failed: {0}")]
    Connection(String),

    /// The device reached a terminal protocol condition.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A data chunk failed hex validation. Never fatal to a transfer; the
    /// chunk is discarded and the stream continues.
    #[error("invalid chunk data: {0}")]
    Data(String),

    /// A configuration file could not be parsed.
    #[error("config error: {0}")]
    Config(String),

    /// The user interrupted the run with Ctrl+C.
    #[error("interrupted by user")]
    Interrupted,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
