//! Serial transport for the screenshot protocol.
//!
//! [`port`] wraps a real `serialport` handle (behind the `serial` feature);
//! [`fake`] is a scripted stand-in for tests. Both implement [`LineIo`], the
//! seam the transfer client is written against.

pub mod fake;
#[cfg(feature = "serial")]
pub mod port;

#[cfg(feature = "serial")]
pub use port::{PortConfig, SerialConnection};

use crate::error::Result;

/// Line-oriented duplex used by the transfer client.
pub trait LineIo {
    /// Send one command line; the transport appends the newline.
    fn write_line(&mut self, line: &str) -> Result<()>;

    /// Read one line, trimmed of trailing CR/LF.
    ///
    /// Blocks for at most the transport's read timeout and returns
    /// `Ok(None)` when the interval passed without any data.
    fn read_line(&mut self) -> Result<Option<String>>;
}
