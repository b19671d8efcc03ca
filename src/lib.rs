//! Serial screenshot downloader.
//!
//! Retrieves a screenshot from a serial-attached embedded dashboard. The
//! device exposes a line-based console protocol: the host sends single-word
//! commands (`SCREENSHOT`, `DOWNLOAD`, `LIST`) and the device answers with
//! framed status lines and, for downloads, a stream of hex-encoded data
//! chunks that this crate reassembles into the original file.
//!
//! The transfer logic in [`transfer`] is written against the [`serial::LineIo`]
//! seam, so it runs identically over a real port ([`serial::port`], behind the
//! `serial` feature) and over the scripted fake used in tests.

pub mod config;
pub mod error;
pub mod interrupt;
pub mod protocol;
pub mod serial;
pub mod transfer;

pub use error::{Error, Result};
