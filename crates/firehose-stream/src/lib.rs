//! Connection and read core for the firehose streaming client.
//!
//! - [`LineReader`] - Frames `\r\n`-terminated lines out of a byte stream
//! - [`Dialer`] / [`NetDialer`] - Name resolution and transport dialing
//! - [`ConnectionManager`] - Resolve, dial, handshake, header skip
//! - [`StreamConsumer`] - Record loop with limit, deadline and reconnects
//! - [`request`] - Handshake request text and status line parsing

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/firehose/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod connection;
mod consumer;
mod dialer;
mod line_reader;
pub mod request;

#[cfg(test)]
mod testing;

pub use config::{DEFAULT_ENDPOINT, Security, StreamConfig};
pub use connection::ConnectionManager;
pub use consumer::{ConsumerState, StreamConsumer};
pub use dialer::{BoxTransport, Dialer, NetDialer, Transport};
pub use line_reader::{CRLF, LineReader, MAX_LINE_LEN};
