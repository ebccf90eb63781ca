//! Resilient client for newline-delimited JSON streaming APIs.
//!
//! This is a facade crate that re-exports functionality from the firehose
//! workspace crates for convenient access.
//!
//! # Quick Start
//!
//! ```ignore
//! use firehose_lib::prelude::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let session = Session::with_defaults(Credentials::new("user", "secret")?);
//!     let mut consumer = StreamConsumer::new(session, StreamConfig::default())?;
//!     consumer.set_record_limit(Some(100));
//!     consumer.set_deadline(Deadline::after(Duration::from_secs(60)));
//!
//!     while let Some(record) = consumer.next_record().await? {
//!         println!("{record}");
//!     }
//!
//!     Ok(())
//! }
//! ```

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/firehose/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use firehose_types::*;

// Re-export backoff
pub use firehose_backoff::{
    Backoff, BackoffClass, BackoffPolicies, BackoffPolicy, BackoffState, Classification, Growth,
};

// Re-export the stream client
#[cfg(feature = "stream")]
pub use firehose_stream::{
    ConnectionManager, ConsumerState, DEFAULT_ENDPOINT, Dialer, LineReader, NetDialer, Security,
    StreamConfig, StreamConsumer, request,
};

/// Prelude module for convenient imports.
///
/// ```
/// use firehose_lib::prelude::*;
/// ```
pub mod prelude {
    pub use firehose_types::{
        Credentials, Deadline, FirehoseError, Record, RecordLimit, Result, Session,
    };

    pub use firehose_backoff::{BackoffPolicies, BackoffPolicy};

    #[cfg(feature = "stream")]
    pub use firehose_stream::{ConsumerState, Security, StreamConfig, StreamConsumer};
}
