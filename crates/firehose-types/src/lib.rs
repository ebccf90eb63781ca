//! Core types for the firehose streaming client.
//!
//! This crate provides the data model shared by every firehose crate:
//!
//! - [`Credentials`] / [`Session`] - Who connects, and to which host
//! - [`Deadline`] - Optional absolute stop time bounding every wait
//! - [`RecordLimit`] - Optional maximum record count with its counter
//! - [`Record`] - A decoded stream record
//! - [`FirehoseError`] - The single failure classification

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/firehose/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod deadline;
mod error;
mod limit;
mod record;
mod session;

pub use deadline::Deadline;
pub use error::{DeadlineExceeded, FirehoseError, Result, codes};
pub use limit::RecordLimit;
pub use record::Record;
pub use session::{Credentials, DEFAULT_HOST, DEFAULT_PORT, Session};
