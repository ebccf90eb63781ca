//! Reconnect backoff for the firehose streaming client.
//!
//! - [`Classification`] - Maps a [`FirehoseError`](firehose_types::FirehoseError) to a backoff class
//! - [`BackoffPolicies`] - Wait growth, cap and retry ceiling for each class
//! - [`Backoff`] - The per-run state machine that computes waits and gives up

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/firehose/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod controller;
mod policy;

pub use controller::{Backoff, BackoffState};
pub use policy::{
    BackoffClass, BackoffPolicies, BackoffPolicy, Classification, Growth, RATE_LIMITED_STATUSES,
    RETRYABLE_STATUSES,
};
