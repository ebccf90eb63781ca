//! Record rendering for the firehose CLI.

use anyhow::Result;
use clap::ValueEnum;
use firehose_lib::prelude::*;

/// How each record is printed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum Format {
    /// `<screen_name> : <text>`
    #[default]
    Text,
    /// The record's JSON object on one line.
    Json,
}

/// Renders one record as a single output line, without the newline.
pub(crate) fn render(record: &Record, format: Format) -> Result<String> {
    Ok(match format {
        Format::Text => record.to_string(),
        Format::Json => serde_json::to_string(record)?,
    })
}
