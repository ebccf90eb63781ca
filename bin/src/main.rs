//! firehose CLI - Reads records from a streaming JSON endpoint.

use anyhow::{Context, Result};
use clap::Parser;
use firehose_lib::prelude::*;
use firehose_lib::{DEFAULT_ENDPOINT, DEFAULT_HOST, DEFAULT_PORT};
use std::io::Write;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod display;

use display::Format;

#[derive(Parser, Debug)]
#[command(name = "firehose")]
#[command(about = "Reads records from a newline-delimited JSON streaming endpoint", long_about = None)]
#[command(version)]
struct Cli {
    /// Account username
    #[arg(short, long)]
    username: String,

    /// Account password
    #[arg(short, long)]
    password: String,

    /// Stop after this many records (0 for no limit)
    #[arg(short = 'n', long)]
    max_records: Option<u64>,

    /// Stop after this many seconds
    #[arg(short = 't', long)]
    max_seconds: Option<u64>,

    /// Streaming host
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Streaming port (443 uses TLS)
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Request path of the streaming endpoint
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: Format,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn deadline(&self) -> Deadline {
        self.max_seconds
            .map_or_else(Deadline::none, |secs| Deadline::after(Duration::from_secs(secs)))
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let deadline = cli.deadline();
    let credentials = Credentials::new(cli.username, cli.password).context("invalid credentials")?;
    let session = Session::new(credentials, cli.host, cli.port);
    let config = StreamConfig {
        endpoint: cli.endpoint,
        ..StreamConfig::default()
    };

    let mut consumer =
        StreamConsumer::new(session, config).context("failed to set up the stream client")?;
    consumer.set_record_limit(cli.max_records);
    consumer.set_deadline(deadline);

    let mut stdout = std::io::stdout().lock();
    while let Some(record) = consumer.next_record().await.map_err(|e| {
        anyhow::anyhow!("stream failed with code {}: {}", e.code(), e.message())
    })? {
        writeln!(stdout, "{}", display::render(&record, cli.format)?)?;
        stdout.flush()?;
    }

    info!(
        records = consumer.records_emitted(),
        state = ?consumer.state(),
        "stream finished"
    );
    Ok(())
}
