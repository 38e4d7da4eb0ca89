/// Replays recorded occurrences through the event reporter and prints or
/// stores whatever gets forwarded.
use anyhow::{Context, Result};
use clap::Parser;
use event_reporter::{
    ChannelSink, Config, EventReporter, ObjectNameExtractor, dispatcher::Dispatcher, logger,
    outputs::create_enabled_outputs, replay::Policy, replay::Replayer,
};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::io::{AsyncBufRead, BufReader};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Define command line arguments using clap
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE", env = "EVENT_REPORTER_CONFIG")]
    config: Option<PathBuf>,

    /// JSON-lines occurrence file, stdin when omitted
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Policy for records that do not name one
    #[arg(short, long, value_enum, default_value = "bounded")]
    policy: Policy,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let _logger = logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!("{:#}", e);
        eprintln!("event_reporter failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let conf = match &cli.config {
        Some(path) => {
            tracing::debug!("Config path: {:?}", path);
            Config::new(path)?
        }
        None => Config::default(),
    };
    tracing::debug!("config: {:?}", conf);

    let (sink, rx) = ChannelSink::channel(conf.output.buffer_len);
    let dispatcher = Dispatcher::new(create_enabled_outputs(&conf), rx);
    let dispatcher_handle = tokio::spawn(dispatcher.run());

    let reporter = EventReporter::with_window(
        Arc::new(sink),
        Arc::new(ObjectNameExtractor),
        conf.limiter.max_forwards_per_window,
        conf.limiter.window_delta()?,
    );
    tracing::info!(
        "Reporter started: {} forwards per {} minute window",
        reporter.max_forwards_per_window(),
        reporter.window().num_minutes()
    );

    let replayer = Replayer::new(reporter, cli.policy);
    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &cli.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open input: {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };
    let summary = replayer.run(reader).await?;
    let tracked = replayer.reporter().tracked_signatures();

    // Dropping the replayer drops the last sender, letting the dispatcher drain and stop.
    drop(replayer);
    match tokio::time::timeout(SHUTDOWN_TIMEOUT, dispatcher_handle).await {
        Ok(Ok(forwarded)) => {
            tracing::info!(
                "Replay complete: {} applied, {} skipped, {} forwarded, {} signatures tracked",
                summary.applied,
                summary.skipped,
                forwarded,
                tracked
            );
        }
        Ok(Err(e)) => tracing::warn!("Dispatcher failed: {}", e),
        Err(_) => tracing::warn!(
            "Dispatcher did not finish within {} seconds",
            SHUTDOWN_TIMEOUT.as_secs()
        ),
    }

    Ok(())
}
