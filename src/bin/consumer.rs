use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region};
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use kinesis_fanout::{
    ConsumerConfig, DiscardSink, EchoSink, IteratorPosition, KinesisConsumer, RecordSink,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "kinesis-consumer")]
#[command(about = "Read every shard of a Kinesis stream in parallel for a fixed time")]
#[command(version)]
struct Cli {
    #[arg(help = "Name of the stream to read")]
    stream_name: String,

    #[arg(long, default_value = "us-east-1")]
    region: String,

    #[arg(long, default_value_t = 30.0, help = "Seconds each shard worker runs")]
    worker_time: f64,

    #[arg(long, default_value_t = 0.1, help = "Seconds to sleep between fetches")]
    sleep_interval: f64,

    #[arg(long, default_value_t = 3, help = "Shard workers allowed to run at once")]
    max_workers: usize,

    #[arg(long, value_enum, default_value_t = IteratorKind::TrimHorizon)]
    iterator_type: IteratorKind,

    #[arg(long, help = "Start at this RFC 3339 timestamp, overrides --iterator-type")]
    start_timestamp: Option<DateTime<Utc>>,

    #[arg(long, help = "Count records without echoing them")]
    no_echo: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum IteratorKind {
    TrimHorizon,
    Latest,
}

impl Cli {
    fn iterator_position(&self) -> IteratorPosition {
        match (self.start_timestamp, self.iterator_type) {
            (Some(timestamp), _) => IteratorPosition::AtTimestamp(timestamp),
            (None, IteratorKind::TrimHorizon) => IteratorPosition::TrimHorizon,
            (None, IteratorKind::Latest) => IteratorPosition::Latest,
        }
    }

    fn config(&self) -> Result<ConsumerConfig> {
        Ok(ConsumerConfig {
            stream_name: self.stream_name.clone(),
            worker_duration: Duration::try_from_secs_f64(self.worker_time)
                .context("invalid --worker-time")?,
            poll_interval: Duration::try_from_secs_f64(self.sleep_interval)
                .context("invalid --sleep-interval")?,
            max_concurrency: self.max_workers,
            iterator_position: self.iterator_position(),
            ..Default::default()
        })
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kinesis_fanout=info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = cli.config()?;

    let aws_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(cli.region.clone()))
        .load()
        .await;
    let client = aws_sdk_kinesis::Client::new(&aws_config);

    let sink: Arc<dyn RecordSink> = if cli.no_echo {
        Arc::new(DiscardSink)
    } else {
        Arc::new(EchoSink)
    };

    info!(stream = %config.stream_name, region = %cli.region, "Consumer configured");

    let summary = KinesisConsumer::new(config, client, sink).run().await?;
    println!("{}", summary);

    Ok(())
}
