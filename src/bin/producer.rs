use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region};
use clap::Parser;
use kinesis_fanout::{CsvRecordSource, ProducerConfig, ProducerPipeline, ThrottlePolicy};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "kinesis-producer")]
#[command(about = "Write the rows of a CSV file to a Kinesis stream in batches")]
#[command(version)]
struct Cli {
    #[arg(help = "Name of the stream to write")]
    stream_name: String,

    #[arg(help = "CSV file with a header row")]
    file_name: PathBuf,

    #[arg(long, default_value = "us-east-1")]
    region: String,

    #[arg(long, default_value_t = 0.2, help = "Seconds to sleep after each full batch")]
    sleep_interval: f64,

    #[arg(long, default_value_t = 10, help = "Records per PutRecords call")]
    batch_size: usize,

    #[arg(long, default_value_t = 10, help = "Records to read from the file, 0 for all")]
    max_records: usize,

    #[arg(long, help = "Field used as partition key; random keys when unset")]
    partition_key: Option<String>,

    #[arg(long, help = "Resubmit a throttled batch up to N times instead of dropping it")]
    retry_throttled: Option<u32>,
}

impl Cli {
    fn config(&self) -> Result<ProducerConfig> {
        Ok(ProducerConfig {
            stream_name: self.stream_name.clone(),
            batch_size: self.batch_size,
            max_records: (self.max_records > 0).then_some(self.max_records),
            sleep_interval: Duration::try_from_secs_f64(self.sleep_interval)
                .context("invalid --sleep-interval")?,
            partition_key: self.partition_key.clone(),
            throttle_policy: self
                .retry_throttled
                .map_or(ThrottlePolicy::Drop, |max_attempts| ThrottlePolicy::Retry {
                    max_attempts,
                }),
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

    let source = CsvRecordSource::from_path(&cli.file_name)
        .with_context(|| format!("failed to open {}", cli.file_name.display()))?;

    let aws_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(cli.region.clone()))
        .load()
        .await;
    let client = Arc::new(aws_sdk_kinesis::Client::new(&aws_config));

    info!(
        stream = %config.stream_name,
        file = %cli.file_name.display(),
        region = %cli.region,
        "Producer configured"
    );

    let summary = ProducerPipeline::from_config(client, &config)?
        .run(source)
        .await?;
    println!("{}", summary);

    Ok(())
}
