use crate::config::{ConsumerConfig, ProducerConfig};
use std::sync::Once;
use std::time::Duration;

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive("kinesis_fanout=debug".parse().expect("valid directive")),
            )
            .with_test_writer()
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .try_init()
            .ok();
    });
}

pub fn create_consumer_config() -> ConsumerConfig {
    ConsumerConfig {
        stream_name: "test-stream".to_string(),
        worker_duration: Duration::from_secs(2),
        poll_interval: Duration::from_millis(10),
        throttle_backoff: Duration::from_secs(1),
        ..Default::default()
    }
}

pub fn create_producer_config() -> ProducerConfig {
    ProducerConfig {
        stream_name: "test-stream".to_string(),
        batch_size: 3,
        max_records: None,
        sleep_interval: Duration::from_millis(50),
        ..Default::default()
    }
}
