use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fanout_publisher::config::{find_config_file, load_settings};
use fanout_publisher::{BrokerConfig, Publisher, PublisherSettings};

fn load() -> Result<PublisherSettings> {
    if let Ok(path) = find_config_file() {
        info!("Loading configuration from {}", path.display());
        return load_settings(&path);
    }

    let broker = BrokerConfig::from_env()?;
    let exchange = std::env::var("FANOUT_EXCHANGE")
        .context("No config file found and FANOUT_EXCHANGE is not set")?;
    Ok(PublisherSettings::new(exchange, broker))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env first so RUST_LOG from it reaches the filter.
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let settings = load()?;

    let publisher = Arc::new(
        Publisher::new(&settings.exchange, settings.broker.clone())
            .with_reconnect_policy(settings.reconnect.to_policy()),
    );
    let (tx, rx) = mpsc::channel(settings.queue_capacity);
    let worker = publisher.start(rx);

    info!(exchange = %settings.exchange, "Forwarding stdin lines. Press Ctrl+C or close stdin to exit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    if tx.send(line.into_bytes()).await.is_err() {
                        warn!("Publisher stopped, no longer accepting input");
                        break;
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    // Closing the queue lets the worker drain what is buffered and shut down.
    drop(tx);
    worker.await.context("Publisher task panicked")?;
    info!(ready = publisher.is_ready(), "Publisher finished");

    Ok(())
}
