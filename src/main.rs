//! Demo binary for pubhub
//!
//! Loads `.env`, the layered configuration and logging, then runs the
//! demonstration driver until it finishes or Ctrl-C is pressed.

use std::sync::Arc;

use pubhub::broker::Broker;
use pubhub::config::{LoggingSettings, Settings, load_config};
use pubhub::demo;
use pubhub::utils::logging;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            logging::init(&LoggingSettings::default());
            error!("Failed to load configuration: {}", e);
            return;
        }
    };
    logging::init(&config.logging);

    if let Err(e) = run(config).await {
        error!("Demo failed: {}", e);
    }
}

async fn run(config: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let broker = Arc::new(Broker::with_settings(config.broker.clone()));

    tokio::select! {
        result = demo::run(broker, config.demo) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    Ok(())
}
