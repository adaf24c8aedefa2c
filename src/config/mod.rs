mod settings;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{BrokerSettings, DemoSettings, LoggingSettings, OverflowPolicy, Settings};

/// Loads the configuration from `config/default` and `PUBHUB_*` environment variables
/// Nested keys use a double underscore, e.g. `PUBHUB_BROKER__OVERFLOW=drop`
/// Anything left unspecified keeps its value from `Settings::default()`
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix("PUBHUB")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    // Merge with defaults
    let default = Settings::default();
    let demo = partial.demo;

    Ok(Settings {
        broker: BrokerSettings {
            overflow: partial
                .broker
                .and_then(|b| b.overflow)
                .unwrap_or(default.broker.overflow),
        },
        logging: LoggingSettings {
            level: partial
                .logging
                .and_then(|l| l.level)
                .unwrap_or(default.logging.level),
        },
        demo: DemoSettings {
            topics: demo
                .as_ref()
                .and_then(|d| d.topics.clone())
                .unwrap_or(default.demo.topics),
            subscriber_capacity: demo
                .as_ref()
                .and_then(|d| d.subscriber_capacity)
                .unwrap_or(default.demo.subscriber_capacity),
            min_interval_ms: demo
                .as_ref()
                .and_then(|d| d.min_interval_ms)
                .unwrap_or(default.demo.min_interval_ms),
            max_interval_ms: demo
                .as_ref()
                .and_then(|d| d.max_interval_ms)
                .unwrap_or(default.demo.max_interval_ms),
            run_secs: demo
                .as_ref()
                .and_then(|d| d.run_secs)
                .unwrap_or(default.demo.run_secs),
        },
    })
}
