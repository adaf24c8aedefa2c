use serde::Deserialize;

/// Top-level configuration settings for the application.
///
/// Includes settings for the broker core, logging and the demonstration driver.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    pub broker: BrokerSettings,
    pub logging: LoggingSettings,
    pub demo: DemoSettings,
}

/// What a delivery does when the target mailbox has no free slot.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Park the delivery until a slot frees up or the subscriber is done.
    #[default]
    Block,
    /// Discard the message immediately.
    Drop,
}

/// Configuration settings for the broker.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct BrokerSettings {
    pub overflow: OverflowPolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
}

/// Configuration settings for the demonstration driver.
///
/// Controls which topics are exercised, how often messages are published and
/// how long the run lasts.
#[derive(Debug, Deserialize, Clone)]
pub struct DemoSettings {
    pub topics: Vec<String>,
    pub subscriber_capacity: i64,
    pub min_interval_ms: u64,
    pub max_interval_ms: u64,
    pub run_secs: u64,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub broker: Option<PartialBrokerSettings>,
    pub logging: Option<PartialLoggingSettings>,
    pub demo: Option<PartialDemoSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialBrokerSettings {
    pub overflow: Option<OverflowPolicy>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartialDemoSettings {
    pub topics: Option<Vec<String>>,
    pub subscriber_capacity: Option<i64>,
    pub min_interval_ms: Option<u64>,
    pub max_interval_ms: Option<u64>,
    pub run_secs: Option<u64>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            topics: (1..=4).map(|i| format!("TOPIC_{i}")).collect(),
            subscriber_capacity: 0,
            min_interval_ms: 100,
            max_interval_ms: 900,
            run_secs: 30,
        }
    }
}
