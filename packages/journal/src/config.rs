use std::collections::HashMap;

use serde::Deserialize;

/// Journal topic configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct JournalConfig {
    /// Topic holding the mutation journal. Default: "registry-journal".
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Broker bootstrap servers (Kafka adapter). Default: "localhost:9092".
    #[serde(default = "default_bootstrap_servers")]
    pub bootstrap_servers: String,
    /// Partition count the producer routes over. Must match the topic.
    /// Default: 1.
    #[serde(default = "default_partitions")]
    pub partitions: u32,
    /// Consumer poll timeout in milliseconds. Default: 1000.
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
    /// Extra producer properties passed through to the broker client.
    #[serde(default)]
    pub producer_properties: HashMap<String, String>,
    /// Extra consumer properties passed through to the broker client.
    #[serde(default)]
    pub consumer_properties: HashMap<String, String>,
}

fn default_topic() -> String {
    "registry-journal".into()
}
fn default_bootstrap_servers() -> String {
    "localhost:9092".into()
}
fn default_partitions() -> u32 {
    1
}
fn default_poll_timeout_ms() -> u64 {
    1000
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            topic: default_topic(),
            bootstrap_servers: default_bootstrap_servers(),
            partitions: default_partitions(),
            poll_timeout_ms: default_poll_timeout_ms(),
            producer_properties: HashMap::new(),
            consumer_properties: HashMap::new(),
        }
    }
}
