use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use rdkafka::Message;
use tracing::warn;
use uuid::Uuid;

use crate::codec::partition_for;
use crate::config::JournalConfig;
use crate::error::JournalError;
use crate::traits::{Journal, JournalConsumer, JournalProducer, JournalRecord};

const PRODUCE_TIMEOUT: Duration = Duration::from_secs(30);
const BATCH_MAX: usize = 64;

/// Kafka-backed journal. Partitioning is computed client-side from the
/// partition key so that every producer routes identically regardless of the
/// broker's default partitioner.
pub struct KafkaJournal {
    config: JournalConfig,
    producer: Arc<KafkaProducer>,
}

impl KafkaJournal {
    pub fn connect(config: JournalConfig) -> Result<Arc<Self>, JournalError> {
        let mut client = ClientConfig::new();
        client.set("bootstrap.servers", &config.bootstrap_servers);
        for (k, v) in &config.producer_properties {
            client.set(k, v);
        }
        let producer: FutureProducer = client
            .create()
            .map_err(|e| JournalError::Connection(e.to_string()))?;

        Ok(Arc::new(Self {
            producer: Arc::new(KafkaProducer {
                topic: config.topic.clone(),
                partitions: config.partitions,
                producer,
            }),
            config,
        }))
    }
}

impl Journal for KafkaJournal {
    fn producer(&self) -> Arc<dyn JournalProducer> {
        self.producer.clone()
    }

    fn subscribe(&self) -> Box<dyn JournalConsumer> {
        Box::new(KafkaConsumerAdapter {
            config: self.config.clone(),
            consumer: None,
        })
    }
}

struct KafkaProducer {
    topic: String,
    partitions: u32,
    producer: FutureProducer,
}

#[async_trait]
impl JournalProducer for KafkaProducer {
    async fn send(
        &self,
        partition_key: &str,
        key: Vec<u8>,
        value: Option<Vec<u8>>,
    ) -> Result<(), JournalError> {
        let partition = partition_for(partition_key, self.partitions) as i32;
        let mut record: FutureRecord<'_, Vec<u8>, Vec<u8>> = FutureRecord::to(&self.topic)
            .key(&key)
            .partition(partition);
        if let Some(value) = value.as_ref() {
            record = record.payload(value);
        }

        self.producer
            .send(record, Timeout::After(PRODUCE_TIMEOUT))
            .await
            .map(|_| ())
            .map_err(|(e, _)| JournalError::Produce(e.to_string()))
    }
}

struct KafkaConsumerAdapter {
    config: JournalConfig,
    consumer: Option<StreamConsumer>,
}

impl KafkaConsumerAdapter {
    /// Each subscriber is its own consumer group reading from the earliest
    /// offset: a node replays the whole journal on every start.
    fn ensure_consumer(&mut self) -> Result<&StreamConsumer, JournalError> {
        if self.consumer.is_none() {
            let mut client = ClientConfig::new();
            client
                .set("bootstrap.servers", &self.config.bootstrap_servers)
                .set("group.id", format!("registry-node-{}", Uuid::new_v4()))
                .set("auto.offset.reset", "earliest")
                .set("enable.auto.commit", "false");
            for (k, v) in &self.config.consumer_properties {
                client.set(k, v);
            }
            let consumer: StreamConsumer = client
                .create()
                .map_err(|e| JournalError::Connection(e.to_string()))?;
            consumer
                .subscribe(&[self.config.topic.as_str()])
                .map_err(|e| JournalError::Connection(e.to_string()))?;
            self.consumer = Some(consumer);
        }
        Ok(self.consumer.as_ref().expect("consumer just created"))
    }
}

#[async_trait]
impl JournalConsumer for KafkaConsumerAdapter {
    async fn poll(&mut self, timeout: Duration) -> Result<Vec<JournalRecord>, JournalError> {
        let consumer = self.ensure_consumer()?;
        let mut batch = Vec::new();
        let deadline = tokio::time::Instant::now() + timeout;

        while batch.len() < BATCH_MAX {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                break;
            }
            match tokio::time::timeout(remaining, consumer.recv()).await {
                Ok(Ok(message)) => {
                    let key = match message.key() {
                        Some(key) => key.to_vec(),
                        None => {
                            warn!(
                                partition = message.partition(),
                                offset = message.offset(),
                                "Skipping journal record without a key"
                            );
                            continue;
                        }
                    };
                    batch.push(JournalRecord {
                        partition: message.partition() as u32,
                        offset: message.offset() as u64,
                        key,
                        value: message.payload().map(|p| p.to_vec()),
                    });
                }
                Ok(Err(e)) => return Err(JournalError::Consume(e.to_string())),
                Err(_) => break,
            }
        }
        Ok(batch)
    }
}
