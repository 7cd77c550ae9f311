use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::JournalError;

/// One consumed journal record. `value` is `None` for tombstones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalRecord {
    pub partition: u32,
    pub offset: u64,
    pub key: Vec<u8>,
    pub value: Option<Vec<u8>>,
}

/// Write side of the journal topic.
#[async_trait]
pub trait JournalProducer: Send + Sync {
    /// Produce one record. Resolves once the broker acknowledges the write;
    /// an error means the record may not be durable and the caller must not
    /// wait for it to apply.
    async fn send(
        &self,
        partition_key: &str,
        key: Vec<u8>,
        value: Option<Vec<u8>>,
    ) -> Result<(), JournalError>;
}

/// Read side of the journal topic. One consumer per node; every consumer
/// observes the full log from the earliest retained offset.
#[async_trait]
pub trait JournalConsumer: Send {
    /// Poll for the next batch, waiting at most `timeout`. An empty batch is
    /// not an error.
    async fn poll(&mut self, timeout: Duration) -> Result<Vec<JournalRecord>, JournalError>;
}

/// A journal adapter: hands out the shared producer and fresh full-replay
/// subscribers.
pub trait Journal: Send + Sync + 'static {
    fn producer(&self) -> Arc<dyn JournalProducer>;
    fn subscribe(&self) -> Box<dyn JournalConsumer>;
}
