use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::Notify;

use crate::codec::partition_for;
use crate::error::JournalError;
use crate::traits::{Journal, JournalConsumer, JournalProducer, JournalRecord};

#[derive(Clone)]
struct StoredRecord {
    key: Vec<u8>,
    value: Option<Vec<u8>>,
}

struct Shared {
    partitions: Vec<RwLock<Vec<StoredRecord>>>,
    appended: Notify,
}

/// In-process journal: a partitioned, append-only log kept in memory. Every
/// subscriber replays each partition from offset zero and then follows the
/// tail. This is the adapter used by tests and single-node deployments.
pub struct MemoryJournal {
    shared: Arc<Shared>,
}

impl MemoryJournal {
    pub fn new(partitions: u32) -> Arc<Self> {
        let partitions = partitions.max(1) as usize;
        Arc::new(Self {
            shared: Arc::new(Shared {
                partitions: (0..partitions).map(|_| RwLock::new(Vec::new())).collect(),
                appended: Notify::new(),
            }),
        })
    }

    /// Total record count across partitions.
    pub fn len(&self) -> usize {
        self.shared.partitions.iter().map(|p| p.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Journal for MemoryJournal {
    fn producer(&self) -> Arc<dyn JournalProducer> {
        Arc::new(MemoryProducer {
            shared: self.shared.clone(),
        })
    }

    fn subscribe(&self) -> Box<dyn JournalConsumer> {
        Box::new(MemoryConsumer {
            offsets: vec![0; self.shared.partitions.len()],
            shared: self.shared.clone(),
        })
    }
}

struct MemoryProducer {
    shared: Arc<Shared>,
}

#[async_trait]
impl JournalProducer for MemoryProducer {
    async fn send(
        &self,
        partition_key: &str,
        key: Vec<u8>,
        value: Option<Vec<u8>>,
    ) -> Result<(), JournalError> {
        let partition = partition_for(partition_key, self.shared.partitions.len() as u32) as usize;
        self.shared.partitions[partition]
            .write()
            .push(StoredRecord { key, value });
        self.shared.appended.notify_waiters();
        Ok(())
    }
}

struct MemoryConsumer {
    offsets: Vec<usize>,
    shared: Arc<Shared>,
}

impl MemoryConsumer {
    fn drain(&mut self) -> Vec<JournalRecord> {
        let mut batch = Vec::new();
        for (partition, log) in self.shared.partitions.iter().enumerate() {
            let log = log.read();
            let from = self.offsets[partition];
            for (i, record) in log[from..].iter().enumerate() {
                batch.push(JournalRecord {
                    partition: partition as u32,
                    offset: (from + i) as u64,
                    key: record.key.clone(),
                    value: record.value.clone(),
                });
            }
            self.offsets[partition] = log.len();
        }
        batch
    }
}

#[async_trait]
impl JournalConsumer for MemoryConsumer {
    async fn poll(&mut self, timeout: Duration) -> Result<Vec<JournalRecord>, JournalError> {
        // Register for wakeup before checking, otherwise an append between
        // the check and the await would be missed.
        let shared = self.shared.clone();
        let notified = shared.appended.notified();
        let batch = self.drain();
        if !batch.is_empty() {
            return Ok(batch);
        }

        match tokio::time::timeout(timeout, notified).await {
            Ok(()) => Ok(self.drain()),
            Err(_) => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLL: Duration = Duration::from_millis(50);

    async fn drain_all(consumer: &mut Box<dyn JournalConsumer>) -> Vec<JournalRecord> {
        let mut all = Vec::new();
        loop {
            let batch = consumer.poll(POLL).await.unwrap();
            if batch.is_empty() {
                return all;
            }
            all.extend(batch);
        }
    }

    #[tokio::test]
    async fn records_are_ordered_within_a_partition() {
        let journal = MemoryJournal::new(1);
        let producer = journal.producer();
        for i in 0..5u8 {
            producer.send("k", vec![i], Some(vec![i])).await.unwrap();
        }

        let mut consumer = journal.subscribe();
        let records = drain_all(&mut consumer).await;
        assert_eq!(records.len(), 5);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.offset, i as u64);
            assert_eq!(record.key, vec![i as u8]);
        }
    }

    #[tokio::test]
    async fn every_subscriber_replays_from_zero() {
        let journal = MemoryJournal::new(2);
        let producer = journal.producer();
        producer.send("a", b"k1".to_vec(), None).await.unwrap();
        producer
            .send("b", b"k2".to_vec(), Some(b"v".to_vec()))
            .await
            .unwrap();

        let mut first = journal.subscribe();
        let mut second = journal.subscribe();
        assert_eq!(drain_all(&mut first).await.len(), 2);
        assert_eq!(drain_all(&mut second).await.len(), 2);
    }

    #[tokio::test]
    async fn same_partition_key_routes_to_same_partition() {
        let journal = MemoryJournal::new(8);
        let producer = journal.producer();
        for i in 0..4u8 {
            producer
                .send("_|g1|a1", vec![i], Some(vec![i]))
                .await
                .unwrap();
        }

        let mut consumer = journal.subscribe();
        let records = drain_all(&mut consumer).await;
        let partition = records[0].partition;
        assert!(records.iter().all(|r| r.partition == partition));
        // And ordered within it.
        let offsets: Vec<u64> = records.iter().map(|r| r.offset).collect();
        assert_eq!(offsets, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn tombstones_pass_through_with_no_value() {
        let journal = MemoryJournal::new(1);
        journal
            .producer()
            .send("k", b"key".to_vec(), None)
            .await
            .unwrap();

        let mut consumer = journal.subscribe();
        let records = drain_all(&mut consumer).await;
        assert_eq!(records.len(), 1);
        assert!(records[0].value.is_none());
    }

    #[tokio::test]
    async fn poll_wakes_on_append() {
        let journal = MemoryJournal::new(1);
        let producer = journal.producer();
        let mut consumer = journal.subscribe();

        let waiter = tokio::spawn(async move {
            consumer.poll(Duration::from_secs(5)).await.unwrap()
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        producer.send("k", b"key".to_vec(), Some(b"v".to_vec())).await.unwrap();

        let batch = waiter.await.unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[tokio::test]
    async fn poll_times_out_empty() {
        let journal = MemoryJournal::new(1);
        let mut consumer = journal.subscribe();
        let batch = consumer.poll(Duration::from_millis(10)).await.unwrap();
        assert!(batch.is_empty());
    }
}
