use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::TenantId;
use journal::{Journal, MessageKey};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{Sink, StorageEvent, Submitter};

/// The single per-node reader of the journal.
///
/// Records are handed to the sink task over a bounded channel: a slow apply
/// back-pressures the poll loop (consumer lag) instead of growing an
/// unbounded queue.
pub(crate) struct ConsumerLoop {
    pub journal: Arc<dyn Journal>,
    pub submitter: Arc<Submitter>,
    pub sink: Sink,
    pub tenant: TenantId,
    pub ready_tx: watch::Sender<bool>,
    pub events: broadcast::Sender<StorageEvent>,
    pub heartbeat: Arc<AtomicI64>,
    pub stopped: Arc<AtomicBool>,
    pub alive: Arc<AtomicBool>,
    pub poll_timeout: Duration,
    pub channel_capacity: usize,
}

impl ConsumerLoop {
    pub fn spawn(self) {
        let ConsumerLoop {
            journal,
            submitter,
            sink,
            tenant,
            ready_tx,
            events,
            heartbeat,
            stopped,
            alive,
            poll_timeout,
            channel_capacity,
        } = self;

        let (tx, mut rx) = mpsc::channel::<(MessageKey, Vec<u8>)>(channel_capacity);

        // Sink task: applies records strictly in hand-off order.
        {
            let stopped = stopped.clone();
            let alive = alive.clone();
            tokio::spawn(async move {
                while let Some((key, value)) = rx.recv().await {
                    if sink.apply(&key, &value).await.is_err() {
                        error!("Fatal apply error, stopping the consumer loop");
                        alive.store(false, Ordering::Release);
                        stopped.store(true, Ordering::Release);
                        break;
                    }
                }
            });
        }

        // Poll task: bootstrap sentinel first, then drain the journal.
        tokio::spawn(async move {
            let bootstrap_id = Uuid::new_v4();
            let bootstrap_start = Instant::now();
            if let Err(e) = submitter.submit_bootstrap(&tenant, bootstrap_id).await {
                error!(error = %e, "Failed to submit the bootstrap sentinel");
                alive.store(false, Ordering::Release);
                stopped.store(true, Ordering::Release);
                return;
            }
            info!(%bootstrap_id, "Subscribed to the journal, replaying");

            let mut consumer = journal.subscribe();
            while !stopped.load(Ordering::Acquire) {
                let records = match consumer.poll(poll_timeout).await {
                    Ok(records) => records,
                    Err(e) => {
                        error!(error = %e, "Journal consume error");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        continue;
                    }
                };
                heartbeat.store(chrono::Utc::now().timestamp_millis(), Ordering::Release);

                for record in records {
                    // Undecodable keys are logged and skipped; the journal
                    // may carry newer key shapes this node cannot read.
                    let key = match MessageKey::decode(&record.key) {
                        Ok(key) => key,
                        Err(e) => {
                            warn!(
                                partition = record.partition,
                                offset = record.offset,
                                error = %e,
                                "Discarding a journal record with an unreadable key"
                            );
                            continue;
                        }
                    };

                    if key.is_bootstrap() {
                        if key.uuid == bootstrap_id && !*ready_tx.borrow() {
                            let _ = ready_tx.send(true);
                            let _ = events.send(StorageEvent::Ready);
                            info!(
                                elapsed_ms = bootstrap_start.elapsed().as_millis() as u64,
                                "Journal replay complete, node is ready"
                            );
                        }
                        continue;
                    }

                    let Some(value) = record.value else {
                        info!(message_type = %key.message_type, "Discarding a tombstone record");
                        continue;
                    };

                    // Blocking enqueue: consumer lag is preferred to OOM.
                    if tx.send((key, value)).await.is_err() {
                        // Sink is gone (fatal apply); stop polling.
                        return;
                    }
                }
            }
        });
    }
}
