use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{ActionValue, CoreError};
use parking_lot::Mutex;
use tokio::sync::Notify;
use uuid::Uuid;

/// What one applied mutation produced.
pub type ActionResult = Result<ActionValue, CoreError>;

const SHARD_COUNT: usize = 16;

/// Delivered results linger briefly so duplicate deliveries complete as
/// no-ops instead of repopulating the map.
const DELIVERED_GRACE: Duration = Duration::from_secs(10);

enum Slot {
    Pending(Arc<Notify>),
    Delivered(ActionResult, Instant),
}

/// Rendezvous between submitters and the sink: a sharded map from message
/// uuid to an awaitable result slot.
pub struct Coordinator {
    shards: Vec<Mutex<HashMap<Uuid, Slot>>>,
    shutdown: AtomicBool,
}

impl Coordinator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            shards: (0..SHARD_COUNT).map(|_| Mutex::new(HashMap::new())).collect(),
            shutdown: AtomicBool::new(false),
        })
    }

    fn shard(&self, uuid: &Uuid) -> &Mutex<HashMap<Uuid, Slot>> {
        &self.shards[uuid.as_bytes()[0] as usize % SHARD_COUNT]
    }

    /// Create an empty slot. Must happen before the message is produced so
    /// the completion can never race past the registration.
    pub fn register(&self, uuid: Uuid) {
        let mut shard = self.shard(&uuid).lock();
        shard
            .entry(uuid)
            .or_insert_with(|| Slot::Pending(Arc::new(Notify::new())));
    }

    /// Drop a slot, e.g. after a failed produce.
    pub fn discard(&self, uuid: &Uuid) {
        self.shard(uuid).lock().remove(uuid);
    }

    /// Block until the sink completes the slot or the timeout expires. On
    /// timeout the outcome of the mutation is unknown; the slot is removed so
    /// a late completion becomes a no-op.
    pub async fn wait_for_response(&self, uuid: Uuid, timeout: Duration) -> ActionResult {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.shutdown.load(Ordering::Acquire) {
                self.discard(&uuid);
                return Err(CoreError::Shutdown);
            }

            let notify = {
                let mut shard = self.shard(&uuid).lock();
                match shard.get(&uuid) {
                    Some(Slot::Pending(notify)) => notify.clone(),
                    Some(Slot::Delivered(..)) => match shard.remove(&uuid) {
                        Some(Slot::Delivered(result, _)) => return result,
                        _ => unreachable!("slot changed under the shard lock"),
                    },
                    None => return Err(CoreError::Timeout),
                }
            };

            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                self.discard(&uuid);
                return Err(CoreError::Timeout);
            }
            let _ = tokio::time::timeout(remaining, notify.notified()).await;
        }
    }

    /// Fulfil a slot and wake its waiter. Unknown uuids (messages that
    /// originated on another node, or whose waiter already timed out) are
    /// no-ops.
    pub fn complete(&self, uuid: Uuid, result: ActionResult) {
        let mut shard = self.shard(&uuid).lock();
        shard.retain(|_, slot| match slot {
            Slot::Delivered(_, at) => at.elapsed() < DELIVERED_GRACE,
            Slot::Pending(_) => true,
        });
        let notify = match shard.get(&uuid) {
            Some(Slot::Pending(notify)) => notify.clone(),
            // Duplicate delivery keeps the first result; unknown uuids
            // belong to other nodes or already-timed-out waiters.
            Some(Slot::Delivered(..)) | None => return,
        };
        shard.insert(uuid, Slot::Delivered(result, Instant::now()));
        notify.notify_one();
    }

    /// Fail every pending waiter; the node is going away.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        for shard in &self.shards {
            let shard = shard.lock();
            for slot in shard.values() {
                if let Slot::Pending(notify) = slot {
                    notify.notify_one();
                }
            }
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.shards.iter().map(|s| s.lock().len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::EntityKind;

    const SHORT: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn complete_then_wait_returns_value() {
        let coordinator = Coordinator::new();
        let uuid = Uuid::new_v4();
        coordinator.register(uuid);
        coordinator.complete(uuid, Ok(ActionValue::Id(42)));

        let result = coordinator.wait_for_response(uuid, SHORT).await;
        assert_eq!(result, Ok(ActionValue::Id(42)));
        // Slot is consumed by the waiter.
        assert_eq!(coordinator.len(), 0);
    }

    #[tokio::test]
    async fn wait_then_complete_wakes_the_waiter() {
        let coordinator = Coordinator::new();
        let uuid = Uuid::new_v4();
        coordinator.register(uuid);

        let waiter = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .wait_for_response(uuid, Duration::from_secs(5))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        coordinator.complete(uuid, Ok(ActionValue::Text("done".into())));

        assert_eq!(waiter.await.unwrap(), Ok(ActionValue::Text("done".into())));
    }

    #[tokio::test]
    async fn errors_propagate_to_the_waiter() {
        let coordinator = Coordinator::new();
        let uuid = Uuid::new_v4();
        coordinator.register(uuid);
        coordinator.complete(
            uuid,
            Err(CoreError::already_exists(EntityKind::Artifact, "g/a")),
        );

        let result = coordinator.wait_for_response(uuid, SHORT).await;
        assert_eq!(
            result,
            Err(CoreError::already_exists(EntityKind::Artifact, "g/a"))
        );
    }

    #[tokio::test]
    async fn wait_times_out_and_removes_the_slot() {
        let coordinator = Coordinator::new();
        let uuid = Uuid::new_v4();
        coordinator.register(uuid);

        let result = coordinator.wait_for_response(uuid, SHORT).await;
        assert_eq!(result, Err(CoreError::Timeout));
        assert_eq!(coordinator.len(), 0);

        // A late completion after the timeout is a no-op.
        coordinator.complete(uuid, Ok(ActionValue::None));
    }

    #[tokio::test]
    async fn completing_an_unknown_uuid_is_a_noop() {
        let coordinator = Coordinator::new();
        coordinator.complete(Uuid::new_v4(), Ok(ActionValue::None));
        assert_eq!(coordinator.len(), 0);
    }

    #[tokio::test]
    async fn shutdown_fails_pending_waiters() {
        let coordinator = Coordinator::new();
        let uuid = Uuid::new_v4();
        coordinator.register(uuid);

        let waiter = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .wait_for_response(uuid, Duration::from_secs(5))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        coordinator.shutdown();

        assert_eq!(waiter.await.unwrap(), Err(CoreError::Shutdown));
    }
}
