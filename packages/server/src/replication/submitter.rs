use std::sync::Arc;

use common::clock::Clock;
use common::{CoreError, Mutation, TenantId};
use journal::{Envelope, JournalProducer, MessageKey};
use tracing::debug;
use uuid::Uuid;

use super::Coordinator;

/// Serializes mutations onto the journal topic. The coordinator slot is
/// registered before the record is produced, so the sink can never complete
/// a uuid the submitter has not seen.
pub(crate) struct Submitter {
    producer: Arc<dyn JournalProducer>,
    coordinator: Arc<Coordinator>,
    clock: Arc<dyn Clock>,
}

impl Submitter {
    pub fn new(
        producer: Arc<dyn JournalProducer>,
        coordinator: Arc<Coordinator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            producer,
            coordinator,
            clock,
        }
    }

    pub async fn submit(&self, tenant: &TenantId, mutation: &Mutation) -> Result<Uuid, CoreError> {
        let uuid = Uuid::new_v4();
        let key = MessageKey::for_mutation(tenant, mutation, uuid);
        let key_bytes = key
            .encode()
            .map_err(|e| CoreError::fatal_caused("failed to encode journal key", e))?;
        let value_bytes = Envelope::from_mutation(mutation, self.clock.now())
            .and_then(|envelope| envelope.encode())
            .map_err(|e| CoreError::fatal_caused("failed to encode journal envelope", e))?;

        debug!(
            message_type = %key.message_type,
            %uuid,
            partition_key = %key.partition_key,
            "Submitting mutation to the journal"
        );

        self.coordinator.register(uuid);
        if let Err(e) = self
            .producer
            .send(&key.partition_key, key_bytes, Some(value_bytes))
            .await
        {
            self.coordinator.discard(&uuid);
            return Err(CoreError::unavailable(e));
        }
        Ok(uuid)
    }

    /// Produce the bootstrap sentinel: a key-only record whose observation
    /// marks the end of this node's replay.
    pub async fn submit_bootstrap(
        &self,
        tenant: &TenantId,
        bootstrap_id: Uuid,
    ) -> Result<(), CoreError> {
        let key = MessageKey::bootstrap(tenant, bootstrap_id);
        let key_bytes = key
            .encode()
            .map_err(|e| CoreError::fatal_caused("failed to encode bootstrap key", e))?;
        self.producer
            .send(&key.partition_key, key_bytes, None)
            .await
            .map_err(CoreError::unavailable)
    }
}
