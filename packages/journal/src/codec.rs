use chrono::{DateTime, Utc};
use common::{Mutation, PartitionScope, TenantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::JournalError;

/// Key message type of the bootstrap sentinel.
pub const BOOTSTRAP_TYPE: &str = "Bootstrap";

/// Current envelope version. Decoding rejects anything newer.
pub const ENVELOPE_VERSION: u8 = 1;

/// Typed journal record key: message type tag, tenant, correlation uuid and
/// the partition-routing key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageKey {
    pub message_type: String,
    pub tenant_id: String,
    pub uuid: Uuid,
    pub partition_key: String,
}

impl MessageKey {
    /// Key for a mutation. Artifact-scoped messages share a partition per
    /// `(tenant, group, artifact)`; tenant-wide messages share one.
    pub fn for_mutation(tenant: &TenantId, mutation: &Mutation, uuid: Uuid) -> Self {
        let partition_key = match mutation.partition_scope() {
            PartitionScope::Artifact {
                group_id,
                artifact_id,
            } => format!("{tenant}|{group_id}|{artifact_id}"),
            PartitionScope::Global => format!("{tenant}|__global"),
        };
        Self {
            message_type: mutation.message_type().to_string(),
            tenant_id: tenant.as_str().to_string(),
            uuid,
            partition_key,
        }
    }

    /// The bootstrap sentinel key. Carries only the node's bootstrap uuid and
    /// has no payload.
    pub fn bootstrap(tenant: &TenantId, bootstrap_id: Uuid) -> Self {
        Self {
            message_type: BOOTSTRAP_TYPE.to_string(),
            tenant_id: tenant.as_str().to_string(),
            uuid: bootstrap_id,
            partition_key: format!("{tenant}|__global"),
        }
    }

    pub fn is_bootstrap(&self) -> bool {
        self.message_type == BOOTSTRAP_TYPE
    }

    pub fn encode(&self) -> Result<Vec<u8>, JournalError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, JournalError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Versioned value envelope. A record with a `None` value (no envelope at
/// all) is a tombstone and is never decoded.
///
/// `ts` is stamped by the submitter and used as the apply-time clock on every
/// node, so replicated rows carry identical timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub v: u8,
    pub ts: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl Envelope {
    pub fn from_mutation(mutation: &Mutation, ts: DateTime<Utc>) -> Result<Self, JournalError> {
        Ok(Self {
            v: ENVELOPE_VERSION,
            ts,
            payload: serde_json::to_value(mutation)?,
        })
    }

    pub fn into_mutation(self) -> Result<Mutation, JournalError> {
        if self.v > ENVELOPE_VERSION {
            return Err(JournalError::UnsupportedVersion {
                found: self.v,
                supported: ENVELOPE_VERSION,
            });
        }
        Ok(serde_json::from_value(self.payload)?)
    }

    pub fn encode(&self) -> Result<Vec<u8>, JournalError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, JournalError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Stable partition routing: FNV-1a over the partition key. Must agree across
/// nodes, so no process-seeded hasher.
pub fn partition_for(partition_key: &str, partitions: u32) -> u32 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    let mut hash = FNV_OFFSET;
    for byte in partition_key.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    (hash % u64::from(partitions.max(1))) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_round_trip() {
        let tenant = TenantId::default();
        let uuid = Uuid::new_v4();
        let key = MessageKey::for_mutation(
            &tenant,
            &Mutation::DeleteArtifact {
                group_id: "g1".into(),
                artifact_id: "a1".into(),
            },
            uuid,
        );
        let decoded = MessageKey::decode(&key.encode().unwrap()).unwrap();
        assert_eq!(decoded, key);
        assert_eq!(decoded.message_type, "DeleteArtifact");
        assert_eq!(decoded.partition_key, "_|g1|a1");
        assert!(!decoded.is_bootstrap());
    }

    #[test]
    fn bootstrap_key_has_sentinel_type() {
        let key = MessageKey::bootstrap(&TenantId::default(), Uuid::new_v4());
        assert!(key.is_bootstrap());
        assert_eq!(key.partition_key, "_|__global");
    }

    #[test]
    fn envelope_round_trip() {
        let mutation = Mutation::DeleteGlobalRules;
        let envelope = Envelope::from_mutation(&mutation, Utc::now()).unwrap();
        let bytes = envelope.encode().unwrap();
        let decoded = Envelope::decode(&bytes).unwrap().into_mutation().unwrap();
        assert_eq!(decoded, mutation);
    }

    #[test]
    fn envelope_rejects_newer_version() {
        let envelope = Envelope {
            v: ENVELOPE_VERSION + 1,
            ts: Utc::now(),
            payload: serde_json::json!({"op": "delete_global_rules"}),
        };
        assert!(matches!(
            envelope.into_mutation(),
            Err(JournalError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn partitioning_is_stable_and_in_range() {
        let p1 = partition_for("_|g1|a1", 8);
        let p2 = partition_for("_|g1|a1", 8);
        assert_eq!(p1, p2);
        assert!(p1 < 8);
        // Single-partition topics always route to 0.
        assert_eq!(partition_for("anything", 1), 0);
    }
}
