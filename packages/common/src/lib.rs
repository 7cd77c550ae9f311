pub mod clock;
pub mod content;
pub mod dto;
pub mod error;
pub mod message;
pub mod state;
pub mod types;

pub use content::ContentHash;
pub use error::{CoreError, EntityKind};
pub use message::{ActionValue, Mutation, PartitionScope};
pub use state::VersionState;
pub use types::{Labels, RuleType, TenantId};
