pub mod codec;
pub mod config;
pub mod error;
#[cfg(feature = "kafka")]
pub mod kafka;
pub mod memory;
pub mod traits;

pub use codec::{Envelope, MessageKey, BOOTSTRAP_TYPE, ENVELOPE_VERSION};
pub use config::JournalConfig;
pub use error::JournalError;
pub use memory::MemoryJournal;
pub use traits::{Journal, JournalConsumer, JournalProducer, JournalRecord};
