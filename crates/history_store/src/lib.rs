mod error;
mod naming;
mod schema;
mod store;

pub use error::HistoryStoreError;
pub use naming::{local_now, FileNamer, DEFAULT_DATE_PATTERN};
pub use schema::{HistoryHeader, HistoryRecordType, MessageRecord, MessageRecordType};
pub use store::{ArchiveOutcome, HistoryStore};
