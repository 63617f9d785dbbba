use chat_provider::ChatMessage;
use history_store::{ArchiveOutcome, FileNamer, HistoryStore, HistoryStoreError};
use time::OffsetDateTime;

/// Persistence operations the engine needs from its history backend.
pub trait TranscriptStore {
    fn load(&mut self) -> Result<Vec<ChatMessage>, HistoryStoreError>;
    fn save(&mut self, messages: &[ChatMessage]) -> Result<(), HistoryStoreError>;
    fn archive_and_reset(
        &mut self,
        namer: &FileNamer,
        now: OffsetDateTime,
    ) -> Result<ArchiveOutcome, HistoryStoreError>;
}

impl TranscriptStore for HistoryStore {
    fn load(&mut self) -> Result<Vec<ChatMessage>, HistoryStoreError> {
        HistoryStore::load(self)
    }

    fn save(&mut self, messages: &[ChatMessage]) -> Result<(), HistoryStoreError> {
        HistoryStore::save(self, messages)
    }

    fn archive_and_reset(
        &mut self,
        namer: &FileNamer,
        now: OffsetDateTime,
    ) -> Result<ArchiveOutcome, HistoryStoreError> {
        HistoryStore::archive_and_reset(self, namer, now)
    }
}
