#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chat_provider::{ChatMessage, CompletionClient};
use history_store::{
    ArchiveOutcome, FileNamer, HistoryStoreError, DEFAULT_DATE_PATTERN,
};
use openai_cli::{ConversationEngine, EngineSettings, OptionSet, TranscriptStore};
use time::macros::datetime;
use time::OffsetDateTime;

pub const FIXED_STAMP: &str = "2026-03-0709:05:04";

pub fn fixed_now() -> OffsetDateTime {
    datetime!(2026-03-07 09:05:04 UTC)
}

#[derive(Default)]
pub struct StoreTrace {
    pub loads: usize,
    pub saves: Vec<Vec<ChatMessage>>,
    pub archives: Vec<OffsetDateTime>,
    pub fail_saves: bool,
}

/// In-memory store that records every call the engine makes.
pub struct SpyStore {
    state: Arc<Mutex<StoreTrace>>,
    initial: Vec<ChatMessage>,
}

impl SpyStore {
    pub fn new(initial: Vec<ChatMessage>) -> (Self, Arc<Mutex<StoreTrace>>) {
        let state = Arc::new(Mutex::new(StoreTrace::default()));
        (
            Self {
                state: Arc::clone(&state),
                initial,
            },
            state,
        )
    }
}

impl TranscriptStore for SpyStore {
    fn load(&mut self) -> Result<Vec<ChatMessage>, HistoryStoreError> {
        lock_unpoisoned(&self.state).loads += 1;
        Ok(self.initial.clone())
    }

    fn save(&mut self, messages: &[ChatMessage]) -> Result<(), HistoryStoreError> {
        let mut state = lock_unpoisoned(&self.state);
        if state.fail_saves {
            return Err(HistoryStoreError::io(
                "writing history file",
                "spy-history",
                std::io::Error::other("disk full"),
            ));
        }
        state.saves.push(messages.to_vec());
        Ok(())
    }

    fn archive_and_reset(
        &mut self,
        namer: &FileNamer,
        now: OffsetDateTime,
    ) -> Result<ArchiveOutcome, HistoryStoreError> {
        lock_unpoisoned(&self.state).archives.push(now);
        let name = namer.history_archive_name("spy-history", now)?;
        Ok(ArchiveOutcome::Archived(PathBuf::from(name)))
    }
}

pub fn settings(code_directory: &Path) -> EngineSettings {
    EngineSettings {
        model: "gpt-test".to_string(),
        max_tokens: 256,
        code_directory: code_directory.to_path_buf(),
    }
}

/// Engine over a spy store with a fixed clock and the default date pattern.
pub fn spy_engine(
    client: Arc<dyn CompletionClient>,
    options: OptionSet,
    code_directory: &Path,
    initial: Vec<ChatMessage>,
) -> (ConversationEngine, Arc<Mutex<StoreTrace>>) {
    let (store, trace) = SpyStore::new(initial);
    let namer = FileNamer::new(DEFAULT_DATE_PATTERN).expect("default pattern");
    let engine = ConversationEngine::with_store(
        settings(code_directory),
        options,
        namer,
        client,
        Box::new(store),
    )
    .expect("engine should build")
    .with_clock(fixed_now);

    (engine, trace)
}

pub fn files_in(dir: &Path) -> Vec<String> {
    let mut names = std::fs::read_dir(dir)
        .expect("directory should be readable")
        .map(|entry| {
            entry
                .expect("directory entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect::<Vec<_>>();
    names.sort();
    names
}

pub fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
