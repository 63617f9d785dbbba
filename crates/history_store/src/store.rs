use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chat_provider::ChatMessage;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::HistoryStoreError;
use crate::naming::FileNamer;
use crate::schema::{HistoryHeader, LineKind, MessageRecord, HISTORY_VERSION};

/// Result of [`HistoryStore::archive_and_reset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveOutcome {
    /// The active file was renamed aside to this path.
    Archived(PathBuf),
    /// The rename failed; the old content stays in place until the next save.
    RenameFailed,
    /// There was no active file to archive.
    NothingToArchive,
}

impl ArchiveOutcome {
    #[must_use]
    pub fn archived_path(&self) -> Option<&Path> {
        match self {
            Self::Archived(path) => Some(path),
            Self::RenameFailed | Self::NothingToArchive => None,
        }
    }
}

/// Handle to the persisted history file.
///
/// The file is opened per operation and closed before the operation returns.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    header: HistoryHeader,
}

impl HistoryStore {
    /// Creates the history file if it is missing and returns a handle to it.
    pub fn ensure_exists(path: &Path) -> Result<Self, HistoryStoreError> {
        let path = path.to_path_buf();

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| {
                HistoryStoreError::io("creating history directory", parent, source)
            })?;
        }

        let existed = path.exists();
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| HistoryStoreError::io("creating history file", &path, source))?;

        if existed {
            tracing::debug!(path = %path.display(), "using existing history file");
        } else {
            tracing::info!(path = %path.display(), "created empty history file");
        }

        Ok(Self {
            header: fresh_header()?,
            path,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn header(&self) -> &HistoryHeader {
        &self.header
    }

    /// Reads every persisted message in order.
    ///
    /// An empty file is an empty transcript. The header of a non-empty file is
    /// adopted so that the next [`save`](Self::save) keeps the same identity.
    pub fn load(&mut self) -> Result<Vec<ChatMessage>, HistoryStoreError> {
        let path = self.path.clone();
        let read_file = File::open(&path)
            .map_err(|source| HistoryStoreError::io("opening history file", &path, source))?;
        let reader = BufReader::new(read_file);

        let mut header: Option<HistoryHeader> = None;
        let mut messages = Vec::new();

        for (line_index, line_result) in reader.lines().enumerate() {
            let line_number = line_index + 1;
            let line = line_result
                .map_err(|source| HistoryStoreError::io_line(&path, line_number, source))?;
            let value = parse_json_line(&path, line_number, &line)?;
            let kind = LineKind::of(&value);

            if line_number == 1 {
                if kind != LineKind::History {
                    return Err(HistoryStoreError::InvalidHeaderRecord {
                        path,
                        line: line_number,
                    });
                }

                let parsed = decode::<HistoryHeader>(&path, line_number, value)?;
                validate_header_line(&path, line_number, &parsed)?;
                header = Some(parsed);
                continue;
            }

            if kind != LineKind::Message {
                return Err(HistoryStoreError::InvalidMessageRecord {
                    path,
                    line: line_number,
                });
            }

            let record = decode::<MessageRecord>(&path, line_number, value)?;
            messages.push(ChatMessage::from(record));
        }

        if let Some(header) = header {
            self.header = header;
        }

        tracing::debug!(
            path = %self.path.display(),
            messages = messages.len(),
            "loaded history"
        );

        Ok(messages)
    }

    /// Replaces the file content with the header and one record per message.
    pub fn save(&self, messages: &[ChatMessage]) -> Result<(), HistoryStoreError> {
        let file = File::create(&self.path)
            .map_err(|source| HistoryStoreError::io("truncating history file", &self.path, source))?;
        let mut writer = BufWriter::new(file);

        write_json_line(&self.path, &mut writer, &self.header)?;
        for message in messages {
            write_json_line(&self.path, &mut writer, &MessageRecord::from(message))?;
        }

        writer
            .flush()
            .map_err(|source| HistoryStoreError::io("flushing history file", &self.path, source))?;

        tracing::debug!(
            path = %self.path.display(),
            messages = messages.len(),
            "saved history"
        );

        Ok(())
    }

    /// Renames the active file aside and starts a fresh one in its place.
    ///
    /// A failed rename is logged and reported through the outcome; it never
    /// fails the call. Only the follow-up [`ensure_exists`](Self::ensure_exists)
    /// can return an error.
    pub fn archive_and_reset(
        &mut self,
        namer: &FileNamer,
        now: OffsetDateTime,
    ) -> Result<ArchiveOutcome, HistoryStoreError> {
        let outcome = if self.path.exists() {
            self.rename_aside(namer, now)
        } else {
            ArchiveOutcome::NothingToArchive
        };

        *self = Self::ensure_exists(&self.path)?;
        Ok(outcome)
    }

    fn rename_aside(&self, namer: &FileNamer, now: OffsetDateTime) -> ArchiveOutcome {
        let base_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let archive_name = match namer.history_archive_name(&base_name, now) {
            Ok(name) => name,
            Err(error) => {
                tracing::warn!(path = %self.path.display(), %error, "could not name history archive");
                return ArchiveOutcome::RenameFailed;
            }
        };
        let target = self.path.with_file_name(archive_name);

        match fs::rename(&self.path, &target) {
            Ok(()) => {
                tracing::info!(
                    from = %self.path.display(),
                    to = %target.display(),
                    "archived history file"
                );
                ArchiveOutcome::Archived(target)
            }
            Err(error) => {
                tracing::warn!(
                    from = %self.path.display(),
                    to = %target.display(),
                    %error,
                    "failed to archive history file"
                );
                ArchiveOutcome::RenameFailed
            }
        }
    }
}

fn fresh_header() -> Result<HistoryHeader, HistoryStoreError> {
    let created_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(HistoryStoreError::ClockFormat)?;
    Ok(HistoryHeader::v1(uuid::Uuid::new_v4().to_string(), created_at))
}

pub(crate) fn parse_json_line(
    path: &Path,
    line_number: usize,
    line: &str,
) -> Result<Value, HistoryStoreError> {
    serde_json::from_str::<Value>(line)
        .map_err(|source| HistoryStoreError::json_line(path, line_number, source))
}

fn decode<T: serde::de::DeserializeOwned>(
    path: &Path,
    line_number: usize,
    value: Value,
) -> Result<T, HistoryStoreError> {
    serde_json::from_value::<T>(value)
        .map_err(|source| HistoryStoreError::json_line(path, line_number, source))
}

pub(crate) fn validate_header_line(
    path: &Path,
    line_number: usize,
    header: &HistoryHeader,
) -> Result<(), HistoryStoreError> {
    if header.version != HISTORY_VERSION {
        return Err(HistoryStoreError::UnsupportedVersion {
            path: path.to_path_buf(),
            line: line_number,
            found: header.version,
        });
    }

    if OffsetDateTime::parse(&header.created_at, &Rfc3339).is_err() {
        return Err(HistoryStoreError::InvalidTimestamp {
            path: path.to_path_buf(),
            line: line_number,
            field: "created_at",
            value: header.created_at.clone(),
        });
    }

    Ok(())
}

fn write_json_line<T: serde::Serialize>(
    path: &Path,
    writer: &mut impl Write,
    record: &T,
) -> Result<(), HistoryStoreError> {
    serde_json::to_writer(&mut *writer, record)
        .map_err(|source| HistoryStoreError::json_serialize(path, source))?;
    writer
        .write_all(b"\n")
        .map_err(|source| HistoryStoreError::io("writing history file", path, source))
}
