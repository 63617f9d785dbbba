use chat_provider::{ChatMessage, ChatRole};
use serde::{Deserialize, Serialize};

pub const HISTORY_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryRecordType {
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRecordType {
    Message,
}

/// First line of every non-empty history file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryHeader {
    #[serde(rename = "type")]
    pub record_type: HistoryRecordType,
    pub version: u32,
    pub history_id: String,
    pub created_at: String,
}

impl HistoryHeader {
    #[must_use]
    pub fn v1(history_id: impl Into<String>, created_at: impl Into<String>) -> Self {
        Self {
            record_type: HistoryRecordType::History,
            version: HISTORY_VERSION,
            history_id: history_id.into(),
            created_at: created_at.into(),
        }
    }
}

/// One persisted transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageRecord {
    #[serde(rename = "type")]
    pub record_type: MessageRecordType,
    pub role: ChatRole,
    pub content: String,
}

impl From<&ChatMessage> for MessageRecord {
    fn from(message: &ChatMessage) -> Self {
        Self {
            record_type: MessageRecordType::Message,
            role: message.role,
            content: message.content.clone(),
        }
    }
}

impl From<MessageRecord> for ChatMessage {
    fn from(record: MessageRecord) -> Self {
        Self {
            role: record.role,
            content: record.content,
        }
    }
}

/// Record kind named by the `type` field of a history line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineKind {
    History,
    Message,
    Unknown,
}

impl LineKind {
    pub(crate) fn of(value: &serde_json::Value) -> Self {
        match value.get("type").and_then(serde_json::Value::as_str) {
            Some("history") => Self::History,
            Some("message") => Self::Message,
            _ => Self::Unknown,
        }
    }
}
