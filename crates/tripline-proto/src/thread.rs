//! Support-thread snapshot records from the message history collaborator.

use serde::Deserialize;
use serde_json::Value;

/// One per-user thread record as returned by `fetchSupportThreads`.
///
/// The history endpoint serves both generations of the schema, so every
/// field is optional here; [`ThreadRecord::ticket_key`] and
/// [`ThreadRecord::lines`] pick whichever generation is populated.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadRecord {
    /// Structured-schema thread key.
    #[serde(default)]
    pub ticket_id: Option<String>,
    /// Legacy-schema counterpart id, used as the thread key when no
    /// ticket id is present.
    #[serde(default)]
    pub sender: Option<String>,
    /// Legacy-schema receiver id.
    #[serde(default)]
    pub receiver: Option<String>,
    /// Structured-schema full line snapshot.
    #[serde(default, rename = "updatedContent")]
    pub updated_content: Option<Vec<String>>,
    /// Legacy-schema full line snapshot.
    #[serde(default)]
    pub content: Option<Vec<String>>,
    /// Legacy-schema creation stamp, kept opaque.
    #[serde(default)]
    pub created_at: Option<Value>,
}

impl ThreadRecord {
    /// Thread key for aggregation. `None` when the record carries neither
    /// a ticket id nor a sender; such records cannot be keyed and are
    /// skipped by aggregation.
    #[must_use]
    pub fn ticket_key(&self) -> Option<&str> {
        self.ticket_id.as_deref().or(self.sender.as_deref())
    }

    /// Full ordered line snapshot, whichever schema generation supplied it.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        self.updated_content.as_deref().or(self.content.as_deref()).unwrap_or(&[])
    }
}
