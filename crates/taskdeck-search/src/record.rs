//! Indexable records - the unit stored in the index

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskdeck_core::{EntityKind, MemberRole, TaskPriority, TaskStatus, WorkspaceId};
use url::Url;

use crate::normalize::NormalizedText;

/// Key of a record in the index: ids are only unique within a kind
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub kind: EntityKind,
    pub id: String,
}

impl RecordKey {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

/// A task, page or member reduced to the fields the search engine understands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexableRecord {
    pub id: String,
    pub kind: EntityKind,
    pub workspace_id: WorkspaceId,

    /// Display label of the workspace, kept alongside the id
    pub workspace_name: String,

    /// Primary searchable text
    pub title: String,

    /// Secondary searchable text, possibly empty
    pub content: String,

    /// Carried through to results, never matched against
    pub metadata: RecordMetadata,

    /// Only used to break ranking ties
    pub updated_at: Option<DateTime<Utc>>,
}

impl IndexableRecord {
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.kind, self.id.clone())
    }
}

/// Kind-specific attributes of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordMetadata {
    Task {
        status: TaskStatus,
        priority: TaskPriority,
        assignee: Option<String>,
        page_id: Option<String>,
    },
    Page {
        category: Option<String>,
        color: Option<String>,
        url: Option<Url>,
    },
    Member {
        role: MemberRole,
        email: Option<String>,
        avatar_url: Option<String>,
    },
}

/// A record together with its pre-normalized searchable fields
///
/// Normalization happens once at index time so queries only compare strings.
#[derive(Debug, Clone)]
pub struct IndexedRecord {
    pub record: IndexableRecord,
    pub(crate) title: NormalizedText,
    pub(crate) content: NormalizedText,
}

impl IndexedRecord {
    pub fn new(record: IndexableRecord) -> Self {
        let title = NormalizedText::new(&record.title);
        let content = NormalizedText::new(&record.content);
        Self {
            record,
            title,
            content,
        }
    }

    pub fn normalized_title(&self) -> &NormalizedText {
        &self.title
    }

    pub fn normalized_content(&self) -> &NormalizedText {
        &self.content
    }
}
