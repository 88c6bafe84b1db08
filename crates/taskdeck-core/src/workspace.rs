//! Workspace types - the scope boundary for every indexed entity

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::{CoreError, Entity, Member, Page, Result, Task};

/// Unique identifier for a workspace
///
/// Identifiers come from the upstream backend as opaque strings, so this
/// wraps a `String` rather than a parsed UUID.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceId(pub String);

impl WorkspaceId {
    /// Create a new random WorkspaceId
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for WorkspaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkspaceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for WorkspaceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A workspace as seen by the search service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    /// Unique identifier
    pub id: WorkspaceId,

    /// Display name, denormalized onto every indexed record
    pub name: String,
}

impl Workspace {
    /// Create a workspace with a fresh identifier
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: WorkspaceId::new(),
            name: name.into(),
        }
    }

    /// Create a workspace with a known identifier
    pub fn with_id(id: impl Into<WorkspaceId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// The full entity collections of one workspace at a point in time
///
/// Upstream collaborators push these whenever tasks, pages or members of a
/// workspace change; the indexer rebuilds that workspace's records from it.
///
/// Entity arrays are parsed element by element. An element that does not
/// deserialize (unknown status, unparseable url, not an object) is logged
/// and dropped; the rest of the snapshot still loads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    pub workspace: Workspace,

    #[serde(default, deserialize_with = "skip_malformed")]
    pub tasks: Vec<Task>,

    #[serde(default, deserialize_with = "skip_malformed")]
    pub pages: Vec<Page>,

    #[serde(default, deserialize_with = "skip_malformed")]
    pub members: Vec<Member>,
}

fn skip_malformed<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Entity,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    let entities = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| {
            let id = value.get("id").and_then(Value::as_str).map(str::to_string);
            match serde_json::from_value::<T>(value) {
                Ok(entity) => Some(entity),
                Err(e) => {
                    warn!(
                        "Skipping malformed {} at index {} (id {:?}): {}",
                        T::KIND,
                        index,
                        id,
                        e
                    );
                    None
                }
            }
        })
        .collect();
    Ok(entities)
}

impl WorkspaceSnapshot {
    /// Create an empty snapshot for a workspace
    pub fn new(workspace: Workspace) -> Self {
        Self {
            workspace,
            tasks: Vec::new(),
            pages: Vec::new(),
            members: Vec::new(),
        }
    }

    pub fn with_tasks(mut self, tasks: Vec<Task>) -> Self {
        self.tasks = tasks;
        self
    }

    pub fn with_pages(mut self, pages: Vec<Page>) -> Self {
        self.pages = pages;
        self
    }

    pub fn with_members(mut self, members: Vec<Member>) -> Self {
        self.members = members;
        self
    }

    /// Parse a snapshot from its JSON form
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(json)?;
        if snapshot.workspace.id.as_str().trim().is_empty() {
            return Err(CoreError::InvalidSnapshot(
                "workspace id must not be empty".to_string(),
            ));
        }
        Ok(snapshot)
    }

    /// Total number of entities across all kinds
    pub fn entity_count(&self) -> usize {
        self.tasks.len() + self.pages.len() + self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_from_json() {
        let json = r#"{
            "workspace": { "id": "ws-1", "name": "Acme" },
            "tasks": [{ "id": "t1", "title": "Ship it" }],
            "members": [{ "id": "u1", "email": "ana@acme.test" }]
        }"#;

        let snapshot = WorkspaceSnapshot::from_json(json).unwrap();
        assert_eq!(snapshot.workspace.id, WorkspaceId::from("ws-1"));
        assert_eq!(snapshot.tasks.len(), 1);
        assert!(snapshot.pages.is_empty());
        assert_eq!(snapshot.entity_count(), 2);
    }

    #[test]
    fn test_snapshot_rejects_blank_workspace_id() {
        let json = r#"{ "workspace": { "id": "  ", "name": "Nowhere" } }"#;
        assert!(matches!(
            WorkspaceSnapshot::from_json(json),
            Err(CoreError::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn test_malformed_entities_are_skipped() {
        let json = r#"{
            "workspace": { "id": "ws-1", "name": "Acme" },
            "tasks": [
                { "id": "t1", "title": "Ship it" },
                { "id": "t2", "title": "Stuck", "status": "blocked" }
            ],
            "pages": [
                { "id": "p1", "title": "Site", "url": "acme.test" },
                { "id": "p2", "title": "Handbook" }
            ],
            "members": [42, { "id": "u1", "email": "ana@acme.test" }]
        }"#;

        let snapshot = WorkspaceSnapshot::from_json(json).unwrap();
        let task_ids: Vec<_> = snapshot.tasks.iter().map(|t| t.id.as_deref()).collect();
        let page_ids: Vec<_> = snapshot.pages.iter().map(|p| p.id.as_deref()).collect();
        assert_eq!(task_ids, vec![Some("t1")]);
        assert_eq!(page_ids, vec![Some("p2")]);
        assert_eq!(snapshot.members.len(), 1);
        assert_eq!(snapshot.entity_count(), 3);
    }

    #[test]
    fn test_null_entity_array_is_empty() {
        let json = r#"{ "workspace": { "id": "ws-1", "name": "Acme" }, "tasks": null }"#;
        let snapshot = WorkspaceSnapshot::from_json(json).unwrap();
        assert!(snapshot.tasks.is_empty());
    }

    #[test]
    fn test_workspace_ids_are_unique() {
        let a = Workspace::new("A");
        let b = Workspace::new("B");
        assert_ne!(a.id, b.id);
    }
}
