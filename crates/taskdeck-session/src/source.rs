//! Upstream data providers

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use taskdeck_core::{EntityKind, Workspace, WorkspaceId, WorkspaceSnapshot};

use crate::error::{Result, SessionError};

/// Produces the current entities of a workspace
#[async_trait]
pub trait WorkspaceSource: Send + Sync {
    async fn fetch(&self, workspace: &Workspace) -> Result<WorkspaceSnapshot>;
}

/// Serves the last snapshot pushed for each workspace
///
/// Lets a session rebuild its index from state that was pushed to it rather
/// than pulled.
#[derive(Debug, Default)]
pub struct CachedSource {
    snapshots: RwLock<HashMap<WorkspaceId, WorkspaceSnapshot>>,
}

impl CachedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, snapshot: WorkspaceSnapshot) {
        self.snapshots
            .write()
            .insert(snapshot.workspace.id.clone(), snapshot);
    }

    pub fn forget(&self, workspace_id: &WorkspaceId) -> bool {
        self.snapshots.write().remove(workspace_id).is_some()
    }

    /// Drop entities from a cached snapshot so a later rebuild agrees with
    /// incremental removals
    pub fn remove_entities(&self, workspace_id: &WorkspaceId, kind: EntityKind, ids: &[String]) {
        let mut snapshots = self.snapshots.write();
        let Some(snapshot) = snapshots.get_mut(workspace_id) else {
            return;
        };
        let removed = |id: &Option<String>| id.as_ref().is_some_and(|id| ids.contains(id));
        match kind {
            EntityKind::Task => snapshot.tasks.retain(|t| !removed(&t.id)),
            EntityKind::Page => snapshot.pages.retain(|p| !removed(&p.id)),
            EntityKind::Member => snapshot.members.retain(|m| !removed(&m.id)),
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.read().is_empty()
    }
}

#[async_trait]
impl WorkspaceSource for CachedSource {
    async fn fetch(&self, workspace: &Workspace) -> Result<WorkspaceSnapshot> {
        self.snapshots
            .read()
            .get(&workspace.id)
            .cloned()
            .ok_or_else(|| SessionError::Source(format!("No snapshot for workspace {}", workspace.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdeck_core::{Page, Task};

    fn snapshot() -> WorkspaceSnapshot {
        WorkspaceSnapshot::new(Workspace::with_id("ws", "Workspace"))
            .with_tasks(vec![Task::new("t1", "One"), Task::new("t2", "Two")])
            .with_pages(vec![Page::new("t1", "Same id, other kind")])
    }

    #[tokio::test]
    async fn test_fetch_returns_stored_snapshot() {
        let source = CachedSource::new();
        let workspace = Workspace::with_id("ws", "Workspace");
        assert!(matches!(
            source.fetch(&workspace).await,
            Err(SessionError::Source(_))
        ));

        source.store(snapshot());
        assert_eq!(source.fetch(&workspace).await.unwrap().entity_count(), 3);

        assert!(source.forget(&workspace.id));
        assert!(source.is_empty());
    }

    #[tokio::test]
    async fn test_remove_entities_only_touches_kind() {
        let source = CachedSource::new();
        source.store(snapshot());
        source.remove_entities(&"ws".into(), EntityKind::Task, &["t1".to_string()]);

        let fetched = source
            .fetch(&Workspace::with_id("ws", "Workspace"))
            .await
            .unwrap();
        assert_eq!(fetched.tasks.len(), 1);
        assert_eq!(fetched.pages.len(), 1);
    }
}
