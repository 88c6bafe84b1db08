//! Search index management

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use taskdeck_core::{EntityKind, WorkspaceId};
use tracing::{debug, warn};

use crate::query::SearchFilters;
use crate::record::{IndexableRecord, IndexedRecord, RecordKey};

/// In-memory index of every searchable entity, keyed by `(kind, id)`
///
/// The store is a single-writer structure: callers that share it across
/// tasks wrap it in a lock and apply each batch under one write guard.
/// Records are held behind `Arc` so a snapshot can outlive the guard it
/// was taken under.
#[derive(Debug, Default)]
pub struct IndexStore {
    records: BTreeMap<RecordKey, Arc<IndexedRecord>>,
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace each record by `(kind, id)`
    pub fn upsert_many(&mut self, records: impl IntoIterator<Item = IndexableRecord>) {
        let mut count = 0usize;
        for record in records {
            let key = record.key();
            if let Some(previous) = self.records.get(&key) {
                if previous.record.workspace_id != record.workspace_id {
                    debug!(
                        "Moving {} {} from workspace {} to {}",
                        key.kind, key.id, previous.record.workspace_id, record.workspace_id
                    );
                }
            }
            // Replacing the whole entry keeps a moved record from ever being
            // visible under both workspaces.
            self.records.insert(key, Arc::new(IndexedRecord::new(record)));
            count += 1;
        }
        if count > 0 {
            debug!("Upserted {} records ({} total)", count, self.records.len());
        }
    }

    /// Remove records of `kind` with the given ids; unknown ids are ignored
    pub fn remove_many<I, S>(&mut self, kind: EntityKind, ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let removed = ids
            .into_iter()
            .filter(|id| self.records.remove(&RecordKey::new(kind, id.as_ref())).is_some())
            .count();
        debug!("Removed {} {} records", removed, kind);
        removed
    }

    /// Remove every record belonging to a workspace
    pub fn remove_workspace(&mut self, workspace_id: &WorkspaceId) -> usize {
        let before = self.records.len();
        self.records
            .retain(|_, entry| entry.record.workspace_id != *workspace_id);
        let removed = before - self.records.len();
        debug!("Removed {} records of workspace {}", removed, workspace_id);
        removed
    }

    /// Swap a workspace's records for a freshly adapted batch
    ///
    /// Entities missing from the batch disappear from the index. Records in
    /// the batch that belong to another workspace are skipped.
    pub fn replace_workspace(
        &mut self,
        workspace_id: &WorkspaceId,
        records: impl IntoIterator<Item = IndexableRecord>,
    ) {
        self.remove_workspace(workspace_id);
        let records = records.into_iter().filter(|record| {
            let owned = record.workspace_id == *workspace_id;
            if !owned {
                warn!(
                    "Skipping {} {} of workspace {} while replacing workspace {}",
                    record.kind, record.id, record.workspace_id, workspace_id
                );
            }
            owned
        });
        self.upsert_many(records);
    }

    /// Remove every record
    pub fn clear(&mut self) {
        self.records.clear();
        debug!("Cleared search index");
    }

    /// Records matching the filter, ordered by `(kind, id)`
    pub fn snapshot(&self, filter: &SearchFilters) -> Vec<Arc<IndexedRecord>> {
        self.records
            .values()
            .filter(|entry| filter.matches(&entry.record))
            .cloned()
            .collect()
    }

    pub fn get(&self, kind: EntityKind, id: &str) -> Option<&IndexableRecord> {
        self.records
            .get(&RecordKey::new(kind, id))
            .map(|entry| &entry.record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record counts per kind and per workspace
    pub fn stats(&self) -> IndexStats {
        let mut stats = IndexStats {
            total: self.records.len(),
            ..IndexStats::default()
        };
        for entry in self.records.values() {
            *stats.by_kind.entry(entry.record.kind).or_default() += 1;
            *stats
                .by_workspace
                .entry(entry.record.workspace_id.clone())
                .or_default() += 1;
        }
        stats
    }
}

/// Summary of what the index currently holds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub total: usize,
    pub by_kind: BTreeMap<EntityKind, usize>,
    pub by_workspace: BTreeMap<WorkspaceId, usize>,
}
