//! Search session controller
//!
//! A [`SearchSession`] owns the search index for one user session and keeps
//! it in step with the workspaces it knows about. It also carries the state
//! the search surface needs: whether the surface is open, the current
//! workspace scope and the recent search history.
//!
//! Index writes are ordered by submission, not completion: every write takes
//! a sequence number up front and is applied only if nothing newer has been
//! applied to that workspace since. Slow fetches that finish after a newer
//! write are discarded.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use taskdeck_core::{EntityKind, Workspace, WorkspaceId, WorkspaceSnapshot};
use taskdeck_search::{
    rank, snapshot_records, IndexStats, IndexStore, SearchQuery, SearchResult,
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::keyboard::{KeyEvent, KeyListener, KeyboardHub, ListenerGuard, ShortcutAction, ShortcutHandler};
use crate::recent::RecentSearches;
use crate::source::WorkspaceSource;
use crate::storage::KeyValueStore;

/// Indexing state of a registered workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum IndexStatus {
    Pending,
    Indexed { records: usize },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceInfo {
    pub workspace: Workspace,
    pub status: IndexStatus,
}

/// Ticket for one reindex of one workspace
#[derive(Debug, Clone)]
pub struct Submission {
    workspace_id: WorkspaceId,
    seq: u64,
    cancelled: Arc<AtomicBool>,
}

impl Submission {
    pub fn workspace_id(&self) -> &WorkspaceId {
        &self.workspace_id
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Void the submission; its completion will be discarded
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReindexOutcome {
    Applied { records: usize },

    /// A newer write won, the workspace went away, or the session shut down
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceFailure {
    pub workspace_id: WorkspaceId,
    pub message: String,
}

/// What a full rebuild did, workspace by workspace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReindexReport {
    pub indexed: Vec<WorkspaceId>,
    pub records: usize,
    pub discarded: Vec<WorkspaceId>,
    pub failures: Vec<WorkspaceFailure>,
}

impl ReindexReport {
    pub fn is_complete(&self) -> bool {
        self.discarded.is_empty() && self.failures.is_empty()
    }
}

/// Outcome of a search as shown to the user; never an `Err`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub total: usize,
    pub error: Option<String>,
}

impl SearchResponse {
    fn failed(message: String) -> Self {
        Self {
            error: Some(message),
            ..Self::default()
        }
    }
}

struct WorkspaceEntry {
    workspace: Workspace,

    /// Sequence number of the newest write applied (or voided) for this
    /// workspace; completions at or below it are stale
    floor: u64,
    status: IndexStatus,
}

/// Registered workspaces in registration order
#[derive(Default)]
struct Registry {
    entries: Vec<WorkspaceEntry>,
}

impl Registry {
    fn get(&self, id: &WorkspaceId) -> Option<&WorkspaceEntry> {
        self.entries.iter().find(|e| e.workspace.id == *id)
    }

    fn get_mut(&mut self, id: &WorkspaceId) -> Option<&mut WorkspaceEntry> {
        self.entries.iter_mut().find(|e| e.workspace.id == *id)
    }

    fn remove(&mut self, id: &WorkspaceId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.workspace.id != *id);
        self.entries.len() != before
    }
}

pub struct SearchSession {
    config: SessionConfig,
    source: Arc<dyn WorkspaceSource>,
    storage: Arc<dyn KeyValueStore>,

    index: RwLock<IndexStore>,
    registry: Mutex<Registry>,
    next_seq: AtomicU64,
    shut_down: AtomicBool,

    open: AtomicBool,
    scope: Mutex<Vec<WorkspaceId>>,
    shortcuts: Mutex<ShortcutHandler>,

    recent: Mutex<RecentSearches>,

    /// Orders writes of the recent list to storage
    persist_lock: tokio::sync::Mutex<()>,
}

impl SearchSession {
    /// Create a session, restoring recent searches from `storage`
    pub async fn new(
        config: SessionConfig,
        source: Arc<dyn WorkspaceSource>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Self {
        let recent = load_recent(storage.as_ref(), &config).await;
        info!("Search session started with {} recent searches", recent.len());

        Self {
            source,
            storage,
            index: RwLock::new(IndexStore::new()),
            registry: Mutex::new(Registry::default()),
            next_seq: AtomicU64::new(1),
            shut_down: AtomicBool::new(false),
            open: AtomicBool::new(false),
            scope: Mutex::new(Vec::new()),
            shortcuts: Mutex::new(ShortcutHandler::new()),
            recent: Mutex::new(recent),
            persist_lock: tokio::sync::Mutex::new(()),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // ===== Surface state =====

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Returns true if the surface was closed before
    pub fn open(&self) -> bool {
        let changed = !self.open.swap(true, Ordering::SeqCst);
        if changed {
            debug!("Search opened");
        }
        changed
    }

    /// Returns true if the surface was open before
    pub fn close(&self) -> bool {
        let changed = self.open.swap(false, Ordering::SeqCst);
        if changed {
            debug!("Search closed");
        }
        changed
    }

    /// Flip the surface state, returning the new state
    pub fn toggle(&self) -> bool {
        !self.open.fetch_xor(true, Ordering::SeqCst)
    }

    // ===== Recent searches =====

    pub fn recent_searches(&self) -> Vec<String> {
        self.recent.lock().entries().to_vec()
    }

    /// Remember a query; returns false (and persists nothing) for blank input
    pub async fn add_recent_search(&self, query: &str) -> Result<bool> {
        if !self.recent.lock().push(query) {
            return Ok(false);
        }
        self.persist_recent().await?;
        Ok(true)
    }

    pub async fn clear_recent_searches(&self) -> Result<()> {
        self.recent.lock().clear();
        self.persist_recent().await
    }

    async fn persist_recent(&self) -> Result<()> {
        let _guard = self.persist_lock.lock().await;
        // Serialize under the persist lock so the last write carries the latest list
        let json = serde_json::to_string(self.recent.lock().entries())?;
        self.storage.set(&self.config.recent_key, json).await
    }

    // ===== Workspaces and scope =====

    /// Register a workspace; returns false if it was already known
    ///
    /// Re-registering only refreshes the display name.
    pub fn register_workspace(&self, workspace: Workspace) -> bool {
        let mut registry = self.registry.lock();
        if let Some(entry) = registry.get_mut(&workspace.id) {
            entry.workspace.name = workspace.name;
            return false;
        }

        // Anything submitted before registration belongs to an earlier life
        // of this workspace id
        let floor = self.next_seq.load(Ordering::SeqCst).saturating_sub(1);
        info!("Registered workspace {} ({})", workspace.id, workspace.name);
        registry.entries.push(WorkspaceEntry {
            workspace,
            floor,
            status: IndexStatus::Pending,
        });
        true
    }

    pub fn workspaces(&self) -> Vec<WorkspaceInfo> {
        self.registry
            .lock()
            .entries
            .iter()
            .map(|entry| WorkspaceInfo {
                workspace: entry.workspace.clone(),
                status: entry.status.clone(),
            })
            .collect()
    }

    /// Restrict quick searches to these workspaces; empty means all
    pub fn set_scope(&self, workspace_ids: Vec<WorkspaceId>) {
        *self.scope.lock() = workspace_ids;
    }

    pub fn scope(&self) -> Vec<WorkspaceId> {
        self.scope.lock().clone()
    }

    // ===== Reindexing =====

    /// Take a ticket for reindexing a registered workspace
    pub fn begin_reindex(&self, workspace_id: &WorkspaceId) -> Result<Submission> {
        let registry = self.registry.lock();
        if registry.get(workspace_id).is_none() {
            return Err(SessionError::UnknownWorkspace(workspace_id.clone()));
        }
        Ok(Submission {
            workspace_id: workspace_id.clone(),
            seq: self.next_seq.fetch_add(1, Ordering::SeqCst),
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Apply a fetched snapshot if its submission is still current
    ///
    /// Returns the number of records indexed, or `None` if the completion
    /// was stale and discarded.
    pub async fn complete_reindex(
        &self,
        submission: &Submission,
        snapshot: WorkspaceSnapshot,
    ) -> Option<usize> {
        if snapshot.workspace.id != submission.workspace_id {
            warn!(
                "Snapshot of workspace {} delivered for workspace {}, discarding",
                snapshot.workspace.id, submission.workspace_id
            );
            return None;
        }
        let records = snapshot_records(&snapshot);
        let count = records.len();

        let mut index = self.index.write().await;
        {
            let mut registry = self.registry.lock();
            let entry = self.current_entry(&mut registry, submission)?;
            entry.floor = submission.seq;
            entry.status = IndexStatus::Indexed { records: count };
            entry.workspace.name = snapshot.workspace.name.clone();
        }
        index.replace_workspace(&submission.workspace_id, records);

        info!(
            "Indexed {} records for workspace {}",
            count, submission.workspace_id
        );
        Some(count)
    }

    /// Record a failed fetch; ignored if the submission is no longer current
    pub fn fail_reindex(&self, submission: &Submission, message: impl Into<String>) {
        let message = message.into();
        let mut registry = self.registry.lock();
        if let Some(entry) = self.current_entry(&mut registry, submission) {
            warn!(
                "Indexing workspace {} failed: {}",
                submission.workspace_id, message
            );
            entry.status = IndexStatus::Failed { message };
        }
    }

    fn current_entry<'a>(
        &self,
        registry: &'a mut Registry,
        submission: &Submission,
    ) -> Option<&'a mut WorkspaceEntry> {
        let reason = if self.shut_down.load(Ordering::SeqCst) {
            Some("session shut down")
        } else if submission.is_cancelled() {
            Some("cancelled")
        } else {
            match registry.get(&submission.workspace_id) {
                None => Some("workspace removed"),
                Some(entry) if submission.seq <= entry.floor => Some("superseded"),
                Some(_) => None,
            }
        };
        let Some(reason) = reason else {
            return registry.get_mut(&submission.workspace_id);
        };
        debug!(
            "Discarding submission {} for workspace {}: {}",
            submission.seq, submission.workspace_id, reason
        );
        None
    }

    /// Index a pushed snapshot, registering its workspace if needed
    ///
    /// Re-indexing an unchanged snapshot leaves the index unchanged.
    pub async fn index_snapshot(&self, snapshot: WorkspaceSnapshot) -> Result<ReindexOutcome> {
        self.register_workspace(snapshot.workspace.clone());
        let submission = self.begin_reindex(&snapshot.workspace.id)?;
        Ok(match self.complete_reindex(&submission, snapshot).await {
            Some(records) => ReindexOutcome::Applied { records },
            None => ReindexOutcome::Discarded,
        })
    }

    /// Fetch a registered workspace from the source and index it
    pub async fn reindex_workspace(&self, workspace_id: &WorkspaceId) -> Result<ReindexOutcome> {
        let workspace = self
            .registry
            .lock()
            .get(workspace_id)
            .map(|entry| entry.workspace.clone())
            .ok_or_else(|| SessionError::UnknownWorkspace(workspace_id.clone()))?;
        let submission = self.begin_reindex(workspace_id)?;

        match self.source.fetch(&workspace).await {
            Ok(snapshot) => Ok(match self.complete_reindex(&submission, snapshot).await {
                Some(records) => ReindexOutcome::Applied { records },
                None => ReindexOutcome::Discarded,
            }),
            Err(e) => {
                self.fail_reindex(&submission, e.to_string());
                Err(e)
            }
        }
    }

    /// Clear the index and rebuild it from the source, one workspace at a time
    ///
    /// A failing workspace is reported and skipped; the others still index.
    pub async fn reindex_all(&self) -> ReindexReport {
        self.clear_index().await;

        let workspace_ids: Vec<WorkspaceId> = self
            .registry
            .lock()
            .entries
            .iter()
            .map(|entry| entry.workspace.id.clone())
            .collect();
        info!("Reindexing {} workspaces", workspace_ids.len());

        let mut report = ReindexReport::default();
        for workspace_id in workspace_ids {
            match self.reindex_workspace(&workspace_id).await {
                Ok(ReindexOutcome::Applied { records }) => {
                    report.records += records;
                    report.indexed.push(workspace_id);
                }
                Ok(ReindexOutcome::Discarded) => report.discarded.push(workspace_id),
                // Removed while the rebuild was running
                Err(SessionError::UnknownWorkspace(_)) => report.discarded.push(workspace_id),
                Err(e) => report.failures.push(WorkspaceFailure {
                    workspace_id,
                    message: e.to_string(),
                }),
            }
        }

        info!(
            "Reindex finished: {} workspaces, {} records, {} failures",
            report.indexed.len(),
            report.records,
            report.failures.len()
        );
        report
    }

    // ===== Index mutation =====

    /// Remove entities of one workspace; ids indexed under another workspace
    /// are left alone
    ///
    /// Reindexes submitted before this call are voided so they cannot bring
    /// the removed entities back.
    pub async fn remove_entities(
        &self,
        workspace_id: &WorkspaceId,
        kind: EntityKind,
        ids: &[String],
    ) -> usize {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let mut index = self.index.write().await;
        if let Some(entry) = self.registry.lock().get_mut(workspace_id) {
            entry.floor = entry.floor.max(seq);
        }

        let owned: Vec<&String> = ids
            .iter()
            .filter(|id| {
                index
                    .get(kind, id)
                    .is_some_and(|record| record.workspace_id == *workspace_id)
            })
            .collect();
        let removed = index.remove_many(kind, owned);
        if let Some(entry) = self.registry.lock().get_mut(workspace_id) {
            if let IndexStatus::Indexed { records } = &mut entry.status {
                *records = records.saturating_sub(removed);
            }
        }
        removed
    }

    /// Forget a workspace and drop its records; pending reindexes are voided
    pub async fn remove_workspace(&self, workspace_id: &WorkspaceId) -> usize {
        let mut index = self.index.write().await;
        if self.registry.lock().remove(workspace_id) {
            info!("Removed workspace {}", workspace_id);
        }
        self.scope.lock().retain(|id| id != workspace_id);
        index.remove_workspace(workspace_id)
    }

    /// Drop every record; workspaces stay registered and go back to pending
    pub async fn clear_index(&self) {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let mut index = self.index.write().await;
        for entry in self.registry.lock().entries.iter_mut() {
            entry.floor = entry.floor.max(seq);
            entry.status = IndexStatus::Pending;
        }
        index.clear();
    }

    pub async fn stats(&self) -> IndexStats {
        self.index.read().await.stats()
    }

    // ===== Queries =====

    /// A query preset with the session's page size and scope
    pub fn new_query(&self, text: impl Into<String>) -> SearchQuery {
        SearchQuery::new(text)
            .with_workspaces(self.scope())
            .with_limit(self.config.default_limit)
    }

    /// Run a full search, remembering non-blank queries
    pub async fn search(&self, query: SearchQuery) -> SearchResponse {
        if self.config.record_recent {
            if let Err(e) = self.add_recent_search(&query.query).await {
                warn!("Failed to save recent search: {}", e);
            }
        }
        self.run(&query).await
    }

    /// Title-only autocomplete within the current scope
    pub async fn quick_search(&self, text: &str) -> SearchResponse {
        let query = SearchQuery::new(text)
            .with_workspaces(self.scope())
            .with_limit(self.config.quick_search_limit)
            .with_content(false)
            .with_fuzzy(true);
        self.run(&query).await
    }

    async fn run(&self, query: &SearchQuery) -> SearchResponse {
        if query.is_blank() {
            return SearchResponse::default();
        }
        if let Err(e) = query.validate() {
            debug!("Rejected query {:?}: {}", query.query, e);
            return SearchResponse::failed(e.to_string());
        }

        let candidates = self.index.read().await.snapshot(&query.filters);
        let ranked = rank(candidates, query);
        SearchResponse {
            results: ranked.results,
            total: ranked.total,
            error: None,
        }
    }

    // ===== Teardown and keys =====

    /// Void every pending completion; later completions are discarded
    pub fn shutdown(&self) {
        if !self.shut_down.swap(true, Ordering::SeqCst) {
            info!("Search session shut down");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Feed a key event through the shortcut handler and apply its action
    pub fn handle_key(&self, event: &KeyEvent) -> Option<ShortcutAction> {
        let action = self.shortcuts.lock().handle(event, self.is_open());
        match action {
            Some(ShortcutAction::Open) => {
                self.open();
            }
            Some(ShortcutAction::Close) => {
                self.close();
            }
            None => {}
        }
        action
    }

    /// Listen for shortcuts on `hub` until the returned guard is dropped
    pub fn attach_keyboard(self: &Arc<Self>, hub: &KeyboardHub) -> Result<ListenerGuard> {
        hub.attach(Arc::new(SessionKeys(Arc::downgrade(self))))
    }
}

struct SessionKeys(Weak<SearchSession>);

impl KeyListener for SessionKeys {
    fn on_key(&self, event: &KeyEvent) -> bool {
        self.0
            .upgrade()
            .is_some_and(|session| session.handle_key(event).is_some())
    }
}

async fn load_recent(storage: &dyn KeyValueStore, config: &SessionConfig) -> RecentSearches {
    let stored = match storage.get(&config.recent_key).await {
        Ok(Some(json)) => json,
        Ok(None) => return RecentSearches::new(config.recent_limit),
        Err(e) => {
            warn!("Failed to read recent searches: {}", e);
            return RecentSearches::new(config.recent_limit);
        }
    };
    match serde_json::from_str::<Vec<String>>(&stored) {
        Ok(entries) => RecentSearches::from_entries(entries, config.recent_limit),
        Err(e) => {
            warn!("Ignoring corrupt recent searches: {}", e);
            RecentSearches::new(config.recent_limit)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::Key;
    use crate::source::CachedSource;
    use crate::storage::MemoryKeyValueStore;
    use taskdeck_core::{Member, Page, Task};

    fn snapshot(id: &str, titles: &[&str]) -> WorkspaceSnapshot {
        let tasks = titles
            .iter()
            .enumerate()
            .map(|(i, title)| Task::new(format!("{}-t{}", id, i), *title))
            .collect();
        WorkspaceSnapshot::new(Workspace::with_id(id, format!("{} name", id))).with_tasks(tasks)
    }

    async fn session_with(
        source: Arc<CachedSource>,
        storage: Arc<MemoryKeyValueStore>,
    ) -> SearchSession {
        SearchSession::new(SessionConfig::default(), source, storage).await
    }

    async fn session() -> SearchSession {
        session_with(
            Arc::new(CachedSource::new()),
            Arc::new(MemoryKeyValueStore::new()),
        )
        .await
    }

    fn titles(response: &SearchResponse) -> Vec<&str> {
        response.results.iter().map(|r| r.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_open_close_toggle() {
        let session = session().await;
        assert!(!session.is_open());
        assert!(session.open());
        assert!(!session.open());
        assert!(session.close());
        assert!(!session.close());
        assert!(session.toggle());
        assert!(session.is_open());
        assert!(!session.toggle());
    }

    #[tokio::test]
    async fn test_recent_searches_persist() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let source = Arc::new(CachedSource::new());

        let session = session_with(source.clone(), storage.clone()).await;
        session.add_recent_search("alpha").await.unwrap();
        session.add_recent_search("beta").await.unwrap();
        assert!(!session.add_recent_search("  ").await.unwrap());
        assert_eq!(session.recent_searches(), vec!["beta", "alpha"]);

        let restored = session_with(source, storage.clone()).await;
        assert_eq!(restored.recent_searches(), vec!["beta", "alpha"]);

        restored.clear_recent_searches().await.unwrap();
        assert!(restored.recent_searches().is_empty());
        assert_eq!(
            storage.get("taskdeck.recent_searches").await.unwrap().as_deref(),
            Some("[]")
        );
    }

    #[tokio::test]
    async fn test_corrupt_recent_searches_start_empty() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        storage
            .set("taskdeck.recent_searches", "{not json".to_string())
            .await
            .unwrap();

        let session = session_with(Arc::new(CachedSource::new()), storage).await;
        assert!(session.recent_searches().is_empty());
    }

    #[tokio::test]
    async fn test_search_records_recent_and_finds_records() {
        let session = session().await;
        session
            .index_snapshot(snapshot("a", &["Deploy pipeline", "Write docs"]))
            .await
            .unwrap();

        let response = session.search(SearchQuery::new("pipeline")).await;
        assert_eq!(response.error, None);
        assert_eq!(titles(&response), vec!["Deploy pipeline"]);
        assert_eq!(session.recent_searches(), vec!["pipeline"]);

        let response = session.search(SearchQuery::new("   ")).await;
        assert!(response.results.is_empty());
        assert_eq!(session.recent_searches(), vec!["pipeline"]);
    }

    #[tokio::test]
    async fn test_search_errors_are_reported_not_raised() {
        let session = session().await;
        session
            .index_snapshot(snapshot("a", &["Deploy pipeline"]))
            .await
            .unwrap();

        let response = session
            .search(SearchQuery::new("pipeline").with_limit(0))
            .await;
        assert!(response.error.is_some());
        assert!(response.results.is_empty());
        assert_eq!(response.total, 0);

        let response = session.search(SearchQuery::new("").with_limit(0)).await;
        assert_eq!(response, SearchResponse::default());
    }

    #[tokio::test]
    async fn test_snapshot_json_with_bad_entities_still_indexes() {
        let session = session().await;
        let json = r#"{
            "workspace": { "id": "a", "name": "Acme" },
            "tasks": [
                { "id": "t1", "title": "Launch checklist" },
                { "id": "t2", "title": "Launch party", "status": "blocked" }
            ],
            "pages": [{ "id": "p1", "title": "Launch site", "url": "acme.test" }]
        }"#;
        let snap = WorkspaceSnapshot::from_json(json).unwrap();

        assert_eq!(
            session.index_snapshot(snap).await.unwrap(),
            ReindexOutcome::Applied { records: 1 }
        );
        let response = session.search(SearchQuery::new("launch")).await;
        assert_eq!(titles(&response), vec!["Launch checklist"]);
    }

    #[tokio::test]
    async fn test_index_snapshot_is_idempotent() {
        let session = session().await;
        let snap = snapshot("a", &["One", "Two"]);
        session.index_snapshot(snap.clone()).await.unwrap();
        let first = session.stats().await;
        session.index_snapshot(snap).await.unwrap();
        assert_eq!(session.stats().await, first);
        assert_eq!(first.total, 2);
    }

    #[tokio::test]
    async fn test_quick_search_uses_scope_and_limit() {
        let session = session().await;
        let many: Vec<String> = (0..12).map(|i| format!("Report {}", i)).collect();
        let many: Vec<&str> = many.iter().map(String::as_str).collect();
        session.index_snapshot(snapshot("a", &many)).await.unwrap();
        session
            .index_snapshot(snapshot("b", &["Report elsewhere"]))
            .await
            .unwrap();

        let response = session.quick_search("report").await;
        assert_eq!(response.total, 13);
        assert_eq!(response.results.len(), 8);

        session.set_scope(vec!["b".into()]);
        let response = session.quick_search("report").await;
        assert_eq!(titles(&response), vec!["Report elsewhere"]);
        assert!(response.results[0].snippet.is_none());
        assert!(session.recent_searches().is_empty());
    }

    #[tokio::test]
    async fn test_quick_search_ignores_content() {
        let session = session().await;
        let snap = WorkspaceSnapshot::new(Workspace::with_id("a", "A")).with_tasks(vec![
            Task::new("1", "Groceries").with_description("remember the budget"),
        ]);
        session.index_snapshot(snap).await.unwrap();

        assert_eq!(session.quick_search("budget").await.total, 0);
        assert_eq!(session.search(SearchQuery::new("budget")).await.total, 1);
    }

    #[tokio::test]
    async fn test_last_write_wins_by_submission() {
        let session = session().await;
        session.register_workspace(Workspace::with_id("a", "A"));

        let older = session.begin_reindex(&"a".into()).unwrap();
        let newer = session.begin_reindex(&"a".into()).unwrap();
        assert!(newer.seq() > older.seq());

        assert_eq!(
            session
                .complete_reindex(&newer, snapshot("a", &["Fresh"]))
                .await,
            Some(1)
        );
        assert_eq!(
            session
                .complete_reindex(&older, snapshot("a", &["Stale", "Stale too"]))
                .await,
            None
        );

        let response = session.quick_search("fresh").await;
        assert_eq!(response.total, 1);
        assert_eq!(session.stats().await.total, 1);
    }

    #[tokio::test]
    async fn test_cancelled_and_removed_completions_are_void() {
        let session = session().await;
        session.register_workspace(Workspace::with_id("a", "A"));

        let cancelled = session.begin_reindex(&"a".into()).unwrap();
        cancelled.cancel();
        assert!(cancelled.is_cancelled());
        assert_eq!(
            session
                .complete_reindex(&cancelled, snapshot("a", &["x"]))
                .await,
            None
        );

        let orphan = session.begin_reindex(&"a".into()).unwrap();
        session.remove_workspace(&"a".into()).await;
        assert_eq!(
            session.complete_reindex(&orphan, snapshot("a", &["x"])).await,
            None
        );

        // Re-registering must not revive a submission from before the removal
        session.register_workspace(Workspace::with_id("a", "A"));
        assert_eq!(
            session.complete_reindex(&orphan, snapshot("a", &["x"])).await,
            None
        );
        assert!(session.stats().await.total == 0);
    }

    #[tokio::test]
    async fn test_shutdown_voids_pending() {
        let session = session().await;
        session.register_workspace(Workspace::with_id("a", "A"));
        let pending = session.begin_reindex(&"a".into()).unwrap();
        session.shutdown();
        assert!(session.is_shut_down());
        assert_eq!(
            session.complete_reindex(&pending, snapshot("a", &["x"])).await,
            None
        );
        assert_eq!(
            session.index_snapshot(snapshot("a", &["y"])).await.unwrap(),
            ReindexOutcome::Discarded
        );
    }

    #[tokio::test]
    async fn test_remove_entities_beats_older_reindex() {
        let session = session().await;
        session
            .index_snapshot(snapshot("a", &["Keep", "Drop"]))
            .await
            .unwrap();

        let in_flight = session.begin_reindex(&"a".into()).unwrap();
        let removed = session
            .remove_entities(&"a".into(), EntityKind::Task, &["a-t1".to_string()])
            .await;
        assert_eq!(removed, 1);

        assert_eq!(
            session
                .complete_reindex(&in_flight, snapshot("a", &["Keep", "Drop"]))
                .await,
            None
        );
        assert_eq!(session.search(SearchQuery::new("drop")).await.total, 0);
    }

    #[tokio::test]
    async fn test_remove_entities_respects_workspace() {
        let session = session().await;
        session.index_snapshot(snapshot("a", &["Alpha"])).await.unwrap();

        let removed = session
            .remove_entities(&"b".into(), EntityKind::Task, &["a-t0".to_string()])
            .await;
        assert_eq!(removed, 0);
        assert_eq!(session.stats().await.total, 1);
    }

    #[tokio::test]
    async fn test_remove_workspace_drops_records_and_scope() {
        let session = session().await;
        session.index_snapshot(snapshot("a", &["Alpha"])).await.unwrap();
        session.index_snapshot(snapshot("b", &["Beta"])).await.unwrap();
        session.set_scope(vec!["a".into(), "b".into()]);

        assert_eq!(session.remove_workspace(&"a".into()).await, 1);
        assert_eq!(session.scope(), vec![WorkspaceId::from("b")]);
        assert_eq!(session.workspaces().len(), 1);
        assert_eq!(session.remove_workspace(&"a".into()).await, 0);
    }

    #[tokio::test]
    async fn test_reindex_all_continues_past_failures() {
        let source = Arc::new(CachedSource::new());
        let session = session_with(source.clone(), Arc::new(MemoryKeyValueStore::new())).await;

        session.register_workspace(Workspace::with_id("a", "A"));
        session.register_workspace(Workspace::with_id("broken", "Broken"));
        session.register_workspace(Workspace::with_id("c", "C"));
        source.store(snapshot("a", &["One", "Two"]));
        source.store(
            WorkspaceSnapshot::new(Workspace::with_id("c", "C"))
                .with_pages(vec![Page::new("p", "Handbook")])
                .with_members(vec![Member::new("m").with_display_name("Ada")]),
        );

        let report = session.reindex_all().await;
        assert_eq!(report.indexed, vec![WorkspaceId::from("a"), WorkspaceId::from("c")]);
        assert_eq!(report.records, 4);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].workspace_id, WorkspaceId::from("broken"));
        assert!(!report.is_complete());

        let statuses: Vec<IndexStatus> = session.workspaces().into_iter().map(|w| w.status).collect();
        assert_eq!(statuses[0], IndexStatus::Indexed { records: 2 });
        assert!(matches!(statuses[1], IndexStatus::Failed { .. }));
        assert_eq!(statuses[2], IndexStatus::Indexed { records: 2 });
        assert_eq!(session.stats().await.total, 4);
    }

    #[tokio::test]
    async fn test_reindex_unknown_workspace() {
        let session = session().await;
        assert!(matches!(
            session.reindex_workspace(&"nope".into()).await,
            Err(SessionError::UnknownWorkspace(_))
        ));
    }

    #[tokio::test]
    async fn test_clear_index_keeps_workspaces() {
        let session = session().await;
        session.index_snapshot(snapshot("a", &["Alpha"])).await.unwrap();
        session.clear_index().await;

        assert_eq!(session.stats().await.total, 0);
        assert_eq!(session.workspaces()[0].status, IndexStatus::Pending);
    }

    #[tokio::test]
    async fn test_keyboard_shortcuts_drive_surface() {
        let session = Arc::new(session().await);
        let hub = KeyboardHub::new();
        let guard = session.attach_keyboard(&hub).unwrap();

        assert!(hub.dispatch(&KeyEvent::press(Key::Char('k')).with_ctrl()));
        assert!(session.is_open());
        hub.dispatch(&KeyEvent::release(Key::Char('k')));

        assert!(hub.dispatch(&KeyEvent::press(Key::Escape)));
        assert!(!session.is_open());
        hub.dispatch(&KeyEvent::release(Key::Escape));

        assert!(!hub.dispatch(&KeyEvent::press(Key::Escape)));

        drop(guard);
        hub.dispatch(&KeyEvent::press(Key::Char('k')).with_meta());
        assert!(!session.is_open());
    }
}
