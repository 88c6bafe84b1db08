//! RPC method handlers

use std::sync::Arc;

use jsonrpsee::core::async_trait;
use jsonrpsee::types::ErrorObjectOwned;
use taskdeck_rpc::{
    to_rpc_error, EmptyResponse, IndexStatsResponse, IndexWorkspaceRequest,
    IndexWorkspaceResponse, QuickSearchRequest, RecentSearchesResponse, RemoveEntitiesRequest,
    RemoveWorkspaceRequest, RemovedResponse, SearchStateResponse, SetScopeRequest,
    TaskdeckApiServer,
};
use taskdeck_search::SearchQuery;
use taskdeck_session::{CachedSource, ReindexReport, SearchResponse, SearchSession};
use tracing::{debug, info};

/// RPC handler implementation
///
/// Pushed snapshots go to both the session and the cache it rebuilds from,
/// so `reindexAll` reproduces what was pushed.
pub struct RpcHandler {
    session: Arc<SearchSession>,
    source: Arc<CachedSource>,
}

impl RpcHandler {
    pub fn new(session: Arc<SearchSession>, source: Arc<CachedSource>) -> Self {
        Self { session, source }
    }

    fn surface_state(&self, changed: bool) -> SearchStateResponse {
        SearchStateResponse {
            open: self.session.is_open(),
            changed,
        }
    }
}

#[async_trait]
impl TaskdeckApiServer for RpcHandler {
    async fn search(&self, query: SearchQuery) -> Result<SearchResponse, ErrorObjectOwned> {
        debug!("Searching for '{}'", query.query);
        Ok(self.session.search(query).await)
    }

    async fn quick_search(
        &self,
        request: QuickSearchRequest,
    ) -> Result<SearchResponse, ErrorObjectOwned> {
        Ok(self.session.quick_search(&request.text).await)
    }

    async fn set_scope(&self, request: SetScopeRequest) -> Result<EmptyResponse, ErrorObjectOwned> {
        debug!("Setting search scope to {:?}", request.workspace_ids);
        self.session.set_scope(request.workspace_ids);
        Ok(EmptyResponse {})
    }

    async fn index_workspace(
        &self,
        request: IndexWorkspaceRequest,
    ) -> Result<IndexWorkspaceResponse, ErrorObjectOwned> {
        let snapshot = request.snapshot;
        info!(
            "Indexing workspace {} ({} entities)",
            snapshot.workspace.id,
            snapshot.entity_count()
        );

        self.source.store(snapshot.clone());
        let outcome = self
            .session
            .index_snapshot(snapshot)
            .await
            .map_err(to_rpc_error)?;

        Ok(IndexWorkspaceResponse { outcome })
    }

    async fn remove_entities(
        &self,
        request: RemoveEntitiesRequest,
    ) -> Result<RemovedResponse, ErrorObjectOwned> {
        debug!(
            "Removing {} {} entities from workspace {}",
            request.ids.len(),
            request.kind,
            request.workspace_id
        );

        self.source
            .remove_entities(&request.workspace_id, request.kind, &request.ids);
        let removed = self
            .session
            .remove_entities(&request.workspace_id, request.kind, &request.ids)
            .await;

        Ok(RemovedResponse { removed })
    }

    async fn remove_workspace(
        &self,
        request: RemoveWorkspaceRequest,
    ) -> Result<RemovedResponse, ErrorObjectOwned> {
        info!("Removing workspace {}", request.workspace_id);

        self.source.forget(&request.workspace_id);
        let removed = self.session.remove_workspace(&request.workspace_id).await;

        Ok(RemovedResponse { removed })
    }

    async fn reindex_all(&self) -> Result<ReindexReport, ErrorObjectOwned> {
        Ok(self.session.reindex_all().await)
    }

    async fn clear_index(&self) -> Result<EmptyResponse, ErrorObjectOwned> {
        info!("Clearing search index");
        self.session.clear_index().await;
        Ok(EmptyResponse {})
    }

    async fn index_stats(&self) -> Result<IndexStatsResponse, ErrorObjectOwned> {
        Ok(IndexStatsResponse {
            stats: self.session.stats().await,
            workspaces: self.session.workspaces(),
        })
    }

    async fn recent_searches(&self) -> Result<RecentSearchesResponse, ErrorObjectOwned> {
        Ok(RecentSearchesResponse {
            searches: self.session.recent_searches(),
        })
    }

    async fn clear_recent_searches(&self) -> Result<EmptyResponse, ErrorObjectOwned> {
        self.session
            .clear_recent_searches()
            .await
            .map_err(to_rpc_error)?;
        Ok(EmptyResponse {})
    }

    async fn open_search(&self) -> Result<SearchStateResponse, ErrorObjectOwned> {
        let changed = self.session.open();
        Ok(self.surface_state(changed))
    }

    async fn close_search(&self) -> Result<SearchStateResponse, ErrorObjectOwned> {
        let changed = self.session.close();
        Ok(self.surface_state(changed))
    }

    async fn search_state(&self) -> Result<SearchStateResponse, ErrorObjectOwned> {
        Ok(self.surface_state(false))
    }
}
