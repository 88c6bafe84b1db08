//! RPC client implementation

use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use taskdeck_core::{EntityKind, WorkspaceId, WorkspaceSnapshot};
use taskdeck_rpc::{
    IndexStatsResponse, IndexWorkspaceRequest, QuickSearchRequest, RemoveEntitiesRequest,
    RemoveWorkspaceRequest, SearchStateResponse, SetScopeRequest, TaskdeckApiClient,
};
use taskdeck_search::SearchQuery;
use taskdeck_session::{ReindexOutcome, ReindexReport, SearchResponse};
use tracing::debug;
use url::Url;

use crate::error::{ClientError, Result};

/// Client for connecting to a Taskdeck search server
pub struct TaskdeckClient {
    client: HttpClient,
    base_url: Url,
}

impl TaskdeckClient {
    /// Connect to a Taskdeck server
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        let base_url: Url = url
            .as_ref()
            .parse()
            .map_err(|e| ClientError::Connection(format!("Invalid URL: {}", e)))?;

        let client = HttpClientBuilder::default()
            .build(&base_url)
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        debug!("Connected to Taskdeck server at {}", base_url);

        Ok(Self { client, base_url })
    }

    /// Get the server URL
    pub fn url(&self) -> &Url {
        &self.base_url
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Run a full search
    ///
    /// A failure reported by the server in the response's `error` field is
    /// returned as [`ClientError::Search`].
    pub async fn search(&self, query: SearchQuery) -> Result<SearchResponse> {
        let response = self.client.search(query).await?;
        match response.error {
            Some(message) => Err(ClientError::Search(message)),
            None => Ok(response),
        }
    }

    pub async fn quick_search(&self, text: impl Into<String>) -> Result<SearchResponse> {
        let request = QuickSearchRequest { text: text.into() };
        let response = self.client.quick_search(request).await?;
        match response.error {
            Some(message) => Err(ClientError::Search(message)),
            None => Ok(response),
        }
    }

    pub async fn set_scope(&self, workspace_ids: Vec<WorkspaceId>) -> Result<()> {
        self.client
            .set_scope(SetScopeRequest { workspace_ids })
            .await?;
        Ok(())
    }

    // ========================================================================
    // Indexing
    // ========================================================================

    /// Index a workspace snapshot
    pub async fn index_workspace(&self, snapshot: WorkspaceSnapshot) -> Result<ReindexOutcome> {
        let response = self
            .client
            .index_workspace(IndexWorkspaceRequest { snapshot })
            .await?;
        Ok(response.outcome)
    }

    pub async fn remove_entities(
        &self,
        workspace_id: WorkspaceId,
        kind: EntityKind,
        ids: Vec<String>,
    ) -> Result<usize> {
        let request = RemoveEntitiesRequest {
            workspace_id,
            kind,
            ids,
        };
        Ok(self.client.remove_entities(request).await?.removed)
    }

    pub async fn remove_workspace(&self, workspace_id: WorkspaceId) -> Result<usize> {
        let request = RemoveWorkspaceRequest { workspace_id };
        Ok(self.client.remove_workspace(request).await?.removed)
    }

    pub async fn reindex_all(&self) -> Result<ReindexReport> {
        Ok(self.client.reindex_all().await?)
    }

    pub async fn clear_index(&self) -> Result<()> {
        self.client.clear_index().await?;
        Ok(())
    }

    pub async fn index_stats(&self) -> Result<IndexStatsResponse> {
        Ok(self.client.index_stats().await?)
    }

    // ========================================================================
    // Recent searches and surface state
    // ========================================================================

    pub async fn recent_searches(&self) -> Result<Vec<String>> {
        Ok(self.client.recent_searches().await?.searches)
    }

    pub async fn clear_recent_searches(&self) -> Result<()> {
        self.client.clear_recent_searches().await?;
        Ok(())
    }

    pub async fn open_search(&self) -> Result<SearchStateResponse> {
        Ok(self.client.open_search().await?)
    }

    pub async fn close_search(&self) -> Result<SearchStateResponse> {
        Ok(self.client.close_search().await?)
    }

    /// Whether the search surface is open
    pub async fn is_search_open(&self) -> Result<bool> {
        Ok(self.client.search_state().await?.open)
    }
}
