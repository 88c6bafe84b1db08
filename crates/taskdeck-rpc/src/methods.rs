//! RPC method definitions using jsonrpsee

use jsonrpsee::proc_macros::rpc;
use jsonrpsee::types::ErrorObjectOwned;
use taskdeck_search::SearchQuery;
use taskdeck_session::{ReindexReport, SearchResponse};

use crate::error::RpcError;
use crate::types::*;

/// Taskdeck search API
///
/// This defines all available RPC methods for the Taskdeck search server.
#[rpc(server, client, namespace = "taskdeck")]
pub trait TaskdeckApi {
    // ========================================================================
    // Queries
    // ========================================================================

    /// Full search; failures are reported in the response's `error` field
    #[method(name = "search")]
    async fn search(&self, query: SearchQuery) -> Result<SearchResponse, ErrorObjectOwned>;

    /// Title-only autocomplete within the session scope
    #[method(name = "quickSearch")]
    async fn quick_search(&self, request: QuickSearchRequest) -> Result<SearchResponse, ErrorObjectOwned>;

    /// Restrict quick searches to a set of workspaces
    #[method(name = "setScope")]
    async fn set_scope(&self, request: SetScopeRequest) -> Result<EmptyResponse, ErrorObjectOwned>;

    // ========================================================================
    // Indexing
    // ========================================================================

    /// Index (or re-index) a workspace snapshot
    #[method(name = "indexWorkspace")]
    async fn index_workspace(&self, request: IndexWorkspaceRequest) -> Result<IndexWorkspaceResponse, ErrorObjectOwned>;

    #[method(name = "removeEntities")]
    async fn remove_entities(&self, request: RemoveEntitiesRequest) -> Result<RemovedResponse, ErrorObjectOwned>;

    #[method(name = "removeWorkspace")]
    async fn remove_workspace(&self, request: RemoveWorkspaceRequest) -> Result<RemovedResponse, ErrorObjectOwned>;

    /// Clear the index and rebuild every known workspace
    #[method(name = "reindexAll")]
    async fn reindex_all(&self) -> Result<ReindexReport, ErrorObjectOwned>;

    #[method(name = "clearIndex")]
    async fn clear_index(&self) -> Result<EmptyResponse, ErrorObjectOwned>;

    #[method(name = "indexStats")]
    async fn index_stats(&self) -> Result<IndexStatsResponse, ErrorObjectOwned>;

    // ========================================================================
    // Recent searches
    // ========================================================================

    #[method(name = "recentSearches")]
    async fn recent_searches(&self) -> Result<RecentSearchesResponse, ErrorObjectOwned>;

    #[method(name = "clearRecentSearches")]
    async fn clear_recent_searches(&self) -> Result<EmptyResponse, ErrorObjectOwned>;

    // ========================================================================
    // Search surface
    // ========================================================================

    #[method(name = "openSearch")]
    async fn open_search(&self) -> Result<SearchStateResponse, ErrorObjectOwned>;

    #[method(name = "closeSearch")]
    async fn close_search(&self) -> Result<SearchStateResponse, ErrorObjectOwned>;

    #[method(name = "searchState")]
    async fn search_state(&self) -> Result<SearchStateResponse, ErrorObjectOwned>;
}

/// Helper function to convert any error to ErrorObjectOwned
pub fn to_rpc_error(e: impl Into<RpcError>) -> ErrorObjectOwned {
    e.into().into()
}
