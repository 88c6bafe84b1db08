//! Common RPC types

use serde::{Deserialize, Serialize};
use taskdeck_core::{EntityKind, WorkspaceId, WorkspaceSnapshot};
use taskdeck_search::IndexStats;
use taskdeck_session::{ReindexOutcome, WorkspaceInfo};

// ============================================================================
// Queries
// ============================================================================

/// Request for autocomplete results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickSearchRequest {
    pub text: String,
}

/// Request to change the quick-search scope (empty = all workspaces)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetScopeRequest {
    pub workspace_ids: Vec<WorkspaceId>,
}

// ============================================================================
// Indexing
// ============================================================================

/// Request to index a workspace's current entities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexWorkspaceRequest {
    pub snapshot: WorkspaceSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexWorkspaceResponse {
    pub outcome: ReindexOutcome,
}

/// Request to drop entities of one kind from a workspace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveEntitiesRequest {
    pub workspace_id: WorkspaceId,
    pub kind: EntityKind,
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveWorkspaceRequest {
    pub workspace_id: WorkspaceId,
}

/// Number of records a removal dropped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovedResponse {
    pub removed: usize,
}

/// Index contents plus per-workspace indexing state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStatsResponse {
    pub stats: IndexStats,
    pub workspaces: Vec<WorkspaceInfo>,
}

// ============================================================================
// Recent searches and surface state
// ============================================================================

/// Most recent first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentSearchesResponse {
    pub searches: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchStateResponse {
    pub open: bool,

    /// Whether the call changed the state
    pub changed: bool,
}

// ============================================================================
// Common Response Types
// ============================================================================

/// Empty success response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmptyResponse {}
