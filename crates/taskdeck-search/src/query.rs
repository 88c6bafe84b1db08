//! Search query types and results

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskdeck_core::{EntityKind, WorkspaceId};

use crate::error::{Result, SearchError};
use crate::record::{IndexableRecord, RecordMetadata};

/// Default page size for a search
pub const DEFAULT_LIMIT: usize = 20;

/// Largest page size a single search may request
pub const MAX_LIMIT: usize = 500;

/// Search query
///
/// Unknown fields are rejected on deserialization so a misspelled option
/// fails loudly instead of being ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchQuery {
    /// The free-text query string
    pub query: String,

    /// Workspace and kind scoping
    pub filters: SearchFilters,

    /// Maximum number of results
    pub limit: usize,

    /// Number of sorted results to skip
    pub offset: usize,

    pub sort_by: SortBy,

    pub sort_order: SortOrder,

    /// Also match against (and return snippets of) the content field
    pub include_content: bool,

    /// Accept token-set matches in any word order
    pub fuzzy_search: bool,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            filters: SearchFilters::default(),
            limit: DEFAULT_LIMIT,
            offset: 0,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            include_content: true,
            fuzzy_search: true,
        }
    }
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_workspaces(mut self, workspace_ids: Vec<WorkspaceId>) -> Self {
        self.filters.workspace_ids = workspace_ids;
        self
    }

    pub fn with_kinds(mut self, kinds: Vec<EntityKind>) -> Self {
        self.filters.kinds = Some(kinds);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_sort(mut self, sort_by: SortBy, sort_order: SortOrder) -> Self {
        self.sort_by = sort_by;
        self.sort_order = sort_order;
        self
    }

    pub fn with_content(mut self, include_content: bool) -> Self {
        self.include_content = include_content;
        self
    }

    pub fn with_fuzzy(mut self, fuzzy_search: bool) -> Self {
        self.fuzzy_search = fuzzy_search;
        self
    }

    /// Whether the query text is empty or only whitespace
    pub fn is_blank(&self) -> bool {
        self.query.trim().is_empty()
    }

    /// Check the query's options before it is executed
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 || self.limit > MAX_LIMIT {
            return Err(SearchError::InvalidQuery(format!(
                "limit must be between 1 and {}, got {}",
                MAX_LIMIT, self.limit
            )));
        }
        if let Some(kinds) = &self.filters.kinds {
            if kinds.is_empty() {
                return Err(SearchError::InvalidQuery(
                    "kind filter must name at least one kind".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Scoping applied before matching
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchFilters {
    /// Workspaces to search (empty = every workspace in the index)
    pub workspace_ids: Vec<WorkspaceId>,

    /// Entity kinds to search (None = all kinds)
    pub kinds: Option<Vec<EntityKind>>,
}

impl SearchFilters {
    pub fn workspace(workspace_id: WorkspaceId) -> Self {
        Self {
            workspace_ids: vec![workspace_id],
            kinds: None,
        }
    }

    pub fn matches(&self, record: &IndexableRecord) -> bool {
        let workspace_ok =
            self.workspace_ids.is_empty() || self.workspace_ids.contains(&record.workspace_id);
        let kind_ok = self
            .kinds
            .as_ref()
            .map_or(true, |kinds| kinds.contains(&record.kind));
        workspace_ok && kind_ok
    }
}

/// Sort key for results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Relevance,
    UpdatedAt,
    Title,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Relevance => "relevance",
            SortBy::UpdatedAt => "updated_at",
            SortBy::Title => "title",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "relevance" => Ok(SortBy::Relevance),
            "updated_at" | "updatedAt" => Ok(SortBy::UpdatedAt),
            "title" => Ok(SortBy::Title),
            other => Err(SearchError::UnknownOption {
                option: "sort key",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(SearchError::UnknownOption {
                option: "sort order",
                value: other.to_string(),
            }),
        }
    }
}

/// A single search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub kind: EntityKind,
    pub workspace_id: WorkspaceId,
    pub workspace_name: String,
    pub title: String,

    /// Relevance score (non-negative, higher is better)
    pub score: f64,

    /// Excerpt of the content field, only when content was requested
    pub snippet: Option<String>,

    pub metadata: RecordMetadata,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Collection of search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    /// The page of results
    pub results: Vec<SearchResult>,

    /// Number of matches before pagination
    pub total: usize,
}

impl SearchResults {
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            total: 0,
        }
    }
}
