//! Recent search history

use serde::{Deserialize, Serialize};

/// Capped, de-duplicated, most-recent-first list of query strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentSearches {
    entries: Vec<String>,
    limit: usize,
}

impl RecentSearches {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit,
        }
    }

    /// Rebuild a history from stored entries, enforcing the same rules as `push`
    pub fn from_entries(entries: impl IntoIterator<Item = String>, limit: usize) -> Self {
        let mut recent = Self::new(limit);
        let mut entries: Vec<String> = entries.into_iter().collect();
        // Stored lists are newest first; replay oldest first
        entries.reverse();
        for entry in entries {
            recent.push(&entry);
        }
        recent
    }

    /// Move `query` to the front; returns false for blank queries
    pub fn push(&mut self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return false;
        }

        self.entries.retain(|entry| entry != query);
        self.entries.insert(0, query.to_string());
        self.entries.truncate(self.limit);
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
