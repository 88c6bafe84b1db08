//! Session configuration

use serde::{Deserialize, Serialize};
use taskdeck_search::MAX_LIMIT;

use crate::{Result, SessionError};

/// Tunables for a search session
///
/// Limits are checked by [`SessionConfig::validate`]: both page sizes must
/// lie in `1..=MAX_LIMIT` and at least one recent search must be kept.
/// Set `record_recent` to false to turn history off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Maximum number of recent searches kept (at least 1)
    pub recent_limit: usize,

    /// Result count for autocomplete lookups (1 to 500)
    pub quick_search_limit: usize,

    /// Page size used when a caller does not pick one (1 to 500)
    pub default_limit: usize,

    /// Key under which recent searches are persisted
    pub recent_key: String,

    /// Whether full searches are remembered as recent searches
    pub record_recent: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            recent_limit: 10,
            quick_search_limit: 8,
            default_limit: 20,
            recent_key: "taskdeck.recent_searches".to_string(),
            record_recent: true,
        }
    }
}

impl SessionConfig {
    /// Parse and validate a config from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        check_page_size("quick_search_limit", self.quick_search_limit)?;
        check_page_size("default_limit", self.default_limit)?;
        if self.recent_limit == 0 {
            return Err(SessionError::InvalidConfig(
                "recent_limit must be at least 1".to_string(),
            ));
        }
        if self.recent_key.trim().is_empty() {
            return Err(SessionError::InvalidConfig(
                "recent_key must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_page_size(name: &str, value: usize) -> Result<()> {
    if value == 0 || value > MAX_LIMIT {
        return Err(SessionError::InvalidConfig(format!(
            "{} must be between 1 and {}, got {}",
            name, MAX_LIMIT, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SessionConfig::from_json(r#"{ "quick_search_limit": 3 }"#).unwrap();
        assert_eq!(config.quick_search_limit, 3);
        assert_eq!(config.recent_limit, 10);
        assert!(config.record_recent);
        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_out_of_range_limits_are_rejected() {
        for json in [
            r#"{ "quick_search_limit": 0 }"#,
            r#"{ "default_limit": 501 }"#,
            r#"{ "recent_limit": 0 }"#,
            r#"{ "recent_key": " " }"#,
        ] {
            assert!(
                matches!(
                    SessionConfig::from_json(json),
                    Err(SessionError::InvalidConfig(_))
                ),
                "accepted {}",
                json
            );
        }
        assert!(SessionConfig::from_json(r#"{ "default_limit": 500 }"#).is_ok());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(matches!(
            SessionConfig::from_json(r#"{ "quick_limit": 5 }"#),
            Err(SessionError::Serialization(_))
        ));
    }
}
