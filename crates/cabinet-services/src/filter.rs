//! Client-side tag / metadata filtering
//!
//! Providers offer no server-side tag query, so filtering lists the bucket
//! and fetches each object's tags: one extra remote call per object.

use std::collections::HashMap;

use serde::Deserialize;
use utoipa::ToSchema;

/// How the entries of a [`TagFilter`] are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum FilterOperator {
    /// Every entry must match.
    #[default]
    #[serde(alias = "and")]
    And,
    /// At least one entry must match.
    #[serde(alias = "or")]
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, ToSchema)]
pub struct TagFilter {
    #[serde(default)]
    pub tags: HashMap<String, String>,
    #[serde(default)]
    pub operator: FilterOperator,
}

impl TagFilter {
    pub fn new(operator: FilterOperator) -> Self {
        Self {
            tags: HashMap::new(),
            operator,
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// An empty filter matches every object.
    pub fn matches(&self, tags: &HashMap<String, String>) -> bool {
        if self.tags.is_empty() {
            return true;
        }
        let hit = |(key, value): (&String, &String)| tags.get(key) == Some(value);
        match self.operator {
            FilterOperator::And => self.tags.iter().all(hit),
            FilterOperator::Or => self.tags.iter().any(hit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_and_requires_every_tag() {
        let filter = TagFilter::new(FilterOperator::And)
            .with_tag("env", "prod")
            .with_tag("team", "docs");
        assert!(filter.matches(&tags(&[("env", "prod"), ("team", "docs"), ("x", "y")])));
        assert!(!filter.matches(&tags(&[("env", "prod")])));
        assert!(!filter.matches(&tags(&[("env", "dev"), ("team", "docs")])));
    }

    #[test]
    fn test_or_requires_any_tag() {
        let filter = TagFilter::new(FilterOperator::Or)
            .with_tag("env", "prod")
            .with_tag("team", "docs");
        assert!(filter.matches(&tags(&[("team", "docs")])));
        assert!(!filter.matches(&tags(&[("env", "dev")])));
        assert!(!filter.matches(&HashMap::new()));
    }

    #[test]
    fn test_empty_filter_matches_all() {
        assert!(TagFilter::default().matches(&HashMap::new()));
        assert!(TagFilter::new(FilterOperator::Or).matches(&tags(&[("a", "b")])));
    }

    #[test]
    fn test_operator_deserializes_either_case() {
        let filter: TagFilter =
            serde_json::from_str(r#"{"tags":{"env":"prod"},"operator":"or"}"#).unwrap();
        assert_eq!(filter.operator, FilterOperator::Or);
        let filter: TagFilter = serde_json::from_str(r#"{"operator":"AND"}"#).unwrap();
        assert_eq!(filter.operator, FilterOperator::And);
        assert!(filter.tags.is_empty());
    }
}
