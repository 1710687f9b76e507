//! Metadata filters applied during vector retrieval.

use serde::{Deserialize, Serialize};

use crate::core::{Node, PAGE_LABEL_KEY};

/// Comparison applied by a single filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    /// Metadata value equals the filter value.
    #[default]
    Eq,
    /// Metadata value differs from the filter value (or is absent).
    NotEq,
}

/// How multiple filters combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterCondition {
    /// Every filter must match.
    #[default]
    And,
    /// At least one filter must match.
    Or,
}

/// A single `key <op> value` filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFilter {
    /// Metadata key.
    pub key: String,
    /// Expected value.
    pub value: String,
    /// Comparison.
    #[serde(default)]
    pub operator: FilterOperator,
}

impl MetadataFilter {
    /// Creates an equality filter.
    pub fn eq(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            operator: FilterOperator::Eq,
        }
    }

    fn matches(&self, node: &Node) -> bool {
        let actual = node.metadata.get(&self.key);
        match self.operator {
            FilterOperator::Eq => actual.is_some_and(|v| *v == self.value),
            FilterOperator::NotEq => actual.is_none_or(|v| *v != self.value),
        }
    }
}

/// A set of filters with a combining condition. Empty sets match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFilters {
    /// Filters to apply.
    pub filters: Vec<MetadataFilter>,
    /// Combining condition.
    #[serde(default)]
    pub condition: FilterCondition,
}

impl MetadataFilters {
    /// Creates a filter set.
    #[must_use]
    pub const fn new(filters: Vec<MetadataFilter>, condition: FilterCondition) -> Self {
        Self { filters, condition }
    }

    /// `page_label == p` for each page, combined with OR.
    ///
    /// Returns `None` when `pages` is empty: no restriction.
    #[must_use]
    pub fn page_numbers(pages: &[String]) -> Option<Self> {
        if pages.is_empty() {
            return None;
        }
        let filters = pages
            .iter()
            .map(|p| MetadataFilter::eq(PAGE_LABEL_KEY, p.clone()))
            .collect();
        Some(Self::new(filters, FilterCondition::Or))
    }

    /// Whether `node` passes the filter set.
    #[must_use]
    pub fn matches(&self, node: &Node) -> bool {
        if self.filters.is_empty() {
            return true;
        }
        match self.condition {
            FilterCondition::And => self.filters.iter().all(|f| f.matches(node)),
            FilterCondition::Or => self.filters.iter().any(|f| f.matches(node)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn page_node(page: &str) -> Node {
        Node::new(format!("n-{page}"), "text")
            .with_metadata(PAGE_LABEL_KEY, page)
            .with_metadata("file_name", "metagpt.pdf")
    }

    #[test]
    fn test_empty_pages_unrestricted() {
        assert!(MetadataFilters::page_numbers(&[]).is_none());
        assert!(MetadataFilters::default().matches(&page_node("1")));
    }

    #[test]
    fn test_and_condition() {
        let filters = MetadataFilters::new(
            vec![
                MetadataFilter::eq(PAGE_LABEL_KEY, "2"),
                MetadataFilter::eq("file_name", "metagpt.pdf"),
            ],
            FilterCondition::And,
        );
        assert!(filters.matches(&page_node("2")));
        assert!(!filters.matches(&page_node("3")));
    }

    #[test]
    fn test_not_eq_matches_missing_key() {
        let filter = MetadataFilters::new(
            vec![MetadataFilter {
                key: "section".to_string(),
                value: "intro".to_string(),
                operator: FilterOperator::NotEq,
            }],
            FilterCondition::And,
        );
        assert!(filter.matches(&page_node("1")));
    }

    #[test]
    fn test_serde_defaults() {
        let filters: MetadataFilters =
            serde_json::from_str(r#"{"filters":[{"key":"page_label","value":"2"}]}"#)
                .unwrap_or_else(|_| unreachable!());
        assert_eq!(filters.condition, FilterCondition::And);
        assert_eq!(filters.filters[0].operator, FilterOperator::Eq);
    }

    proptest! {
        #[test]
        fn prop_page_filter_is_or(
            pages in proptest::collection::vec(1u32..50, 1..6),
            candidate in 1u32..50,
        ) {
            let labels: Vec<String> = pages.iter().map(ToString::to_string).collect();
            let filters = MetadataFilters::page_numbers(&labels)
                .unwrap_or_else(|| unreachable!());
            let node = page_node(&candidate.to_string());
            prop_assert_eq!(filters.matches(&node), pages.contains(&candidate));
        }
    }
}
