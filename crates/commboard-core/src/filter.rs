//! Library filtering by search text and tags.

use crate::catalog::Catalog;
use crate::symbol::Symbol;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Search query plus selected tags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolFilter {
    /// Free-text search. Empty matches everything.
    pub query: String,
    /// Selected tags. Empty matches everything.
    pub tags: BTreeSet<String>,
}

impl SymbolFilter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the search query.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Builder: select a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Select or deselect a tag. Returns whether it is now selected.
    pub fn toggle_tag(&mut self, tag: &str) -> bool {
        if self.tags.remove(tag) {
            false
        } else {
            self.tags.insert(tag.to_string());
            true
        }
    }

    /// Check if a tag is selected.
    pub fn is_selected(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Reset query and tag selection.
    pub fn clear(&mut self) {
        self.query.clear();
        self.tags.clear();
    }

    /// Check if the filter lets everything through.
    pub fn is_empty(&self) -> bool {
        self.query.trim().is_empty() && self.tags.is_empty()
    }

    /// Case-insensitive substring match against the name or any tag.
    pub fn matches_query(&self, symbol: &Symbol) -> bool {
        if self.query.is_empty() {
            return true;
        }
        let query = self.query.to_lowercase();
        symbol.name.to_lowercase().contains(&query)
            || symbol.tags.iter().any(|t| t.to_lowercase().contains(&query))
    }

    /// Any selected tag is on the symbol.
    pub fn matches_tags(&self, symbol: &Symbol) -> bool {
        self.tags.is_empty() || self.tags.iter().any(|t| symbol.has_tag(t))
    }

    /// Both predicates.
    pub fn matches(&self, symbol: &Symbol) -> bool {
        self.matches_query(symbol) && self.matches_tags(symbol)
    }

    /// Matching catalog symbols in catalog order.
    pub fn apply<'a>(&self, catalog: &'a Catalog) -> Vec<&'a Arc<Symbol>> {
        catalog
            .symbols()
            .iter()
            .filter(|s| self.matches(s))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Symbol::new("bath", "Bath", "/assets/bath.png", ["daily-activities"]),
            Symbol::new("car", "Car", "/assets/car.png", ["objects"]),
        ])
    }

    fn names(filter: &SymbolFilter, catalog: &Catalog) -> Vec<String> {
        filter
            .apply(catalog)
            .iter()
            .map(|s| s.name.clone())
            .collect()
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let catalog = catalog();
        assert_eq!(names(&SymbolFilter::new(), &catalog), vec!["Bath", "Car"]);
    }

    #[test]
    fn test_query_matches_name() {
        let catalog = catalog();
        let filter = SymbolFilter::new().with_query("ba");
        assert_eq!(names(&filter, &catalog), vec!["Bath"]);
    }

    #[test]
    fn test_query_is_case_insensitive_and_matches_tags() {
        let catalog = catalog();
        assert_eq!(
            names(&SymbolFilter::new().with_query("CAR"), &catalog),
            vec!["Car"]
        );
        assert_eq!(
            names(&SymbolFilter::new().with_query("object"), &catalog),
            vec!["Car"]
        );
    }

    #[test]
    fn test_query_without_match() {
        let catalog = catalog();
        assert!(names(&SymbolFilter::new().with_query("z"), &catalog).is_empty());
    }

    #[test]
    fn test_tag_filter() {
        let catalog = catalog();
        let filter = SymbolFilter::new().with_tag("objects");
        assert_eq!(names(&filter, &catalog), vec!["Car"]);

        let both = filter.with_tag("daily-activities");
        assert_eq!(names(&both, &catalog), vec!["Bath", "Car"]);
    }

    #[test]
    fn test_query_and_tags_combined() {
        let catalog = catalog();
        let filter = SymbolFilter::new().with_query("ba").with_tag("objects");
        assert!(names(&filter, &catalog).is_empty());
    }

    #[test]
    fn test_toggle_and_clear() {
        let mut filter = SymbolFilter::new();
        assert!(filter.toggle_tag("food"));
        assert!(filter.is_selected("food"));
        assert!(!filter.toggle_tag("food"));
        assert!(filter.is_empty());

        filter.query = "bath".to_string();
        filter.toggle_tag("food");
        filter.clear();
        assert!(filter.is_empty());
    }
}
