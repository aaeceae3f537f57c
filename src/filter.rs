//! Year/type filtering of the publication list.

use std::collections::HashSet;

use crate::publication::PublicationItem;

/// Selected filter values; an empty string places no constraint on that axis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub year: String,
    pub kind: String,
}

impl FilterSelection {
    #[must_use]
    pub fn new(year: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            year: year.into(),
            kind: kind.into(),
        }
    }

    /// True when neither axis is constrained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.year.is_empty() && self.kind.is_empty()
    }

    /// Exact match on every constrained axis.
    #[must_use]
    pub fn matches(&self, item: &PublicationItem) -> bool {
        (self.year.is_empty() || item.year == self.year)
            && (self.kind.is_empty() || item.kind == self.kind)
    }

    /// Returns the matching items in their original order.
    #[must_use]
    pub fn apply(&self, items: &[PublicationItem]) -> Vec<PublicationItem> {
        items
            .iter()
            .filter(|item| self.matches(item))
            .cloned()
            .collect()
    }
}

/// Distinct non-empty years, newest first.
///
/// Numeric years sort descending; anything that does not parse as a number
/// follows in first-seen order.
#[must_use]
pub fn distinct_years(items: &[PublicationItem]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut numeric: Vec<(i64, String)> = Vec::new();
    let mut other: Vec<String> = Vec::new();

    for year in items.iter().map(|item| item.year.as_str()) {
        if year.is_empty() || !seen.insert(year) {
            continue;
        }
        match year.trim().parse::<i64>() {
            Ok(n) => numeric.push((n, year.to_string())),
            Err(_) => other.push(year.to_string()),
        }
    }

    numeric.sort_by(|a, b| b.0.cmp(&a.0));
    numeric
        .into_iter()
        .map(|(_, year)| year)
        .chain(other)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<PublicationItem> {
        vec![
            PublicationItem::new("a").with_year("2021").with_kind("journal-article"),
            PublicationItem::new("b").with_year("2020").with_kind("journal-article"),
            PublicationItem::new("c").with_year("2021").with_kind("conference-paper"),
            PublicationItem::new("d").with_kind("preprint"),
            PublicationItem::new("e").with_year("2019").with_kind("conference-paper"),
        ]
    }

    fn titles(items: &[PublicationItem]) -> Vec<&str> {
        items.iter().map(|i| i.title.as_str()).collect()
    }

    #[test]
    fn test_empty_selection_keeps_everything() {
        let items = sample();
        let selection = FilterSelection::default();
        assert!(selection.is_empty());
        assert_eq!(selection.apply(&items), items);
    }

    #[test]
    fn test_year_only_ignores_type() {
        let items = sample();
        let filtered = FilterSelection::new("2021", "").apply(&items);
        assert_eq!(titles(&filtered), ["a", "c"]);
    }

    #[test]
    fn test_type_only_ignores_year() {
        let items = sample();
        let filtered = FilterSelection::new("", "conference-paper").apply(&items);
        assert_eq!(titles(&filtered), ["c", "e"]);
    }

    #[test]
    fn test_both_axes_must_match() {
        let items = sample();
        let filtered = FilterSelection::new("2021", "journal-article").apply(&items);
        assert_eq!(titles(&filtered), ["a"]);
    }

    #[test]
    fn test_no_match_is_empty() {
        let items = sample();
        assert!(FilterSelection::new("1999", "").apply(&items).is_empty());
    }

    #[test]
    fn test_distinct_years_descending_deduplicated() {
        assert_eq!(distinct_years(&sample()), ["2021", "2020", "2019"]);
    }

    #[test]
    fn test_distinct_years_numeric_order_not_lexical() {
        let items = vec![
            PublicationItem::new("a").with_year("999"),
            PublicationItem::new("b").with_year("2001"),
            PublicationItem::new("c").with_year("in press"),
            PublicationItem::new("d").with_year("1010"),
        ];
        assert_eq!(distinct_years(&items), ["2001", "1010", "999", "in press"]);
    }

    #[test]
    fn test_distinct_years_empty_list() {
        assert!(distinct_years(&[]).is_empty());
    }
}
