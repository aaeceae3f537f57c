//! Publication records as displayed on the page.
//!
//! [`PublicationItem`] is the single entity shared by both sources, the
//! enrichment pass and the renderer. Its serialized form is the static JSON
//! format written by `publist build` and read by the static source.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Placeholder title used when a record has none.
pub const UNTITLED: &str = "Untitled";

/// Base URL of the DOI resolver used for DOI links and URL backfill.
pub const DOI_RESOLVER: &str = "https://doi.org/";

/// One entry of the publication list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationItem {
    /// Display title; never empty after normalization.
    pub title: String,
    /// Publication year, empty when unknown.
    pub year: String,
    /// Free-form work type tag (e.g. `journal-article`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Persistent identifier, empty when unknown.
    pub doi: String,
    /// Landing page link, empty when unknown.
    pub url: String,
    /// ORCID correlation code used to fetch enrichment data.
    #[serde(skip)]
    pub put_code: Option<String>,
}

impl PublicationItem {
    /// Creates an item with the given title and every optional field empty.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: normalize_title(title.into()),
            year: String::new(),
            kind: String::new(),
            doi: String::new(),
            url: String::new(),
            put_code: None,
        }
    }

    #[must_use]
    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = year.into();
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    #[must_use]
    pub fn with_doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = doi.into();
        self
    }

    #[must_use]
    pub fn with_put_code(mut self, put_code: impl Into<String>) -> Self {
        self.put_code = Some(put_code.into());
        self
    }

    /// Resolver link for the DOI, if one is known.
    #[must_use]
    pub fn doi_url(&self) -> Option<String> {
        if self.doi.is_empty() {
            None
        } else {
            Some(format!("{DOI_RESOLVER}{}", self.doi))
        }
    }

    /// Records a discovered DOI, backfilling `url` when the item has none.
    pub fn apply_doi(&mut self, doi: impl Into<String>) {
        let doi = doi.into();
        if doi.is_empty() {
            return;
        }
        self.doi = doi;
        if self.url.is_empty() {
            self.url = format!("{DOI_RESOLVER}{}", self.doi);
        }
    }

    /// Year as a number for ordering; empty or non-numeric years count as 0.
    #[must_use]
    pub fn year_rank(&self) -> i64 {
        self.year.trim().parse().unwrap_or(0)
    }
}

/// A record as found in the static JSON file.
///
/// Every field is optional; `null` and missing are treated alike and years
/// may be written as numbers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub year: String,
    #[serde(default, rename = "type", deserialize_with = "lenient_string")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub doi: String,
}

impl From<RawRecord> for PublicationItem {
    fn from(raw: RawRecord) -> Self {
        Self {
            title: normalize_title(raw.title),
            year: raw.year,
            kind: raw.kind,
            doi: raw.doi,
            url: raw.url,
            put_code: None,
        }
    }
}

/// Falls back to [`UNTITLED`] for blank titles.
#[must_use]
pub fn normalize_title(title: String) -> String {
    if title.trim().is_empty() {
        UNTITLED.to_string()
    } else {
        title
    }
}

/// Orders items newest year first; ties keep their source order.
pub fn sort_newest_first(items: &mut [PublicationItem]) {
    items.sort_by_key(|item| std::cmp::Reverse(item.year_rank()));
}

/// Reads strings, numbers and booleans as text; `null` and other shapes become empty.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_string(&value))
}

pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_item_blank_title_becomes_untitled() {
        assert_eq!(PublicationItem::new("").title, UNTITLED);
        assert_eq!(PublicationItem::new("   ").title, UNTITLED);
        assert_eq!(PublicationItem::new("Paper").title, "Paper");
    }

    #[test]
    fn test_raw_record_missing_fields_default_to_empty() {
        let raw: RawRecord = serde_json::from_str(r#"{"year": 2021}"#).unwrap();
        let item = PublicationItem::from(raw);
        assert_eq!(item.title, UNTITLED);
        assert_eq!(item.year, "2021");
        assert!(item.kind.is_empty());
        assert!(item.url.is_empty());
        assert!(item.doi.is_empty());
        assert!(item.put_code.is_none());
    }

    #[test]
    fn test_raw_record_null_fields_treated_as_absent() {
        let raw: RawRecord =
            serde_json::from_str(r#"{"title": null, "url": null, "extra": [1, 2]}"#).unwrap();
        let item = PublicationItem::from(raw);
        assert_eq!(item.title, UNTITLED);
        assert!(item.url.is_empty());
    }

    #[test]
    fn test_apply_doi_backfills_missing_url() {
        let mut item = PublicationItem::new("A");
        item.apply_doi("10.1000/xyz");
        assert_eq!(item.doi, "10.1000/xyz");
        assert_eq!(item.url, "https://doi.org/10.1000/xyz");
    }

    #[test]
    fn test_apply_doi_keeps_existing_url() {
        let mut item = PublicationItem::new("A").with_url("http://x");
        item.apply_doi("10.1000/xyz");
        assert_eq!(item.doi, "10.1000/xyz");
        assert_eq!(item.url, "http://x");
    }

    #[test]
    fn test_apply_empty_doi_is_ignored() {
        let mut item = PublicationItem::new("A");
        item.apply_doi("");
        assert!(item.doi.is_empty());
        assert!(item.url.is_empty());
    }

    #[test]
    fn test_sort_newest_first_is_stable_with_empty_years_last() {
        let mut items = vec![
            PublicationItem::new("old").with_year("2019"),
            PublicationItem::new("none"),
            PublicationItem::new("new-a").with_year("2022"),
            PublicationItem::new("new-b").with_year("2022"),
        ];
        sort_newest_first(&mut items);
        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["new-a", "new-b", "old", "none"]);
    }

    #[test]
    fn test_serialized_form_matches_static_format() {
        let item = PublicationItem::new("A")
            .with_year("2020")
            .with_kind("journal-article")
            .with_put_code("123");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "title": "A",
                "year": "2020",
                "type": "journal-article",
                "doi": "",
                "url": ""
            })
        );
    }
}
