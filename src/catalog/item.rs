//! Catalog item types.

use serde::{Deserialize, Serialize};

/// A book as the recommendation engine sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Work key, e.g. `OL45804W`.
    pub work_key: String,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub first_publish_year: Option<i32>,
    #[serde(default)]
    pub cover_id: Option<i64>,
}

impl Item {
    pub fn new<K: Into<String>, T: Into<String>>(work_key: K, title: T) -> Self {
        Self {
            work_key: work_key.into(),
            title: title.into(),
            authors: Vec::new(),
            subjects: Vec::new(),
            first_publish_year: None,
            cover_id: None,
        }
    }

    pub fn with_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_subjects<I, S>(mut self, subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subjects = subjects.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_publish_year(mut self, year: i32) -> Self {
        self.first_publish_year = Some(year);
        self
    }

    pub fn with_cover_id(mut self, cover_id: i64) -> Self {
        self.cover_id = Some(cover_id);
        self
    }

    pub fn summary(&self) -> ItemSummary {
        ItemSummary::from(self)
    }
}

/// The projection of an item returned with recommendations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub work_key: String,
    pub title: String,
    pub authors: Vec<String>,
    pub cover_id: Option<i64>,
    pub first_publish_year: Option<i32>,
}

impl From<&Item> for ItemSummary {
    fn from(item: &Item) -> Self {
        Self {
            work_key: item.work_key.clone(),
            title: item.title.clone(),
            authors: item.authors.clone(),
            cover_id: item.cover_id,
            first_publish_year: item.first_publish_year,
        }
    }
}

/// One line of a JSON Lines catalog file: an item plus the users who
/// favorited it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    #[serde(flatten)]
    pub item: Item,
    #[serde(default)]
    pub favorited_by: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_parses_with_optional_fields_missing() {
        let record: CatalogRecord =
            serde_json::from_str(r#"{"work_key": "OL1W", "title": "Emma"}"#).unwrap();
        assert_eq!(record.item.work_key, "OL1W");
        assert!(record.item.authors.is_empty());
        assert_eq!(record.item.first_publish_year, None);
        assert!(record.favorited_by.is_empty());
    }

    #[test]
    fn test_record_parses_full_line() {
        let line = r#"{"work_key": "OL2W", "title": "Dune", "authors": ["Frank Herbert"],
            "subjects": ["Science fiction"], "first_publish_year": 1965, "cover_id": 11,
            "favorited_by": ["alice"]}"#;
        let record: CatalogRecord = serde_json::from_str(line).unwrap();
        assert_eq!(record.item.first_publish_year, Some(1965));
        assert_eq!(record.item.cover_id, Some(11));
        assert_eq!(record.favorited_by, vec!["alice"]);
    }

    #[test]
    fn test_summary_projection() {
        let item = Item::new("OL3W", "Persuasion")
            .with_authors(["Jane Austen"])
            .with_subjects(["Romance"])
            .with_publish_year(1817)
            .with_cover_id(42);
        let summary = item.summary();
        assert_eq!(summary.work_key, "OL3W");
        assert_eq!(summary.authors, vec!["Jane Austen"]);
        assert_eq!(summary.cover_id, Some(42));
        assert_eq!(summary.first_publish_year, Some(1817));
    }
}
