//! Document library: categories, search and ordering over fetched documents.

use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::types::DocumentSummary;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    Documents,
    Images,
    Videos,
    Other,
}

impl Category {
    pub fn from_file_type(file_type: &str) -> Self {
        match file_type.trim().to_ascii_uppercase().as_str() {
            "PDF" | "DOCX" | "TXT" => Category::Documents,
            "PNG" | "JPG" | "JPEG" | "GIF" => Category::Images,
            "MP4" | "AVI" | "MOV" => Category::Videos,
            _ => Category::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Documents => "Documents",
            Category::Images => "Images",
            Category::Videos => "Vidéos",
            Category::Other => "Autres",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "documents" => Ok(Category::Documents),
            "images" => Ok(Category::Images),
            "videos" | "vidéos" => Ok(Category::Videos),
            "other" | "autres" => Ok(Category::Other),
            other => Err(format!("unknown category '{other}'")),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Newest first.
    #[default]
    Date,
    /// Filename, ascending.
    Name,
    /// Largest first.
    Size,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(SortKey::Date),
            "name" => Ok(SortKey::Name),
            "size" => Ok(SortKey::Size),
            other => Err(format!("unknown sort key '{other}' (expected date, name or size)")),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct LibraryQuery {
    pub search: String,
    pub category: Option<Category>,
    pub sort: SortKey,
}

#[derive(Clone, Debug)]
pub struct LibraryEntry {
    pub document: DocumentSummary,
    pub category: Category,
    pub uploaded: Option<DateTime<Utc>>,
}

impl LibraryEntry {
    pub fn new(document: DocumentSummary) -> Self {
        let category = Category::from_file_type(&document.file_type);
        let uploaded = document
            .uploaded_at
            .as_deref()
            .or(document.created_at.as_deref())
            .and_then(parse_timestamp);
        Self {
            document,
            category,
            uploaded,
        }
    }

    fn matches(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        self.document.filename.to_lowercase().contains(needle)
            || self
                .document
                .extracted_text
                .as_deref()
                .is_some_and(|text| text.to_lowercase().contains(needle))
    }
}

/// The backend emits both RFC 3339 and naive ISO timestamps.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

pub fn catalog(documents: Vec<DocumentSummary>) -> Vec<LibraryEntry> {
    documents.into_iter().map(LibraryEntry::new).collect()
}

/// Distinct categories present, in their natural order.
pub fn categories(entries: &[LibraryEntry]) -> Vec<Category> {
    let mut found: Vec<Category> = entries.iter().map(|entry| entry.category).collect();
    found.sort();
    found.dedup();
    found
}

pub fn filter_and_sort<'a>(entries: &'a [LibraryEntry], query: &LibraryQuery) -> Vec<&'a LibraryEntry> {
    let needle = query.search.trim().to_lowercase();
    let mut selected: Vec<&LibraryEntry> = entries
        .iter()
        .filter(|entry| entry.matches(&needle))
        .filter(|entry| query.category.is_none_or(|category| entry.category == category))
        .collect();

    match query.sort {
        SortKey::Date => selected.sort_by_key(|entry| Reverse(entry.uploaded)),
        SortKey::Name => selected.sort_by(|a, b| {
            a.document
                .filename
                .to_lowercase()
                .cmp(&b.document.filename.to_lowercase())
        }),
        SortKey::Size => selected.sort_by_key(|entry| Reverse(entry.document.size.unwrap_or(0))),
    }
    selected
}

pub fn total_size(entries: &[LibraryEntry]) -> u64 {
    entries
        .iter()
        .filter_map(|entry| entry.document.size)
        .sum()
}

pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let size = bytes as f64;
    if size < KB {
        format!("{bytes} B")
    } else if size < KB * KB {
        format!("{:.1} KB", size / KB)
    } else if size < KB * KB * KB {
        format!("{:.1} MB", size / (KB * KB))
    } else {
        format!("{:.1} GB", size / (KB * KB * KB))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, filename: &str, file_type: &str, uploaded_at: &str, size: u64) -> DocumentSummary {
        DocumentSummary {
            id: id.into(),
            filename: filename.into(),
            file_type: file_type.into(),
            uploaded_at: Some(uploaded_at.into()),
            size: Some(size),
            ..DocumentSummary::default()
        }
    }

    fn sample() -> Vec<LibraryEntry> {
        let mut thermo = doc("1", "thermo.pdf", "PDF", "2025-03-01T10:00:00Z", 2_000);
        thermo.extracted_text = Some("Le premier principe de la thermodynamique".into());
        catalog(vec![
            thermo,
            doc("2", "Algebre.docx", "DOCX", "2025-03-05T09:00:00", 500),
            doc("3", "schema.png", "png", "2025-02-20T08:00:00Z", 9_000),
            doc("4", "cours.mp4", "MP4", "2025-03-02T08:00:00Z", 50),
            doc("5", "notes.xyz", "XYZ", "not a date", 0),
        ])
    }

    fn ids(entries: &[&LibraryEntry]) -> Vec<String> {
        entries.iter().map(|e| e.document.id.clone()).collect()
    }

    #[test]
    fn categories_follow_file_type() {
        let entries = sample();
        let cats: Vec<Category> = entries.iter().map(|e| e.category).collect();
        assert_eq!(
            cats,
            vec![
                Category::Documents,
                Category::Documents,
                Category::Images,
                Category::Videos,
                Category::Other
            ]
        );
        assert_eq!(categories(&entries).len(), 4);
        assert_eq!(Category::Videos.to_string(), "Vidéos");
    }

    #[test]
    fn date_sort_puts_newest_first_and_undated_last() {
        let entries = sample();
        let sorted = filter_and_sort(&entries, &LibraryQuery::default());
        assert_eq!(ids(&sorted), vec!["2", "4", "1", "3", "5"]);
    }

    #[test]
    fn name_and_size_sorts() {
        let entries = sample();
        let by_name = filter_and_sort(
            &entries,
            &LibraryQuery {
                sort: SortKey::Name,
                ..LibraryQuery::default()
            },
        );
        assert_eq!(ids(&by_name), vec!["2", "4", "5", "3", "1"]);

        let by_size = filter_and_sort(
            &entries,
            &LibraryQuery {
                sort: SortKey::Size,
                ..LibraryQuery::default()
            },
        );
        assert_eq!(ids(&by_size), vec!["3", "1", "2", "4", "5"]);
    }

    #[test]
    fn search_covers_filename_and_extracted_text() {
        let entries = sample();
        let query = LibraryQuery {
            search: "THERMODYNAMIQUE".into(),
            ..LibraryQuery::default()
        };
        assert_eq!(ids(&filter_and_sort(&entries, &query)), vec!["1"]);

        let query = LibraryQuery {
            search: "algebre".into(),
            category: Some(Category::Documents),
            ..LibraryQuery::default()
        };
        assert_eq!(ids(&filter_and_sort(&entries, &query)), vec!["2"]);

        let query = LibraryQuery {
            search: "algebre".into(),
            category: Some(Category::Images),
            ..LibraryQuery::default()
        };
        assert!(filter_and_sort(&entries, &query).is_empty());
    }

    #[test]
    fn sizes_are_summed_and_formatted() {
        assert_eq!(total_size(&sample()), 11_550);
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn category_and_sort_parse_from_cli_words() {
        assert_eq!("autres".parse::<Category>(), Ok(Category::Other));
        assert_eq!("Vidéos".parse::<Category>(), Ok(Category::Videos));
        assert_eq!("SIZE".parse::<SortKey>(), Ok(SortKey::Size));
        assert!("weight".parse::<SortKey>().is_err());
    }
}
