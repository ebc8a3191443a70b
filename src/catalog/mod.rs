// Book catalog module
// Loads the cleaned books CSV once at startup; read-only afterwards


use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::{BookrecError, Result};

/// Columns the CSV must provide for the catalog to be usable.
const REQUIRED_COLUMNS: &[&str] = &["isbn13", "title", "authors", "average_rating"];

/// One book from the catalog. Identified by ISBN-13, which is also the key
/// used by the vector store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Book {
    pub isbn13: i64,
    pub title: String,
    /// Semicolon-separated author names, as in the source dataset.
    #[serde(default)]
    pub authors: String,
    #[serde(default)]
    pub description: String,
    pub average_rating: f32,
    #[serde(default, deserialize_with = "numeric_option")]
    pub published_year: Option<i32>,
    #[serde(default, deserialize_with = "numeric_option")]
    pub num_pages: Option<u32>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// In-memory book catalog keyed by ISBN-13.
pub struct Catalog {
    books: HashMap<i64, Book>,
}

impl Catalog {
    /// Load the catalog from a CSV file. Rows that fail to parse are skipped
    /// with a warning; a file with no usable rows is an error.
    #[inline]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(BookrecError::Dataset(format!(
                "Books CSV not found: {}",
                path.display()
            )));
        }

        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| BookrecError::Dataset(format!("Failed to open books CSV: {}", e)))?;

        let headers = reader
            .headers()
            .map_err(|e| BookrecError::Dataset(format!("Failed to read CSV headers: {}", e)))?
            .clone();
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .filter(|col| !headers.iter().any(|h| h == **col))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(BookrecError::Dataset(format!(
                "Books CSV is missing required columns: {}",
                missing.join(", ")
            )));
        }

        let mut books = HashMap::new();
        let mut skipped = 0usize;
        for (row, record) in reader.deserialize::<Book>().enumerate() {
            match record {
                Ok(book) => {
                    books.insert(book.isbn13, book);
                }
                Err(e) => {
                    warn!("Skipping malformed row {}: {}", row + 2, e);
                    skipped += 1;
                }
            }
        }

        if books.is_empty() {
            return Err(BookrecError::Dataset(format!(
                "No usable book records in {}",
                path.display()
            )));
        }

        if skipped > 0 {
            warn!("Skipped {} malformed rows while loading catalog", skipped);
        }
        info!("Loaded {} books from {}", books.len(), path.display());

        Ok(Self { books })
    }

    /// Resolve a vector-store identifier to its book record.
    #[inline]
    pub fn get(&self, isbn13: i64) -> Option<&Book> {
        let book = self.books.get(&isbn13);
        if book.is_none() {
            debug!("ISBN {} not present in catalog", isbn13);
        }
        book
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.books.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    #[inline]
    pub fn books(&self) -> impl Iterator<Item = &Book> {
        self.books.values()
    }

    /// Build a catalog directly from records, bypassing the CSV path.
    #[inline]
    pub fn from_books(records: Vec<Book>) -> Self {
        Self {
            books: records.into_iter().map(|b| (b.isbn13, b)).collect(),
        }
    }
}

/// The source dataset was exported by a dataframe library, so integer columns
/// with missing values are written as floats ("2004.0") or empty strings.
fn numeric_option<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else { return Ok(None) };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value = trimmed
        .parse::<f64>()
        .map_err(|_| serde::de::Error::custom(format!("invalid numeric value: {}", trimmed)))?;

    Ok(T::try_from(value as i64).ok())
}
