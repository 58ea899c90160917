//! Bibliography records keyed by citation key
//!
//! The library is read from a CSL-JSON export of the reference manager
//! (Better BibTeX's "Better CSL JSON", or Zotero's own CSL JSON). Only the
//! fields the note recipes use are kept.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{debug, warn};
use serde::Deserialize;

use crate::error::{Error, Result};

/// One author or editor
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Person {
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub given: Option<String>,
    /// Institutional names come as a single literal
    #[serde(default)]
    pub literal: Option<String>,
}

impl Person {
    pub fn new(family: &str, given: &str) -> Self {
        Self {
            family: Some(family.to_string()),
            given: Some(given.to_string()),
            literal: None,
        }
    }

    /// Family name, falling back to the literal name
    pub fn last_name(&self) -> Option<&str> {
        self.family
            .as_deref()
            .or(self.literal.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
struct DateVariable {
    #[serde(rename = "date-parts", default)]
    date_parts: Vec<Vec<serde_json::Value>>,
    #[serde(default)]
    raw: Option<String>,
}

impl DateVariable {
    fn year(&self) -> Option<String> {
        let first = self.date_parts.first().and_then(|parts| parts.first());
        match first {
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s.clone()),
            _ => self
                .raw
                .as_deref()
                .and_then(|raw| raw.get(..4))
                .filter(|y| y.chars().all(|c| c.is_ascii_digit()))
                .map(String::from),
        }
    }
}

/// CSL-JSON item as exported
#[derive(Debug, Deserialize)]
struct CslItem {
    id: serde_json::Value,
    #[serde(default)]
    title: Option<String>,
    #[serde(rename = "container-title", default)]
    container_title: Option<String>,
    #[serde(default)]
    publisher: Option<String>,
    #[serde(default)]
    issued: Option<DateVariable>,
    #[serde(default)]
    author: Vec<Person>,
    #[serde(rename = "DOI", default)]
    doi: Option<String>,
}

/// Bibliographic data for one citation key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BibRecord {
    pub key: String,
    pub title: Option<String>,
    /// Journal or other container
    pub journal: Option<String>,
    pub publisher: Option<String>,
    pub year: Option<String>,
    pub authors: Vec<Person>,
    pub doi: Option<String>,
}

impl BibRecord {
    fn from_item(item: CslItem) -> Self {
        let key = match item.id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        let non_empty = |s: Option<String>| s.filter(|v| !v.trim().is_empty());
        Self {
            key,
            title: non_empty(item.title),
            journal: non_empty(item.container_title),
            publisher: non_empty(item.publisher),
            year: item.issued.and_then(|d| d.year()),
            authors: item.author,
            doi: non_empty(item.doi),
        }
    }
}

/// Read-only lookup of bibliography records by citation key
pub trait BibliographyLookup {
    fn get(&self, citation_key: &str) -> Option<&BibRecord>;
}

/// In-memory library loaded from a CSL-JSON file
#[derive(Debug, Clone, Default)]
pub struct CslLibrary {
    records: HashMap<String, BibRecord>,
}

impl CslLibrary {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
        let library = Self::parse(&content)?;
        debug!("Loaded {} bibliography records from {}", library.len(), path.display());
        Ok(library)
    }

    /// Parse a CSL-JSON array
    pub fn parse(content: &str) -> Result<Self> {
        let items: Vec<CslItem> = serde_json::from_str(content)?;
        Ok(Self::from_records(items.into_iter().map(BibRecord::from_item)))
    }

    pub fn from_records(records: impl IntoIterator<Item = BibRecord>) -> Self {
        let mut map = HashMap::new();
        for record in records {
            if map.contains_key(&record.key) {
                warn!("Duplicate citation key '{}' in bibliography; keeping the first", record.key);
                continue;
            }
            map.insert(record.key.clone(), record);
        }
        Self { records: map }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl BibliographyLookup for CslLibrary {
    fn get(&self, citation_key: &str) -> Option<&BibRecord> {
        self.records.get(citation_key)
    }
}
