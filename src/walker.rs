//! Corpus walker
//!
//! Enumerates candidate notes under a vault root. The directory is scanned
//! once up front and sorted, so a run sees a fixed, finite list of paths:
//! nothing is yielded twice and files created or renamed during the run are
//! not picked up.

use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::constants as C;
use crate::document::NoteDocument;
use crate::error::{Error, Result};

/// Selects documents of a given kind by their marker property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindFilter {
    /// Property holding the markers
    pub property: String,
    /// Any one of these values makes a match
    pub markers: Vec<String>,
}

impl Default for KindFilter {
    fn default() -> Self {
        Self {
            property: C::DEFAULT_KIND_PROPERTY.to_string(),
            markers: C::DEFAULT_KIND_MARKERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl KindFilter {
    pub fn matches(&self, doc: &NoteDocument) -> bool {
        self.markers
            .iter()
            .any(|marker| doc.has_property_value(&self.property, marker))
    }
}

/// Which documents to enumerate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerateOptions {
    /// Extension without the dot
    pub extension: String,
    /// Paths (relative to the root, or absolute) whose contents are skipped
    pub exclude: Vec<PathBuf>,
    /// Stop after this many matches
    pub limit: Option<usize>,
    /// Only look at files directly under the root
    pub top_level_only: bool,
}

impl Default for EnumerateOptions {
    fn default() -> Self {
        Self {
            extension: C::DEFAULT_EXTENSION.to_string(),
            exclude: Vec::new(),
            limit: None,
            top_level_only: false,
        }
    }
}

impl EnumerateOptions {
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Same scan without the limit
    pub fn unlimited(&self) -> Self {
        Self {
            limit: None,
            ..self.clone()
        }
    }
}

/// Lazily loaded, pre-scanned sequence of matching documents
pub struct Corpus<'a> {
    paths: std::vec::IntoIter<PathBuf>,
    predicate: Box<dyn Fn(&NoteDocument) -> bool + 'a>,
    remaining: Option<usize>,
}

impl Iterator for Corpus<'_> {
    type Item = Result<NoteDocument>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == Some(0) {
            return None;
        }

        for path in self.paths.by_ref() {
            let doc = match NoteDocument::load(&path) {
                Ok(doc) => doc,
                Err(e) => return Some(Err(e)),
            };

            if !(self.predicate)(&doc) {
                debug!("Skipping {}", path.display());
                continue;
            }

            if let Some(ref mut n) = self.remaining {
                *n -= 1;
            }
            return Some(Ok(doc));
        }

        None
    }
}

/// Resolve exclusion entries against the root
fn resolve_excludes(root: &Path, exclude: &[PathBuf]) -> Vec<PathBuf> {
    exclude
        .iter()
        .map(|p| {
            if p.is_absolute() {
                let absolute = dunce::canonicalize(p).unwrap_or_else(|_| p.clone());
                if absolute.starts_with(root) {
                    return absolute;
                }
            }
            // Otherwise relative to the root, also when written with a
            // leading separator such as "\templates"
            let relative = p
                .to_string_lossy()
                .trim_start_matches(|c| c == '/' || c == '\\')
                .replace('\\', "/");
            let joined = root.join(relative);
            dunce::canonicalize(&joined).unwrap_or(joined)
        })
        .collect()
}

/// Scan `root` for candidate paths, sorted by name
pub fn scan(root: &Path, options: &EnumerateOptions) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::NotFound(root.to_path_buf()));
    }
    let root = dunce::canonicalize(root).map_err(|e| Error::read(root, e))?;
    let excludes = resolve_excludes(&root, &options.exclude);

    let mut walker = WalkDir::new(&root).sort_by_file_name();
    if options.top_level_only {
        walker = walker.max_depth(1);
    }

    let mut paths = Vec::new();
    for entry in walker
        .into_iter()
        .filter_entry(|e| !excludes.iter().any(|x| e.path().starts_with(x)))
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches_ext = entry
            .path()
            .extension()
            .map(|ext| ext.to_string_lossy() == options.extension.as_str())
            .unwrap_or(false);
        if matches_ext {
            paths.push(entry.into_path());
        }
    }

    Ok(paths)
}

/// Enumerate documents under `root` that pass `predicate`.
///
/// Fails with `NotFound` before yielding anything if the root is missing.
pub fn enumerate<'a, F>(root: &Path, options: &EnumerateOptions, predicate: F) -> Result<Corpus<'a>>
where
    F: Fn(&NoteDocument) -> bool + 'a,
{
    let paths = scan(root, options)?;
    Ok(Corpus {
        paths: paths.into_iter(),
        predicate: Box::new(predicate),
        remaining: options.limit,
    })
}

/// First document under `root` whose identifier is `identifier`.
///
/// Exact matches win over case-insensitive ones.
pub fn find(root: &Path, options: &EnumerateOptions, identifier: &str) -> Result<NoteDocument> {
    let wanted = identifier.to_lowercase();
    let mut fallback = None;

    for doc in enumerate(root, &options.unlimited(), |doc| doc.identifier().to_lowercase() == wanted)? {
        let doc = doc?;
        if doc.identifier() == identifier {
            return Ok(doc);
        }
        fallback.get_or_insert(doc);
    }

    fallback.ok_or_else(|| Error::NotFound(root.join(identifier)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const ARTICLE: &str = "---\ntags:\n  - document/article\n---\nbody\n";
    const BOOK: &str = "---\ntags: document/book\n---\nbody\n";
    const OTHER: &str = "---\ntags:\n  - idea\n---\nbody\n";

    fn vault() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("papers/sub")).unwrap();
        fs::create_dir_all(root.join("templates")).unwrap();
        fs::write(root.join("b.md"), ARTICLE).unwrap();
        fs::write(root.join("a.md"), OTHER).unwrap();
        fs::write(root.join("papers/c.md"), BOOK).unwrap();
        fs::write(root.join("papers/sub/d.md"), ARTICLE).unwrap();
        fs::write(root.join("papers/notes.txt"), ARTICLE).unwrap();
        fs::write(root.join("templates/t.md"), ARTICLE).unwrap();
        temp_dir
    }

    fn names(docs: Vec<NoteDocument>) -> Vec<String> {
        docs.iter().map(|d| d.identifier()).collect()
    }

    #[test]
    fn test_enumerate_all_with_extension() {
        let temp_dir = vault();
        let docs: Vec<_> = enumerate(temp_dir.path(), &EnumerateOptions::default(), |_| true)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(names(docs), vec!["a", "b", "c", "d", "t"]);
    }

    #[test]
    fn test_enumerate_kind_and_exclude() {
        let temp_dir = vault();
        let options = EnumerateOptions {
            exclude: vec![PathBuf::from("templates")],
            ..Default::default()
        };
        let kind = KindFilter::default();
        let docs: Vec<_> = enumerate(temp_dir.path(), &options, |d| kind.matches(d))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(names(docs), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_exclude_with_leading_separator() {
        let temp_dir = vault();
        let options = EnumerateOptions {
            exclude: vec![PathBuf::from("\\papers\\sub"), PathBuf::from("/templates")],
            ..Default::default()
        };
        let docs: Vec<_> = enumerate(temp_dir.path(), &options, |_| true)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(names(docs), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_enumerate_limit_counts_matches() {
        let temp_dir = vault();
        let options = EnumerateOptions::default().with_limit(Some(2));
        let kind = KindFilter::default();
        let docs: Vec<_> = enumerate(temp_dir.path(), &options, |d| kind.matches(d))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(names(docs), vec!["b", "c"]);
    }

    #[test]
    fn test_top_level_only() {
        let temp_dir = vault();
        let options = EnumerateOptions {
            top_level_only: true,
            ..Default::default()
        };
        let docs: Vec<_> = enumerate(temp_dir.path(), &options, |_| true)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(names(docs), vec!["a", "b"]);
    }

    #[test]
    fn test_find_by_identifier() {
        let temp_dir = vault();
        let options = EnumerateOptions::default().with_limit(Some(1));
        let doc = find(temp_dir.path(), &options, "d").unwrap();
        assert!(doc.path().ends_with("papers/sub/d.md"));
        assert_eq!(find(temp_dir.path(), &options, "C").unwrap().identifier(), "c");
        assert!(matches!(find(temp_dir.path(), &options, "zz"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let result = enumerate(&temp_dir.path().join("nope"), &EnumerateOptions::default(), |_| true);
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_files_created_during_run_are_not_yielded() {
        let temp_dir = vault();
        let mut corpus = enumerate(temp_dir.path(), &EnumerateOptions::default(), |_| true).unwrap();
        let first = corpus.next().unwrap().unwrap();
        fs::write(temp_dir.path().join("aa.md"), OTHER).unwrap();
        let rest: Vec<_> = corpus.collect::<Result<_>>().unwrap();
        assert_eq!(first.identifier(), "a");
        assert_eq!(names(rest), vec!["b", "c", "d", "t"]);
    }
}
