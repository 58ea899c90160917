//! NoteDocument - one note file held in memory
//!
//! The structured property mapping is the single source of truth; the text
//! form is produced on demand by [`NoteDocument::serialize`], so the two can
//! never drift apart.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::constants as C;
use crate::error::{Error, Result};
use crate::frontmatter::{self, DecodeWarning, FrontMatter, Properties, PropertyValue};

/// Insertion position for a new property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Ordinal index; values past the end append
    Index(usize),
    End,
}

/// Where [`NoteDocument::write`] puts its output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteMode {
    /// Overwrite the document's own file
    Overwrite,
    /// Sibling path with `_copy` before the extension
    Copy,
    /// Explicit target path
    To(PathBuf),
}

impl WriteMode {
    pub fn from_copy_flag(copy: bool) -> Self {
        if copy {
            WriteMode::Copy
        } else {
            WriteMode::Overwrite
        }
    }
}

/// Recoverable anomaly recorded on a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentWarning {
    Decode(DecodeWarning),
    /// Insert of a label that already exists
    DuplicateProperty { label: String },
}

impl fmt::Display for DocumentWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentWarning::Decode(w) => write!(f, "{}", w),
            DocumentWarning::DuplicateProperty { label } => {
                write!(f, "already has a property named '{}'", label)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct NoteDocument {
    path: PathBuf,
    front_matter: FrontMatter,
    body: Vec<String>,
    /// Terminator of each source line, split at the header/body boundary
    header_endings: Vec<&'static str>,
    body_endings: Vec<&'static str>,
    /// Terminator for lines without a source line and for an unterminated last line
    line_ending: &'static str,
    warnings: Vec<DocumentWarning>,
}

/// Split text into lines, keeping the terminator of each one.
/// An unterminated last line gets an empty terminator.
fn split_lines(text: &str) -> (Vec<String>, Vec<&'static str>) {
    text.split_inclusive('\n')
        .map(|raw| {
            if let Some(line) = raw.strip_suffix("\r\n") {
                (line.to_string(), "\r\n")
            } else if let Some(line) = raw.strip_suffix('\n') {
                (line.to_string(), "\n")
            } else {
                (raw.to_string(), "")
            }
        })
        .unzip()
}

/// Sibling path with the copy marker inserted before the extension
pub fn copy_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}{}.{}", stem, C::COPY_MARKER, ext.to_string_lossy()),
        None => format!("{}{}", stem, C::COPY_MARKER),
    };
    path.with_file_name(name)
}

impl NoteDocument {
    /// Read and decode a note from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
        Ok(Self::parse(path, &text))
    }

    /// Decode a note from text already in memory
    pub fn parse(path: impl Into<PathBuf>, text: &str) -> Self {
        let path = path.into();
        let (lines, mut header_endings) = split_lines(text);
        let line_ending = header_endings
            .iter()
            .copied()
            .find(|e| !e.is_empty())
            .unwrap_or("\n");
        let decoded = frontmatter::decode(&lines);
        let body_endings = header_endings.split_off(lines.len() - decoded.body.len());

        let warnings = decoded
            .warnings
            .into_iter()
            .map(|w| {
                warn!("{}: {}", path.display(), w);
                DocumentWarning::Decode(w)
            })
            .collect();

        Self {
            path,
            front_matter: decoded.front_matter,
            body: decoded.body,
            header_endings,
            body_endings,
            line_ending,
            warnings,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Display name: the file stem
    pub fn identifier(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn properties(&self) -> &Properties {
        &self.front_matter.properties
    }

    pub fn properties_mut(&mut self) -> &mut Properties {
        &mut self.front_matter.properties
    }

    pub fn has_front_matter(&self) -> bool {
        self.front_matter.present
    }

    pub fn body(&self) -> &[String] {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Vec<String> {
        &mut self.body
    }

    pub fn warnings(&self) -> &[DocumentWarning] {
        &self.warnings
    }

    pub fn get(&self, label: &str) -> Option<&PropertyValue> {
        self.front_matter.properties.get(label)
    }

    /// Values of a property as a list; empty if absent
    pub fn values(&self, label: &str) -> Vec<&str> {
        self.get(label).map(PropertyValue::values).unwrap_or_default()
    }

    /// Scalar value of a property, if it holds one
    pub fn scalar(&self, label: &str) -> Option<&str> {
        self.get(label).and_then(PropertyValue::as_scalar)
    }

    /// Case-insensitive membership test against a property's values
    pub fn has_property_value(&self, label: &str, value: &str) -> bool {
        let wanted = value.to_lowercase();
        self.values(label)
            .iter()
            .any(|v| v.to_lowercase() == wanted)
    }

    pub fn set_property(&mut self, label: &str, value: PropertyValue) {
        self.front_matter.properties.set(label, value);
    }

    pub fn remove_property(&mut self, label: &str) -> Option<PropertyValue> {
        self.front_matter.properties.remove(label)
    }

    /// Insert a new property. An existing label is a non-fatal conflict:
    /// a warning is recorded and the mapping stays unchanged.
    pub fn insert_property(&mut self, label: &str, value: PropertyValue, position: Position) -> bool {
        let index = match position {
            Position::Index(i) => i,
            Position::End => usize::MAX,
        };

        if self.front_matter.properties.insert(index, label, value) {
            return true;
        }

        let warning = DocumentWarning::DuplicateProperty {
            label: frontmatter::normalize_label(label),
        };
        warn!("{}: {}", self.path.display(), warning);
        self.warnings.push(warning);
        false
    }

    /// Priority properties first (when present), the rest in prior order
    pub fn reorder_properties<S: AsRef<str>>(&mut self, priority_order: &[S]) {
        self.front_matter.properties.reorder(priority_order);
    }

    /// Full text of the document, ending with one line terminator.
    ///
    /// Header and body lines keep the terminator of the source line at the
    /// same offset within their section.
    pub fn serialize(&self) -> String {
        let lines = frontmatter::encode(&self.front_matter, &self.body);
        let header_len = lines.len() - self.body.len();

        let mut text = String::new();
        for (i, line) in lines.iter().enumerate() {
            let ending = if i < header_len {
                self.header_endings.get(i)
            } else {
                self.body_endings.get(i - header_len)
            };
            text.push_str(line);
            text.push_str(ending.copied().filter(|e| !e.is_empty()).unwrap_or(self.line_ending));
        }
        text
    }

    /// Write the re-encoded document; returns the path written
    pub fn write(&self, mode: WriteMode) -> Result<PathBuf> {
        let target = match mode {
            WriteMode::Overwrite => self.path.clone(),
            WriteMode::Copy => copy_path(&self.path),
            WriteMode::To(path) => path,
        };

        fs::write(&target, self.serialize()).map_err(|e| Error::write(&target, e))?;
        info!("Wrote {}", target.display());
        Ok(target)
    }

    /// Path this document would have under a new identifier
    pub fn path_for(&self, identifier: &str) -> PathBuf {
        let name = match self.path.extension() {
            Some(ext) => format!("{}.{}", identifier, ext.to_string_lossy()),
            None => identifier.to_string(),
        };
        self.path.with_file_name(name)
    }

    fn conflict(&self, new_identifier: &str, target: &Path) -> Error {
        Error::RenameConflict {
            from: self.identifier(),
            to: new_identifier.to_string(),
            reason: format!("'{}' already exists", target.display()),
        }
    }

    /// Write the document under `new_identifier`, leaving its own file in
    /// place. Any existing file at the target is refused.
    pub fn write_as(&self, new_identifier: &str) -> Result<PathBuf> {
        let target = self.path_for(new_identifier);
        if target.exists() {
            return Err(self.conflict(new_identifier, &target));
        }
        self.write(WriteMode::To(target))
    }

    /// Move the document to the path implied by `new_identifier`.
    ///
    /// The new file is written before the old one is removed, so a failure
    /// leaves at least one copy on disk. Renaming onto another existing file
    /// is refused.
    pub fn rename(&mut self, new_identifier: &str) -> Result<PathBuf> {
        let target = self.path_for(new_identifier);
        if target == self.path {
            return Ok(target);
        }

        // A case-only rename on a case-insensitive filesystem finds its own
        // file at the target
        let same_file = target.exists() && is_same_file(&self.path, &target);
        if target.exists() && !same_file {
            return Err(self.conflict(new_identifier, &target));
        }

        if same_file {
            // Write-then-delete would remove the only copy here
            fs::rename(&self.path, &target).map_err(|e| Error::write(&target, e))?;
            fs::write(&target, self.serialize()).map_err(|e| Error::write(&target, e))?;
        } else {
            fs::write(&target, self.serialize()).map_err(|e| Error::write(&target, e))?;
            fs::remove_file(&self.path).map_err(|e| Error::write(&self.path, e))?;
        }

        info!("Renamed {} -> {}", self.path.display(), target.display());
        self.path = target.clone();
        Ok(target)
    }
}

/// Both paths resolve to one file on disk
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (dunce::canonicalize(a), dunce::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
