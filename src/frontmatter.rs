//! Front matter codec
//!
//! Converts the line sequence of a note into an ordered property mapping plus
//! an opaque body, and back. Supports exactly one restricted dialect:
//!
//! ```text
//! ---
//! title: Some scalar
//! tags:
//!   - paper
//!   - stub
//! doi:
//! ---
//! body lines...
//! ```
//!
//! Malformed headers are not errors: a document whose first line is not the
//! delimiter, or whose header is never closed, simply has no front matter.

use std::fmt;

use crate::constants as C;

/// Value held by a single property
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    /// Label present with no value
    Empty,
    /// Single inline value
    Scalar(String),
    /// Dash-prefixed values on the following lines
    List(Vec<String>),
}

impl PropertyValue {
    /// Values as a slice-like list; a scalar counts as a one-element set.
    pub fn values(&self) -> Vec<&str> {
        match self {
            PropertyValue::Empty => Vec::new(),
            PropertyValue::Scalar(s) => vec![s.as_str()],
            PropertyValue::List(items) => items.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, PropertyValue::Empty)
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            PropertyValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            PropertyValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Build a value from free text, treating blank text as `Empty`.
    pub fn scalar_or_empty(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.trim().is_empty() {
            PropertyValue::Empty
        } else {
            PropertyValue::Scalar(text)
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Empty => Ok(()),
            PropertyValue::Scalar(s) => write!(f, "{}", s),
            PropertyValue::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

/// Normalize a label for storage and comparison
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// One labelled entry of the front matter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    key: String,
    label: String,
    value: PropertyValue,
    /// Literal lines this property was decoded from; cleared on mutation.
    source: Option<Vec<String>>,
}

impl Property {
    /// Create a property that has no textual origin (always canonically encoded)
    pub fn new(label: &str, value: PropertyValue) -> Self {
        let key = normalize_label(label);
        Self {
            label: key.clone(),
            key,
            value,
            source: None,
        }
    }

    /// Lower-cased lookup key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Label as displayed: original casing while unmodified, else the key
    pub fn label(&self) -> &str {
        if self.source.is_some() {
            &self.label
        } else {
            &self.key
        }
    }

    pub fn value(&self) -> &PropertyValue {
        &self.value
    }

    /// Mutable access; the property is considered modified afterwards.
    pub fn value_mut(&mut self) -> &mut PropertyValue {
        self.source = None;
        &mut self.value
    }

    pub fn set_value(&mut self, value: PropertyValue) {
        *self.value_mut() = value;
    }

    pub fn is_modified(&self) -> bool {
        self.source.is_none()
    }

    fn encode_into(&self, out: &mut Vec<String>) {
        if let Some(ref lines) = self.source {
            out.extend(lines.iter().cloned());
            return;
        }

        match &self.value {
            PropertyValue::Empty => out.push(format!("{}{}", self.key, C::INLINE_SEPARATOR)),
            PropertyValue::Scalar(v) => {
                out.push(format!("{}{}{}", self.key, C::INLINE_SEPARATOR, v))
            }
            PropertyValue::List(items) => {
                out.push(format!("{}{}", self.key, C::KEY_SEPARATOR));
                for item in items {
                    out.push(format!("{}{}", C::LIST_ITEM_PREFIX, item));
                }
            }
        }
    }
}

/// Ordered mapping from normalized label to property
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: Vec<Property>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.entries.iter()
    }

    /// Normalized keys in mapping order
    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|p| p.key()).collect()
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        let key = normalize_label(label);
        self.entries.iter().position(|p| p.key == key)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.position(label).is_some()
    }

    pub fn property(&self, label: &str) -> Option<&Property> {
        self.position(label).map(|i| &self.entries[i])
    }

    pub fn get(&self, label: &str) -> Option<&PropertyValue> {
        self.property(label).map(Property::value)
    }

    /// Mutable value access; marks the property as modified.
    pub fn get_mut(&mut self, label: &str) -> Option<&mut PropertyValue> {
        let idx = self.position(label)?;
        Some(self.entries[idx].value_mut())
    }

    /// Replace the value of an existing property in place, or append a new one.
    pub fn set(&mut self, label: &str, value: PropertyValue) {
        match self.position(label) {
            Some(idx) => self.entries[idx].set_value(value),
            None => self.entries.push(Property::new(label, value)),
        }
    }

    /// Insert at `index` (clamped to the end). Returns false if the label exists.
    pub fn insert(&mut self, index: usize, label: &str, value: PropertyValue) -> bool {
        if self.contains(label) {
            return false;
        }
        let index = index.min(self.entries.len());
        self.entries.insert(index, Property::new(label, value));
        true
    }

    pub fn remove(&mut self, label: &str) -> Option<PropertyValue> {
        let idx = self.position(label)?;
        Some(self.entries.remove(idx).value)
    }

    /// Move the named properties (when present) to the front, in the given
    /// order; all others keep their relative order behind them.
    pub fn reorder<S: AsRef<str>>(&mut self, priority: &[S]) {
        let mut remaining = std::mem::take(&mut self.entries);
        let mut ordered = Vec::with_capacity(remaining.len());

        for label in priority {
            let key = normalize_label(label.as_ref());
            if let Some(idx) = remaining.iter().position(|p| p.key == key) {
                ordered.push(remaining.remove(idx));
            }
        }
        ordered.extend(remaining);
        self.entries = ordered;
    }

    fn push_decoded(&mut self, property: Property) -> Option<usize> {
        match self.position(&property.key) {
            Some(idx) => {
                // Later definition wins but keeps the first position
                self.entries[idx].set_value(property.value);
                Some(idx)
            }
            None => {
                self.entries.push(property);
                None
            }
        }
    }
}

/// Parsed front matter block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontMatter {
    /// Whether the source had a delimited header
    pub present: bool,
    /// Literal closing delimiter line
    closing: String,
    pub properties: Properties,
}

impl Default for FrontMatter {
    fn default() -> Self {
        Self {
            present: false,
            closing: C::DELIMITER.to_string(),
            properties: Properties::new(),
        }
    }
}

impl FrontMatter {
    /// Whether encoding emits a delimited header
    pub fn emits_header(&self) -> bool {
        self.present || !self.properties.is_empty()
    }
}

/// Recoverable anomaly found while decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeWarning {
    /// A list item followed a property that already holds a scalar
    ValueShapeConflict { label: String, line: String },
    /// A list item appeared before any label
    OrphanContinuation { line: String },
    /// The same label was defined twice
    DuplicateLabel { label: String },
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeWarning::ValueShapeConflict { label, line } => {
                write!(f, "multiple values for non-list property '{}', dropped {:?}", label, line)
            }
            DecodeWarning::OrphanContinuation { line } => {
                write!(f, "value line outside any property, dropped {:?}", line)
            }
            DecodeWarning::DuplicateLabel { label } => {
                write!(f, "property '{}' defined more than once", label)
            }
        }
    }
}

/// Result of decoding a document's lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded {
    pub front_matter: FrontMatter,
    pub body: Vec<String>,
    pub warnings: Vec<DecodeWarning>,
}

/// Whether a flat property line starts a new property
fn is_key_line(line: &str) -> bool {
    line.ends_with(C::KEY_SEPARATOR) || line.contains(C::INLINE_SEPARATOR)
}

/// Strip indentation and the list marker from a continuation line
fn list_item(line: &str) -> &str {
    let trimmed = line.trim_start();
    match trimmed.strip_prefix(C::LIST_MARKER) {
        Some(rest) => rest,
        None if trimmed == C::LIST_MARKER.trim_end() => "",
        None => trimmed,
    }
}

/// Split raw lines into front matter and body
pub fn decode<S: AsRef<str>>(lines: &[S]) -> Decoded {
    let no_front_matter = || Decoded {
        body: lines.iter().map(|l| l.as_ref().to_string()).collect(),
        ..Decoded::default()
    };

    match lines.first() {
        Some(first) if first.as_ref() == C::DELIMITER => {}
        _ => return no_front_matter(),
    }

    let closing_idx = match lines
        .iter()
        .skip(1)
        .position(|l| l.as_ref().starts_with(C::DELIMITER))
    {
        Some(offset) => offset + 1,
        None => return no_front_matter(),
    };

    let mut properties = Properties::new();
    let mut warnings = Vec::new();
    let mut current: Option<usize> = None;

    for line in &lines[1..closing_idx] {
        let line = line.as_ref();

        if is_key_line(line) {
            let (label, rest) = line.split_once(C::KEY_SEPARATOR).unwrap_or((line, ""));
            let value = PropertyValue::scalar_or_empty(rest.trim_start());
            let property = Property {
                key: normalize_label(label),
                label: label.to_string(),
                value,
                source: Some(vec![line.to_string()]),
            };
            let key = property.key.clone();
            match properties.push_decoded(property) {
                Some(idx) => {
                    warnings.push(DecodeWarning::DuplicateLabel { label: key });
                    current = Some(idx);
                }
                None => current = Some(properties.len() - 1),
            }
            continue;
        }

        let idx = match current {
            Some(idx) => idx,
            None => {
                warnings.push(DecodeWarning::OrphanContinuation { line: line.to_string() });
                continue;
            }
        };

        let property = &mut properties.entries[idx];
        let item = list_item(line).to_string();
        match property.value {
            PropertyValue::Scalar(_) => {
                warnings.push(DecodeWarning::ValueShapeConflict {
                    label: property.key.clone(),
                    line: line.to_string(),
                });
                continue;
            }
            PropertyValue::Empty => property.value = PropertyValue::List(vec![item]),
            PropertyValue::List(ref mut items) => items.push(item),
        }
        if let Some(ref mut source) = property.source {
            source.push(line.to_string());
        }
    }

    Decoded {
        front_matter: FrontMatter {
            present: true,
            closing: lines[closing_idx].as_ref().to_string(),
            properties,
        },
        body: lines[closing_idx + 1..]
            .iter()
            .map(|l| l.as_ref().to_string())
            .collect(),
        warnings,
    }
}

/// Reassemble lines from front matter and body
pub fn encode<S: AsRef<str>>(front_matter: &FrontMatter, body: &[S]) -> Vec<String> {
    let mut out = Vec::with_capacity(front_matter.properties.len() + body.len() + 2);

    if front_matter.emits_header() {
        out.push(C::DELIMITER.to_string());
        for property in front_matter.properties.iter() {
            property.encode_into(&mut out);
        }
        out.push(front_matter.closing.clone());
    }

    out.extend(body.iter().map(|l| l.as_ref().to_string()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(String::from).collect()
    }

    fn round_trip(text: &str) -> Vec<String> {
        let decoded = decode(&lines(text));
        encode(&decoded.front_matter, &decoded.body)
    }

    #[test]
    fn test_round_trip_all_variants() {
        let text = "---\ntitle: A Paper\ndoi: \ntags:\n  - paper\n  - stub\n---\n# Heading\n\nbody";
        assert_eq!(round_trip(text), lines(text));
    }

    #[test]
    fn test_round_trip_preserves_casing_and_spacing() {
        let text = "---\nTitle:  Spaced\nTags:\n- flat\n  - indented\nEmpty:\n---\nbody";
        assert_eq!(round_trip(text), lines(text));
    }

    #[test]
    fn test_decode_values() {
        let decoded = decode(&lines("---\nTitle: A Paper\ndoi: \ntags:\n  - paper\n  - stub\n---\nbody"));
        let props = &decoded.front_matter.properties;
        assert_eq!(props.keys(), vec!["title", "doi", "tags"]);
        assert_eq!(props.get("title"), Some(&PropertyValue::Scalar("A Paper".to_string())));
        assert_eq!(props.get("DOI"), Some(&PropertyValue::Empty));
        assert_eq!(
            props.get("tags"),
            Some(&PropertyValue::List(vec!["paper".to_string(), "stub".to_string()]))
        );
        assert_eq!(decoded.body, vec!["body".to_string()]);
        assert!(decoded.warnings.is_empty());
    }

    #[test]
    fn test_no_front_matter() {
        let text = "body only, no leading \"---\"\nsecond line";
        let decoded = decode(&lines(text));
        assert!(!decoded.front_matter.present);
        assert!(decoded.front_matter.properties.is_empty());
        assert_eq!(decoded.body, lines(text));
        assert_eq!(encode(&decoded.front_matter, &decoded.body), lines(text));
    }

    #[test]
    fn test_unterminated_header_is_body() {
        let text = "---\ntitle: x\nno closing";
        let decoded = decode(&lines(text));
        assert!(!decoded.front_matter.present);
        assert_eq!(decoded.body, lines(text));
    }

    #[test]
    fn test_empty_input() {
        let decoded = decode::<String>(&[]);
        assert!(decoded.body.is_empty());
        assert!(encode(&decoded.front_matter, &decoded.body).is_empty());
    }

    #[test]
    fn test_empty_header_kept() {
        let text = "---\n---\nbody";
        let decoded = decode(&lines(text));
        assert!(decoded.front_matter.present);
        assert_eq!(round_trip(text), lines(text));
    }

    #[test]
    fn test_closing_delimiter_text_preserved() {
        let text = "---\ntitle: x\n-----\nbody";
        assert_eq!(round_trip(text), lines(text));
    }

    #[test]
    fn test_continuation_under_scalar_dropped() {
        let decoded = decode(&lines("---\ntitle: x\n  - stray\ntags:\n  - a\n---"));
        assert_eq!(decoded.warnings.len(), 1);
        assert!(matches!(
            decoded.warnings[0],
            DecodeWarning::ValueShapeConflict { ref label, .. } if label == "title"
        ));
        let props = &decoded.front_matter.properties;
        assert_eq!(props.get("title"), Some(&PropertyValue::Scalar("x".to_string())));
        assert_eq!(props.get("tags"), Some(&PropertyValue::List(vec!["a".to_string()])));
        assert_eq!(
            encode(&decoded.front_matter, &decoded.body),
            lines("---\ntitle: x\ntags:\n  - a\n---")
        );
    }

    #[test]
    fn test_orphan_continuation_dropped() {
        let decoded = decode(&lines("---\n  - orphan\ntitle: x\n---"));
        assert_eq!(
            decoded.warnings,
            vec![DecodeWarning::OrphanContinuation { line: "  - orphan".to_string() }]
        );
        assert_eq!(decoded.front_matter.properties.len(), 1);
    }

    #[test]
    fn test_url_values_are_not_keys() {
        let decoded = decode(&lines("---\nlinks:\n  - https://doi.org/10.1/xyz\n  - zotero://select/items/@Key\n---"));
        assert_eq!(
            decoded.front_matter.properties.get("links"),
            Some(&PropertyValue::List(vec![
                "https://doi.org/10.1/xyz".to_string(),
                "zotero://select/items/@Key".to_string(),
            ]))
        );
    }

    #[test]
    fn test_modified_property_uses_canonical_form() {
        let mut decoded = decode(&lines("---\nTitle:  Old\nTags:\n- a\n---"));
        decoded
            .front_matter
            .properties
            .set("title", PropertyValue::Scalar("New".to_string()));
        if let Some(PropertyValue::List(items)) = decoded.front_matter.properties.get_mut("tags") {
            items.push("b".to_string());
        }
        assert_eq!(
            encode(&decoded.front_matter, &decoded.body),
            lines("---\ntitle: New\ntags:\n  - a\n  - b\n---")
        );
    }

    #[test]
    fn test_canonical_encoding_round_trips() {
        let mut fm = FrontMatter::default();
        fm.properties.set("doi", PropertyValue::Empty);
        fm.properties.set("title", PropertyValue::Scalar("T".to_string()));
        fm.properties.set("tags", PropertyValue::List(vec!["a".to_string(), "b".to_string()]));
        let encoded = encode(&fm, &["body"]);
        assert_eq!(encoded, lines("---\ndoi: \ntitle: T\ntags:\n  - a\n  - b\n---\nbody"));

        let decoded = decode(&encoded);
        assert_eq!(decoded.front_matter.properties.get("tags"), fm.properties.get("tags"));
        assert_eq!(encode(&decoded.front_matter, &decoded.body), encoded);
    }

    #[test]
    fn test_duplicate_label_later_wins() {
        let decoded = decode(&lines("---\ntitle: a\nyear: 2020\ntitle: b\n---"));
        assert_eq!(decoded.front_matter.properties.keys(), vec!["title", "year"]);
        assert_eq!(
            decoded.front_matter.properties.get("title"),
            Some(&PropertyValue::Scalar("b".to_string()))
        );
        assert_eq!(decoded.warnings.len(), 1);
    }

    #[test]
    fn test_reorder_properties() {
        let mut decoded = decode(&lines("---\nauthors:\n  - A\ntitle: T\ntags:\n  - x\ndoi: d\n---"));
        decoded.front_matter.properties.reorder(&["title", "tags"]);
        assert_eq!(
            decoded.front_matter.properties.keys(),
            vec!["title", "tags", "authors", "doi"]
        );
        assert_eq!(
            encode(&decoded.front_matter, &decoded.body),
            lines("---\ntitle: T\ntags:\n  - x\nauthors:\n  - A\ndoi: d\n---")
        );
    }

    #[test]
    fn test_reorder_idempotent_and_skips_missing() {
        let mut props = Properties::new();
        for label in ["b", "a", "c"] {
            props.set(label, PropertyValue::Empty);
        }
        props.reorder(&["missing", "c", "a"]);
        let once = props.clone();
        props.reorder(&["missing", "c", "a"]);
        assert_eq!(props, once);
        assert_eq!(props.keys(), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_insert_conflict() {
        let mut props = Properties::new();
        assert!(props.insert(0, "Title", PropertyValue::Empty));
        assert!(!props.insert(0, "title", PropertyValue::Scalar("x".to_string())));
        assert_eq!(props.get("title"), Some(&PropertyValue::Empty));
    }

    #[test]
    fn test_values_view() {
        assert!(PropertyValue::Empty.values().is_empty());
        assert_eq!(PropertyValue::Scalar("x".to_string()).values(), vec!["x"]);
        assert_eq!(
            PropertyValue::List(vec!["a".to_string(), "b".to_string()]).values(),
            vec!["a", "b"]
        );
    }
}
