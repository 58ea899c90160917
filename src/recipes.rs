//! Recipes - per-document transformations for article notes
//!
//! Each recipe edits one [`NoteDocument`] in memory and reports whether it
//! changed anything. Enumeration and writing are left to the batch runner.

use std::collections::BTreeMap;

use log::debug;

use crate::bibliography::{BibRecord, BibliographyLookup};
use crate::constants as C;
use crate::document::{NoteDocument, Position};
use crate::frontmatter::PropertyValue;
use crate::util::sanitize_identifier;

/// Journal fallback when a record has neither journal nor publisher
pub const UNLISTED_JOURNAL: &str = "Unlisted";

/// Position `journal` is inserted at when missing
pub const JOURNAL_POSITION: usize = 2;

// === Helpers ===

/// Citation key of a document, if it has one
pub fn citation_key<'d>(doc: &'d NoteDocument, key_property: &str) -> Option<&'d str> {
    doc.values(key_property)
        .into_iter()
        .next()
        .map(str::trim)
        .filter(|k| !k.is_empty())
}

/// Bibliography record for a document
pub fn record_for<'b>(
    doc: &NoteDocument,
    bibliography: &'b dyn BibliographyLookup,
    key_property: &str,
) -> Option<&'b BibRecord> {
    citation_key(doc, key_property).and_then(|key| bibliography.get(key))
}

fn first_starting_with(values: &[&str], prefix: &str) -> PropertyValue {
    values
        .iter()
        .find(|v| v.starts_with(prefix))
        .map(|v| PropertyValue::Scalar(v.to_string()))
        .unwrap_or(PropertyValue::Empty)
}

/// Tag values as an owned list, whatever shape `tags` has
fn tag_list(doc: &NoteDocument) -> Vec<String> {
    doc.values(C::TAGS_PROPERTY)
        .into_iter()
        .map(String::from)
        .collect()
}

// === Links ===

/// Split the old `links` list into `doi` and `zotero`.
///
/// The first value starting with the DOI URL prefix becomes `doi`, the first
/// starting with `zotero` becomes `zotero`; either is `Empty` when absent.
/// Documents without `links` are left alone.
pub fn split_links(doc: &mut NoteDocument) -> bool {
    let links = match doc.get(C::LINKS_PROPERTY) {
        Some(value) => value.clone(),
        None => return false,
    };
    let values = links.values();

    let doi = first_starting_with(&values, C::DOI_URL_PREFIX);
    let zotero = first_starting_with(&values, C::ZOTERO_URL_PREFIX);

    doc.remove_property(C::LINKS_PROPERTY);
    doc.set_property(C::DOI_PROPERTY, doi);
    doc.set_property(C::ZOTERO_PROPERTY, zotero);
    true
}

/// Point the Zotero select link at the document's citation key
pub fn update_zotero_link(doc: &mut NoteDocument, key_property: &str) -> bool {
    let key = match citation_key(doc, key_property) {
        Some(key) => key.to_string(),
        None => return false,
    };
    let new_link = format!("{}items/@{}", C::ZOTERO_SELECT_PREFIX, key);

    let labels: Vec<String> = doc
        .properties()
        .iter()
        .filter(|p| {
            p.value()
                .values()
                .iter()
                .any(|v| v.contains(C::ZOTERO_SELECT_PREFIX) && *v != new_link)
        })
        .map(|p| p.key().to_string())
        .collect();

    for label in &labels {
        if let Some(value) = doc.properties_mut().get_mut(label) {
            match value {
                PropertyValue::Scalar(v) => *v = new_link.clone(),
                PropertyValue::List(items) => {
                    if let Some(item) = items.iter_mut().find(|i| i.contains(C::ZOTERO_SELECT_PREFIX)) {
                        *item = new_link.clone();
                    }
                }
                PropertyValue::Empty => {}
            }
        }
    }
    !labels.is_empty()
}

// === Tags ===

/// `authors/<parts>` tag for an author name, or `None` if nothing is left
/// after dropping initials.
pub fn author_tag(author: &str) -> Option<String> {
    let lowered = author.to_lowercase();
    let parts: Vec<&str> = lowered
        .split(' ')
        .filter(|part| !part.contains('.'))
        .filter(|part| part.chars().count() > 1)
        .collect();

    if parts.is_empty() {
        return None;
    }
    Some(format!("{}{}", C::AUTHOR_TAG_PREFIX, parts.join("-")))
}

/// Add an author tag for every entry of `authors` not already tagged
pub fn add_author_tags(doc: &mut NoteDocument) -> bool {
    let authors: Vec<String> = doc
        .values(C::AUTHORS_PROPERTY)
        .into_iter()
        .map(String::from)
        .collect();
    if authors.is_empty() {
        return false;
    }

    let mut tags = tag_list(doc);
    let before = tags.len();
    for tag in authors.iter().filter_map(|a| author_tag(a)) {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    if tags.len() == before {
        return false;
    }
    doc.set_property(C::TAGS_PROPERTY, PropertyValue::List(tags));
    true
}

/// Move each given tag to the front of `tags`, in turn
pub fn move_tags_to_start<S: AsRef<str>>(doc: &mut NoteDocument, tags_to_move: &[S]) -> bool {
    let mut tags = match doc.get(C::TAGS_PROPERTY) {
        Some(PropertyValue::List(items)) => items.clone(),
        _ => return false,
    };
    let original = tags.clone();

    for wanted in tags_to_move {
        if let Some(idx) = tags.iter().position(|t| t == wanted.as_ref()) {
            if idx != 0 {
                let tag = tags.remove(idx);
                tags.insert(0, tag);
            }
        }
    }

    if tags == original {
        return false;
    }
    doc.set_property(C::TAGS_PROPERTY, PropertyValue::List(tags));
    true
}

// === Body ===

/// Fold (`-`) or unfold (`+`) abstract callouts.
///
/// Stubs are skipped so their abstract stays visible. Returns the number of
/// callout lines changed.
pub fn toggle_abstract(doc: &mut NoteDocument, open: bool) -> usize {
    if doc.has_property_value(C::TAGS_PROPERTY, C::STUB_TAG) {
        return 0;
    }

    let folded = format!("{}-", &C::ABSTRACT_CALLOUT[2..]);
    let unfolded = format!("{}+", &C::ABSTRACT_CALLOUT[2..]);
    let (from, to) = if open { (folded, unfolded) } else { (unfolded, folded) };

    let mut changed = 0;
    for line in doc.body_mut().iter_mut() {
        if line.starts_with(C::ABSTRACT_CALLOUT) && line.contains(&from) {
            *line = line.replace(&from, &to);
            changed += 1;
        }
    }
    changed
}

// === Bibliography ===

/// Fill `journal` from the bibliography: inserted at position 2 when
/// missing, filled in when present but empty.
pub fn add_journal(
    doc: &mut NoteDocument,
    bibliography: &dyn BibliographyLookup,
    key_property: &str,
) -> bool {
    let journal = match doc.get(C::JOURNAL_PROPERTY) {
        Some(value) if !value.is_empty() => return false,
        _ => record_for(doc, bibliography, key_property)
            .and_then(|r| r.journal.clone())
            .map(PropertyValue::Scalar)
            .unwrap_or(PropertyValue::Empty),
    };

    if doc.get(C::JOURNAL_PROPERTY).is_some() {
        if journal.is_empty() {
            return false;
        }
        doc.set_property(C::JOURNAL_PROPERTY, journal);
        return true;
    }

    doc.insert_property(C::JOURNAL_PROPERTY, journal, Position::Index(JOURNAL_POSITION))
}

/// Identifier derived from a citation:
/// `<year> <first author>[; <last author>] (<journal>)`.
///
/// The journal is abbreviated through `abbreviations`, falling back to the
/// publisher and then to `Unlisted`. Returns `None` without year or authors.
pub fn citation_identifier(
    record: &BibRecord,
    abbreviations: &BTreeMap<String, String>,
) -> Option<String> {
    let year = record.year.as_deref()?;

    let last_names: Vec<&str> = record.authors.iter().filter_map(|a| a.last_name()).collect();
    let mut authors = last_names.first()?.to_string();
    if last_names.len() > 1 {
        authors.push_str("; ");
        authors.push_str(last_names[last_names.len() - 1]);
    }

    let journal = match (&record.journal, &record.publisher) {
        (Some(journal), _) => abbreviations
            .get(journal)
            .cloned()
            .unwrap_or_else(|| journal.clone()),
        (None, Some(publisher)) => publisher.clone(),
        (None, None) => UNLISTED_JOURNAL.to_string(),
    };

    let identifier = format!("{} {} ({})", year, authors, sanitize_identifier(&journal));
    Some(sanitize_identifier(&identifier))
}

/// True if the document's citation key has a bibliography record
pub fn has_bibliography(
    doc: &NoteDocument,
    bibliography: &dyn BibliographyLookup,
    key_property: &str,
) -> bool {
    let found = record_for(doc, bibliography, key_property).is_some();
    if !found {
        debug!("No bibliography record for {}", doc.path().display());
    }
    found
}

/// Candidate for the DOI fetch: `doi` present but empty
pub fn needs_doi(doc: &NoteDocument) -> bool {
    matches!(doc.get(C::DOI_PROPERTY), Some(PropertyValue::Empty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bibliography::{CslLibrary, Person};

    const SCENARIO_A: &str = "---\ntags:\n  - paper\n  - stub\nlinks:\n  - https://doi.org/10.1/xyz\n  - zotero://select/items/@Key\n---\nbody\n";

    fn doc(text: &str) -> NoteDocument {
        NoteDocument::parse("/vault/Note.md", text)
    }

    fn library() -> CslLibrary {
        CslLibrary::from_records(vec![
            BibRecord {
                key: "smith2020".into(),
                journal: Some("Journal of Things".into()),
                year: Some("2020".into()),
                authors: vec![
                    Person::new("Smith", "Jane"),
                    Person::new("Lee", "K."),
                    Person::new("Doe", "J."),
                ],
                ..Default::default()
            },
            BibRecord {
                key: "book2019".into(),
                publisher: Some("Press: Inc".into()),
                year: Some("2019".into()),
                authors: vec![Person::new("Solo", "Han")],
                ..Default::default()
            },
        ])
    }

    #[test]
    fn test_split_links_scenario_a() {
        let mut d = doc(SCENARIO_A);
        assert!(split_links(&mut d));
        assert_eq!(d.get("links"), None);
        assert_eq!(d.scalar("doi"), Some("https://doi.org/10.1/xyz"));
        assert_eq!(d.scalar("zotero"), Some("zotero://select/items/@Key"));
        assert_eq!(d.body(), &["body".to_string()]);
        assert_eq!(
            d.serialize(),
            "---\ntags:\n  - paper\n  - stub\ndoi: https://doi.org/10.1/xyz\nzotero: zotero://select/items/@Key\n---\nbody\n"
        );
    }

    #[test]
    fn test_split_links_missing_values_and_absent_property() {
        let mut d = doc("---\nlinks:\n  - https://example.com\n---\n");
        assert!(split_links(&mut d));
        assert_eq!(d.get("doi"), Some(&PropertyValue::Empty));
        assert_eq!(d.get("zotero"), Some(&PropertyValue::Empty));

        let mut plain = doc("---\ndoi: x\n---\n");
        assert!(!split_links(&mut plain));
    }

    #[test]
    fn test_update_zotero_link() {
        let mut d = doc("---\ncitation key: smith2020\nzotero: zotero://select/library/items/ABCD\n---\n");
        assert!(update_zotero_link(&mut d, "citation key"));
        assert_eq!(d.scalar("zotero"), Some("zotero://select/items/@smith2020"));
        assert!(!update_zotero_link(&mut d, "citation key"));

        let mut list = doc("---\ncitation key: k\nlinks:\n  - https://doi.org/1\n  - zotero://select/x\n---\n");
        assert!(update_zotero_link(&mut list, "citation key"));
        assert_eq!(list.values("links"), vec!["https://doi.org/1", "zotero://select/items/@k"]);
    }

    #[test]
    fn test_author_tag() {
        assert_eq!(author_tag("Jane A. Smith"), Some("authors/jane-smith".to_string()));
        assert_eq!(author_tag("J. R. R. Tolkien"), Some("authors/tolkien".to_string()));
        assert_eq!(author_tag("Ludwig van Beethoven"), Some("authors/ludwig-van-beethoven".to_string()));
        assert_eq!(author_tag("J. K"), None);
    }

    #[test]
    fn test_add_author_tags() {
        let mut d = doc("---\ntags:\n  - paper\n  - authors/jane-smith\nauthors:\n  - Jane Smith\n  - Bob Q. Lee\n---\n");
        assert!(add_author_tags(&mut d));
        assert_eq!(d.values("tags"), vec!["paper", "authors/jane-smith", "authors/bob-lee"]);
        assert!(!add_author_tags(&mut d));

        let mut scalar = doc("---\ntags: paper\nauthors: Ann Other\n---\n");
        assert!(add_author_tags(&mut scalar));
        assert_eq!(scalar.values("tags"), vec!["paper", "authors/ann-other"]);
    }

    #[test]
    fn test_move_tags_to_start() {
        let mut d = doc("---\ntags:\n  - stub\n  - idea\n  - document/article\n---\n");
        assert!(move_tags_to_start(&mut d, &["document/article"]));
        assert_eq!(d.values("tags"), vec!["document/article", "stub", "idea"]);
        assert!(!move_tags_to_start(&mut d, &["document/article", "missing"]));
    }

    #[test]
    fn test_toggle_abstract() {
        let text = "---\ntags:\n  - paper\n---\n> [!my-abstract]- Abstract\n> text\n";
        let mut d = doc(text);
        assert_eq!(toggle_abstract(&mut d, true), 1);
        assert_eq!(d.body()[0], "> [!my-abstract]+ Abstract");
        assert_eq!(toggle_abstract(&mut d, true), 0);
        assert_eq!(toggle_abstract(&mut d, false), 1);
        assert_eq!(d.serialize(), text);

        let mut stub = doc(SCENARIO_A.replace("body", "> [!my-abstract]- A").as_str());
        assert_eq!(toggle_abstract(&mut stub, true), 0);
    }

    #[test]
    fn test_add_journal_inserts_at_position_two() {
        let lib = library();
        let mut d = doc("---\ntitle: On Things\ncitation key: smith2020\ntags:\n  - paper\n---\n");
        assert!(add_journal(&mut d, &lib, "citation key"));
        assert_eq!(d.properties().keys(), vec!["title", "citation key", "journal", "tags"]);
        assert_eq!(d.scalar("journal"), Some("Journal of Things"));
        assert!(!add_journal(&mut d, &lib, "citation key"));
    }

    #[test]
    fn test_add_journal_fills_empty_value() {
        let lib = library();
        let mut d = doc("---\njournal:\ncitation key: smith2020\n---\n");
        assert!(add_journal(&mut d, &lib, "citation key"));
        assert_eq!(d.properties().keys(), vec!["journal", "citation key"]);
        assert_eq!(d.scalar("journal"), Some("Journal of Things"));

        let mut unknown = doc("---\njournal:\ncitation key: nope\n---\n");
        assert!(!add_journal(&mut unknown, &lib, "citation key"));
    }

    #[test]
    fn test_citation_identifier() {
        let lib = library();
        let abbreviations = BTreeMap::from([("Journal of Things".to_string(), "J Things".to_string())]);

        let smith = lib.get("smith2020").unwrap();
        assert_eq!(
            citation_identifier(smith, &abbreviations).as_deref(),
            Some("2020 Smith; Doe (J Things)")
        );
        assert_eq!(
            citation_identifier(smith, &BTreeMap::new()).as_deref(),
            Some("2020 Smith; Doe (Journal of Things)")
        );

        let book = lib.get("book2019").unwrap();
        assert_eq!(
            citation_identifier(book, &abbreviations).as_deref(),
            Some("2019 Solo (Press Inc)")
        );

        let bare = BibRecord {
            key: "x".into(),
            year: Some("2001".into()),
            authors: vec![Person::new("Nobody", "A")],
            ..Default::default()
        };
        assert_eq!(citation_identifier(&bare, &abbreviations).as_deref(), Some("2001 Nobody (Unlisted)"));

        let no_year = BibRecord { year: None, ..bare.clone() };
        assert_eq!(citation_identifier(&no_year, &abbreviations), None);
    }

    #[test]
    fn test_bibliography_checks() {
        let lib = library();
        assert!(has_bibliography(&doc("---\ncitation key: smith2020\n---\n"), &lib, "citation key"));
        assert!(!has_bibliography(&doc("---\ncitation key: other\n---\n"), &lib, "citation key"));
        assert!(!has_bibliography(&doc("no front matter\n"), &lib, "citation key"));

        assert!(needs_doi(&doc("---\ndoi:\n---\n")));
        assert!(!needs_doi(&doc("---\ndoi: https://doi.org/1\n---\n")));
        assert!(!needs_doi(&doc("---\ntitle: x\n---\n")));
    }
}
