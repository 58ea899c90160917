//! Constants for papernote
//!
//! Delimiters and markers of the front-matter dialect, file naming markers,
//! environment variable names and configuration defaults.

// === Front Matter Dialect ===

/// Line that opens and closes the front matter block
pub const DELIMITER: &str = "---";

/// Character that terminates a property label
pub const KEY_SEPARATOR: char = ':';

/// Separator between a label and its inline value
pub const INLINE_SEPARATOR: &str = ": ";

/// Marker in front of a list item
pub const LIST_MARKER: &str = "- ";

/// Prefix written before each list item when encoding
pub const LIST_ITEM_PREFIX: &str = "  - ";

// === Files ===

/// Default extension of note files (without dot)
pub const DEFAULT_EXTENSION: &str = "md";

/// Marker inserted before the extension when writing a copy
pub const COPY_MARKER: &str = "_copy";

/// Characters that may not appear in an identifier used as a filename
pub const ILLEGAL_IDENTIFIER_CHARS: &[char] = &['*', '"', '\\', '/', '<', '>', ':', '|', '?'];

// === Configuration ===

/// Environment variable pointing at the config file
pub const ENV_CONFIG: &str = "PAPERNOTE_CONFIG";

/// Environment variable overriding the vault root
pub const ENV_VAULT: &str = "PAPERNOTE_VAULT";

/// Directory under the user config dir holding the config file
pub const CONFIG_DIR_NAME: &str = "papernote";

/// Config filename
pub const CONFIG_FILENAME: &str = "config.yaml";

/// Property holding kind markers
pub const DEFAULT_KIND_PROPERTY: &str = "tags";

/// Tags marking a note as an article
pub const DEFAULT_KIND_MARKERS: &[&str] = &["document/article", "document/book"];

/// Property holding the citation key
pub const DEFAULT_CITATION_KEY_PROPERTY: &str = "citation key";

/// Better BibTeX JSON-RPC endpoint of a local Zotero
pub const DEFAULT_BETTER_BIBTEX_URL: &str = "http://localhost:23119/better-bibtex/json-rpc";

/// Default cap on concurrent lookups
pub const DEFAULT_WORKERS: usize = 8;

// === Property Names ===

pub const TAGS_PROPERTY: &str = "tags";
pub const LINKS_PROPERTY: &str = "links";
pub const DOI_PROPERTY: &str = "doi";
pub const ZOTERO_PROPERTY: &str = "zotero";
pub const AUTHORS_PROPERTY: &str = "authors";
pub const JOURNAL_PROPERTY: &str = "journal";

// === Value Prefixes ===

pub const DOI_URL_PREFIX: &str = "https://doi.org/";
pub const ZOTERO_URL_PREFIX: &str = "zotero";
pub const ZOTERO_SELECT_PREFIX: &str = "zotero://select/";

/// Tag that keeps a note's abstract unfolded
pub const STUB_TAG: &str = "stub";

/// Prefix of generated author tags
pub const AUTHOR_TAG_PREFIX: &str = "authors/";

/// Abstract callout header
pub const ABSTRACT_CALLOUT: &str = "> [!my-abstract]";
