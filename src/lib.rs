pub mod batch;
pub mod bibliography;
pub mod cli;
pub mod config;
pub mod constants;
pub mod document;
pub mod error;
pub mod frontmatter;
pub mod lookup;
pub mod recipes;
pub mod rename;
pub mod util;
pub mod walker;

pub use batch::{BatchReport, BatchRunner};
pub use bibliography::{BibRecord, BibliographyLookup, CslLibrary};
pub use cli::{Cli, Command};
pub use config::VaultConfig;
pub use document::{NoteDocument, Position, WriteMode};
pub use error::{Error, Result};
pub use frontmatter::{FrontMatter, Properties, PropertyValue};
pub use lookup::{BetterBibtexClient, ExternalReferenceLookup, FetchReport};
pub use rename::{RenameLedger, RenameReport};
pub use walker::{EnumerateOptions, KindFilter};
