use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// papernote - batch editing for a vault of paper notes
///
/// # Quick Reference
///
/// ## Inspect
///
/// ```bash
/// papernote list                      # Article notes in the vault
/// papernote list --all                # Every note
/// papernote --json list               # JSON array of paths
/// papernote show "2020 Smith"         # Properties of one note
/// papernote check-bib                 # Articles without a bibliography record
/// ```
///
/// ## Edit properties
///
/// ```bash
/// papernote split-links               # links -> doi + zotero
/// papernote reorder title tags        # Move properties to the front
/// papernote author-tags               # authors -> authors/<name> tags
/// papernote move-tags document/article
/// papernote zotero-links              # zotero://select/items/@<citation key>
/// papernote add-journal               # journal from the bibliography
/// papernote abstract --close          # Fold abstract callouts
/// ```
///
/// ## Rename
///
/// ```bash
/// papernote rename Smith2020 Smith2020b   # Rename one note, fix [[links]]
/// papernote rename-by-citation            # "<year> <authors> (<journal>)"
/// ```
///
/// ## Identifiers
///
/// ```bash
/// papernote fetch-dois                # Fill empty doi from Better BibTeX
/// ```
///
/// ## Global Options
///
/// ```bash
/// papernote --dry-run split-links     # Transform without writing
/// papernote --copy split-links        # Write Note_copy.md next to Note.md
/// papernote --limit 5 author-tags     # Stop after 5 matching notes
/// papernote -vv reorder title         # Debug logging (or RUST_LOG=debug)
/// ```
///
/// ## Environment Variables
///
/// - `PAPERNOTE_CONFIG`: config file (default: <config dir>/papernote/config.yaml)
/// - `PAPERNOTE_VAULT`: vault root, overrides the config file
///
#[derive(Parser, Debug)]
#[command(name = "papernote")]
#[command(version)]
#[command(about = "Batch front-matter editing and link-safe renaming for paper notes")]
pub struct Cli {
    /// Config file (default: $PAPERNOTE_CONFIG or the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Vault root directory (overrides the config file)
    #[arg(long, global = true, value_name = "PATH")]
    pub vault: Option<PathBuf>,

    /// Stop after this many matching notes
    #[arg(short = 'n', long, global = true, value_name = "N")]
    pub limit: Option<usize>,

    /// Write to <name>_copy.md instead of overwriting
    #[arg(long, global = true)]
    pub copy: bool,

    /// Run transformations without writing anything
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Output in JSON format (for scripting)
    #[arg(short = 'j', long, global = true)]
    pub json: bool,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List article notes
    #[command(alias = "ls")]
    List {
        /// Include every note, not only articles
        #[arg(short, long)]
        all: bool,
    },

    /// Print the properties of a note
    #[command(alias = "p")]
    Show {
        /// Note identifier (filename without extension)
        note: String,
    },

    /// Move the named properties to the front
    Reorder {
        /// Property labels in the desired order
        #[arg(required = true)]
        labels: Vec<String>,
    },

    /// Split the links property into doi and zotero
    SplitLinks,

    /// Tag articles with their authors' names
    AuthorTags,

    /// Fold or unfold abstract callouts
    Abstract {
        /// Unfold the callouts
        #[arg(long, conflicts_with = "close", required_unless_present = "close")]
        open: bool,

        /// Fold the callouts
        #[arg(long)]
        close: bool,
    },

    /// Move tags to the start of the tags list
    MoveTags {
        /// Tags to move; the last one ends up first
        #[arg(required = true)]
        tags: Vec<String>,
    },

    /// Point zotero links at the citation key
    ZoteroLinks,

    /// Add the journal property from the bibliography
    AddJournal,

    /// Report articles whose citation key has no bibliography record
    CheckBib,

    /// Rename one note and rewrite links to it
    #[command(alias = "mv")]
    Rename {
        /// Current identifier
        from: String,

        /// New identifier
        to: String,
    },

    /// Rename articles after their citation and rewrite links
    RenameByCitation,

    /// Look up missing DOIs through Better BibTeX
    FetchDois,
}
