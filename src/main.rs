use std::path::Path;
use std::process;

use clap::Parser;
use log::LevelFilter;
use papernote::{
    util, BatchReport, BatchRunner, Cli, Command, CslLibrary, Error, Result, VaultConfig,
};

/// Settings shared by every command for one run
pub struct Context {
    pub config: VaultConfig,
    pub limit: Option<usize>,
    pub copy: bool,
    pub dry_run: bool,
    pub json: bool,
}

impl Context {
    /// Runner over the article notes of the vault
    pub fn articles<'a>(&self) -> BatchRunner<'a> {
        BatchRunner::for_articles(&self.config)
            .with_limit(self.limit)
            .copy_instead_of_overwrite(self.copy)
    }

    /// Runner over every note of the vault
    pub fn all_notes<'a>(&self) -> BatchRunner<'a> {
        BatchRunner::new(self.config.vault.clone(), self.config.enumerate_options())
            .with_limit(self.limit)
            .copy_instead_of_overwrite(self.copy)
    }

    pub fn write_back(&self) -> bool {
        !self.dry_run
    }

    pub fn bibliography(&self) -> Result<CslLibrary> {
        let path = self.config.bibliography_path().ok_or_else(|| {
            Error::Config("no 'bibliography' file configured".to_string())
        })?;
        CslLibrary::load(&path)
    }

    pub fn display(&self, path: &Path) -> String {
        util::display_path(&self.config.vault, path)
    }

    /// One-line summary of a batch run
    pub fn summarize(&self, action: &str, changed: usize, report: &BatchReport) {
        let suffix = if self.dry_run { " (dry run)" } else { "" };
        println!(
            "{}: {} note(s) changed, {} visited, {} written{}",
            action,
            changed,
            report.visited,
            report.written.len(),
            suffix
        );
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = VaultConfig::resolve(cli.config.as_deref(), cli.vault.as_deref())?;
    let ctx = Context {
        config,
        limit: cli.limit,
        copy: cli.copy,
        dry_run: cli.dry_run,
        json: cli.json,
    };

    match cli.command {
        Command::List { all } => cmd::list::run(&ctx, all),
        Command::Show { note } => cmd::show::run(&ctx, &note),
        Command::Reorder { labels } => cmd::reorder::run(&ctx, &labels),
        Command::SplitLinks => cmd::split_links::run(&ctx),
        Command::AuthorTags => cmd::author_tags::run(&ctx),
        Command::Abstract { open, .. } => cmd::abstract_toggle::run(&ctx, open),
        Command::MoveTags { tags } => cmd::move_tags::run(&ctx, &tags),
        Command::ZoteroLinks => cmd::zotero_links::run(&ctx),
        Command::AddJournal => cmd::add_journal::run(&ctx),
        Command::CheckBib => cmd::check_bib::run(&ctx),
        Command::Rename { from, to } => cmd::rename::run(&ctx, &from, &to),
        Command::RenameByCitation => cmd::rename_by_citation::run(&ctx),
        Command::FetchDois => cmd::fetch_dois::run(&ctx),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

mod cmd {
    pub mod abstract_toggle;
    pub mod add_journal;
    pub mod author_tags;
    pub mod check_bib;
    pub mod fetch_dois;
    pub mod list;
    pub mod move_tags;
    pub mod rename;
    pub mod rename_by_citation;
    pub mod reorder;
    pub mod show;
    pub mod split_links;
    pub mod zotero_links;
}
