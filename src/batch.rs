//! Batch runner
//!
//! Applies a per-document transformation across the enumerated corpus, one
//! document at a time. Write-back is an explicit argument of each run. A
//! failing transformation aborts the run; documents written before it stay
//! written.

use std::path::{Path, PathBuf};

use log::info;

use crate::config::VaultConfig;
use crate::document::{NoteDocument, WriteMode};
use crate::error::{Error, Result};
use crate::walker::{self, Corpus, EnumerateOptions, KindFilter};

/// Outcome of a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Documents handed to the transformation
    pub visited: usize,
    /// Paths written
    pub written: Vec<PathBuf>,
}

pub struct BatchRunner<'a> {
    root: PathBuf,
    options: EnumerateOptions,
    predicate: Box<dyn Fn(&NoteDocument) -> bool + 'a>,
    copy: bool,
}

impl<'a> BatchRunner<'a> {
    /// Runner over every document under `root`
    pub fn new(root: impl Into<PathBuf>, options: EnumerateOptions) -> Self {
        Self {
            root: root.into(),
            options,
            predicate: Box::new(|_| true),
            copy: false,
        }
    }

    /// Runner over the configured vault, restricted to the configured kind
    pub fn for_articles(config: &VaultConfig) -> Self {
        let kind: KindFilter = config.kind();
        Self::new(config.vault.clone(), config.enumerate_options())
            .with_predicate(move |doc| kind.matches(doc))
    }

    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&NoteDocument) -> bool + 'a,
    {
        self.predicate = Box::new(predicate);
        self
    }

    /// Narrow the current predicate with another condition
    pub fn and_filter<F>(mut self, extra: F) -> Self
    where
        F: Fn(&NoteDocument) -> bool + 'a,
    {
        let current = self.predicate;
        self.predicate = Box::new(move |doc| current(doc) && extra(doc));
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.options.limit = limit;
        self
    }

    /// Redirect all writes to `_copy` siblings
    pub fn copy_instead_of_overwrite(mut self, copy: bool) -> Self {
        self.copy = copy;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &EnumerateOptions {
        &self.options
    }

    pub fn copies(&self) -> bool {
        self.copy
    }

    pub fn write_mode(&self) -> WriteMode {
        WriteMode::from_copy_flag(self.copy)
    }

    /// Matching documents for this runner
    pub fn corpus(&self) -> Result<Corpus<'_>> {
        walker::enumerate(&self.root, &self.options, |doc| (self.predicate)(doc))
    }

    /// Run `transformation` on every matching document, writing each one
    /// straight after its transformation when `write_back` is set.
    pub fn process<F>(&self, write_back: bool, mut transformation: F) -> Result<BatchReport>
    where
        F: FnMut(&mut NoteDocument) -> Result<()>,
    {
        let mut report = BatchReport::default();

        for doc in self.corpus()? {
            let mut doc = doc?;
            report.visited += 1;

            transformation(&mut doc).map_err(|e| Error::BatchAbort {
                path: doc.path().to_path_buf(),
                source: Box::new(e),
            })?;

            if write_back {
                report.written.push(doc.write(self.write_mode())?);
            }
        }

        info!(
            "Processed {} document(s), wrote {}",
            report.visited,
            report.written.len()
        );
        Ok(report)
    }
}
