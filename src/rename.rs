//! Rename pipeline with link rewriting
//!
//! Renaming runs in two strictly ordered phases:
//!
//! 1. Collection: the caller's transformation picks a new identifier per
//!    document; each document is moved right away and the rename is recorded
//!    in a [`RenameLedger`].
//! 2. Link rewrite: one pass over every document of the vault replaces
//!    `[[old...]]` references with `[[new...]]`, keeping anchors, aliases
//!    and table-escaped separators as they are.
//!
//! The ledger is complete before any body is scanned; each reference costs
//! one map lookup.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use log::{debug, info};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::batch::BatchRunner;
use crate::document::{NoteDocument, WriteMode};
use crate::error::{Error, Result};
use crate::walker::{self, EnumerateOptions};

/// `[[...]]`, also matching the inside of `![[...]]` embeds
static WIKILINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\[\]\n]+?)\]\]").expect("valid wikilink pattern"));

/// One document's move from `from` to `to`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRequest {
    /// Path the document was at before the move
    pub path: PathBuf,
    pub from: String,
    pub to: String,
}

/// Old identifier to new identifier, built up during a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameLedger {
    renames: HashMap<String, String>,
    targets: HashSet<String>,
}

impl RenameLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that a rename can join the ledger. Refuses duplicate sources,
    /// duplicate targets and chains (a source that is another rename's
    /// target, or the other way round).
    pub fn check(&self, from: &str, to: &str) -> Result<()> {
        let conflict = |reason: &str| Error::RenameConflict {
            from: from.to_string(),
            to: to.to_string(),
            reason: reason.to_string(),
        };

        if self.renames.contains_key(from) {
            return Err(conflict("source is already being renamed in this batch"));
        }
        if self.targets.contains(to) {
            return Err(conflict("another document is renamed to the same name"));
        }
        if self.targets.contains(from) || self.renames.contains_key(to) {
            return Err(conflict("renames in one batch may not chain"));
        }
        Ok(())
    }

    /// Record a rename after [`check`](Self::check)ing it
    pub fn record(&mut self, from: &str, to: &str) -> Result<()> {
        self.check(from, to)?;
        self.renames.insert(from.to_string(), to.to_string());
        self.targets.insert(to.to_string());
        Ok(())
    }

    pub fn get(&self, identifier: &str) -> Option<&str> {
        self.renames.get(identifier).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.renames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }
}

/// Split a reference body into its identifier and the untouched suffix
/// (`#heading`, `#^block`, `|alias` or table-escaped `\|alias`).
fn split_reference(inner: &str) -> (&str, &str) {
    let mut end = inner.find(['#', '|']).unwrap_or(inner.len());
    if inner[end..].starts_with('|') && inner[..end].ends_with('\\') {
        end -= 1;
    }
    inner.split_at(end)
}

/// Rewrite every reference on one line; returns the line and the number of
/// substitutions made.
pub fn rewrite_line<'l>(line: &'l str, ledger: &RenameLedger) -> (Cow<'l, str>, usize) {
    if ledger.is_empty() || !line.contains("[[") {
        return (Cow::Borrowed(line), 0);
    }

    let mut count = 0;
    let rewritten = WIKILINK.replace_all(line, |caps: &Captures| {
        let whole = &caps[0];
        let (target, suffix) = split_reference(&caps[1]);

        // Folder-qualified targets match on their last segment
        let (folder, name) = match target.rfind('/') {
            Some(i) => target.split_at(i + 1),
            None => ("", target),
        };

        match ledger.get(name) {
            Some(new_name) => {
                count += 1;
                format!("[[{}{}{}]]", folder, new_name, suffix)
            }
            None => whole.to_string(),
        }
    });

    if count == 0 {
        return (Cow::Borrowed(line), 0);
    }
    (rewritten, count)
}

/// Rewrite references across a body in place; returns substitutions made
pub fn rewrite_body(body: &mut [String], ledger: &RenameLedger) -> usize {
    let mut total = 0;
    for line in body.iter_mut() {
        let (rewritten, count) = rewrite_line(line, ledger);
        if count > 0 {
            *line = rewritten.into_owned();
            total += count;
        }
    }
    total
}

/// Outcome of a rename run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameReport {
    pub renamed: Vec<RenameRequest>,
    /// Documents rewritten by the link pass
    pub relinked: Vec<PathBuf>,
    pub substitutions: usize,
}

/// Link-rewrite pass over every document under `root`.
///
/// Only documents with at least one substitution are written.
pub fn relink(
    root: &Path,
    options: &EnumerateOptions,
    ledger: &RenameLedger,
    mode: &WriteMode,
) -> Result<(Vec<PathBuf>, usize)> {
    let mut written = Vec::new();
    let mut substitutions = 0;

    if ledger.is_empty() {
        return Ok((written, substitutions));
    }

    for doc in walker::enumerate(root, options, |_| true)? {
        let mut doc: NoteDocument = doc?;
        let count = rewrite_body(doc.body_mut(), ledger);
        if count == 0 {
            continue;
        }
        debug!("{} reference(s) updated in {}", count, doc.path().display());
        substitutions += count;
        written.push(doc.write(mode.clone())?);
    }

    Ok((written, substitutions))
}

impl BatchRunner<'_> {
    /// Rename matching documents and rewrite references to them.
    ///
    /// `transformation` returns the new identifier, or `None` to leave the
    /// document alone. Returning the current identifier is also a no-op.
    /// In copy mode the renamed file is written next to the original and
    /// the relinked documents go to `_copy` siblings.
    ///
    /// If collection stops on an error, references to the documents already
    /// moved are still rewritten before the error is returned.
    pub fn rename<F>(&self, mut transformation: F) -> Result<RenameReport>
    where
        F: FnMut(&mut NoteDocument) -> Result<Option<String>>,
    {
        let mut ledger = RenameLedger::new();
        let mut report = RenameReport::default();

        // Phase 1: move documents and collect the ledger
        let collected = self.collect_renames(&mut transformation, &mut ledger, &mut report.renamed);

        // Phase 2: one pass over the whole vault
        let (relinked, substitutions) =
            relink(self.root(), &self.options().unlimited(), &ledger, &self.write_mode())?;
        report.relinked = relinked;
        report.substitutions = substitutions;

        info!(
            "Renamed {} document(s), updated {} reference(s) in {} document(s)",
            report.renamed.len(),
            report.substitutions,
            report.relinked.len()
        );
        collected?;
        Ok(report)
    }

    fn collect_renames<F>(
        &self,
        transformation: &mut F,
        ledger: &mut RenameLedger,
        renamed: &mut Vec<RenameRequest>,
    ) -> Result<()>
    where
        F: FnMut(&mut NoteDocument) -> Result<Option<String>>,
    {
        for doc in self.corpus()? {
            let mut doc = doc?;
            let new_identifier = transformation(&mut doc).map_err(|e| Error::BatchAbort {
                path: doc.path().to_path_buf(),
                source: Box::new(e),
            })?;

            let new_identifier = match new_identifier {
                Some(id) if id != doc.identifier() => id,
                _ => continue,
            };

            let old_identifier = doc.identifier();
            let old_path = doc.path().to_path_buf();
            ledger.check(&old_identifier, &new_identifier)?;

            if self.copies() {
                doc.write_as(&new_identifier)?;
            } else {
                doc.rename(&new_identifier)?;
            }
            ledger.record(&old_identifier, &new_identifier)?;

            renamed.push(RenameRequest {
                path: old_path,
                from: old_identifier,
                to: new_identifier,
            });
        }
        Ok(())
    }
}
