//! External identifier lookup and the concurrent fetch pool
//!
//! The only concurrent part of the crate. Candidates are collected up front;
//! a bounded set of scoped worker threads then drains the list, each worker
//! owning the one document it is updating. Every worker finishes before the
//! report is returned, and a failure only affects its own document.

use std::path::PathBuf;
use std::sync::Mutex;
use std::thread;

use log::{error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use serde_json::{json, Value};

use crate::constants as C;
use crate::document::{NoteDocument, WriteMode};
use crate::error::{Error, Result};
use crate::frontmatter::PropertyValue;

static DOI_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https://doi[^\s]*").expect("valid DOI pattern"));

/// Network-backed, single-item lookup of a persistent identifier
pub trait ExternalReferenceLookup: Send + Sync {
    /// `Ok(None)` when the service knows no identifier for `citation_key`
    fn resolve(&self, citation_key: &str) -> Result<Option<String>>;
}

/// First DOI URL in a formatted reference
pub fn extract_doi(text: &str) -> Option<String> {
    DOI_URL.find(text).map(|m| m.as_str().to_string())
}

/// Client for the Better BibTeX JSON-RPC endpoint of a running Zotero
pub struct BetterBibtexClient {
    client: Client,
    url: String,
}

impl BetterBibtexClient {
    pub fn new(url: &str) -> Self {
        Self {
            client: Client::new(),
            url: url.to_string(),
        }
    }

    /// APA-formatted bibliography entry for one citation key
    pub fn bibliography(&self, citation_key: &str) -> Result<String> {
        let request = json!({
            "jsonrpc": "2.0",
            "method": "item.bibliography",
            "params": [[citation_key], {"id": "apa"}],
        });

        let response = self
            .client
            .post(&self.url)
            .header("Accept", "application/json")
            .json(&request)
            .send()?
            .error_for_status()?;
        let body: Value = response.json()?;
        rpc_result(&body)
    }
}

/// Pull the string result out of a JSON-RPC response
fn rpc_result(body: &Value) -> Result<String> {
    if let Some(err) = body.get("error") {
        let message = err
            .get("message")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| err.to_string());
        return Err(Error::Lookup(message));
    }
    match body.get("result") {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) | None => Ok(String::new()),
        Some(other) => Ok(other.to_string()),
    }
}

impl ExternalReferenceLookup for BetterBibtexClient {
    fn resolve(&self, citation_key: &str) -> Result<Option<String>> {
        Ok(extract_doi(&self.bibliography(citation_key)?))
    }
}

/// What happened to each candidate
#[derive(Debug, Default)]
pub struct FetchReport {
    /// Documents given an identifier, with the identifier
    pub updated: Vec<(PathBuf, String)>,
    /// Lookup found nothing
    pub unresolved: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, Error)>,
}

impl FetchReport {
    pub fn total(&self) -> usize {
        self.updated.len() + self.unresolved.len() + self.failed.len()
    }
}

enum Outcome {
    Updated(String),
    Unresolved,
    Failed(Error),
}

/// Look up, set and write the DOI of one document
fn fetch_one(
    doc: &mut NoteDocument,
    key_property: &str,
    lookup: &dyn ExternalReferenceLookup,
    mode: Option<&WriteMode>,
) -> Result<Option<String>> {
    let citation_key = doc
        .scalar(key_property)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .ok_or_else(|| Error::Transform(format!("no '{}' property", key_property)))?;

    let doi = match lookup.resolve(&citation_key)? {
        Some(doi) => doi,
        None => return Ok(None),
    };

    info!("Updating {:15} with doi {}", citation_key, doi);
    doc.set_property(C::DOI_PROPERTY, PropertyValue::Scalar(doi.clone()));
    if let Some(mode) = mode {
        doc.write(mode.clone())?;
    }
    Ok(Some(doi))
}

/// Resolve identifiers for `candidates` on at most `workers` threads.
///
/// `mode` of `None` looks up without writing. Returns once every candidate
/// has been handled.
pub fn fetch_all(
    candidates: Vec<NoteDocument>,
    key_property: &str,
    lookup: &dyn ExternalReferenceLookup,
    workers: usize,
    mode: Option<WriteMode>,
) -> FetchReport {
    let mut report = FetchReport::default();
    if candidates.is_empty() {
        return report;
    }

    let workers = workers.clamp(1, candidates.len());
    let queue = Mutex::new(candidates.into_iter());
    let queue = &queue;
    let mode = mode.as_ref();

    let results: Vec<(PathBuf, Outcome)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(move || {
                    let mut done = Vec::new();
                    loop {
                        // Hold the lock only while taking the next document
                        let next = queue.lock().unwrap_or_else(|e| e.into_inner()).next();
                        let Some(mut doc) = next else { break };

                        let outcome = match fetch_one(&mut doc, key_property, lookup, mode) {
                            Ok(Some(doi)) => Outcome::Updated(doi),
                            Ok(None) => Outcome::Unresolved,
                            Err(e) => Outcome::Failed(e),
                        };
                        done.push((doc.path().to_path_buf(), outcome));
                    }
                    done
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|handle| {
                handle.join().unwrap_or_else(|_| {
                    error!("A lookup worker panicked; its remaining results are lost");
                    Vec::new()
                })
            })
            .collect()
    });

    for (path, outcome) in results {
        match outcome {
            Outcome::Updated(doi) => report.updated.push((path, doi)),
            Outcome::Unresolved => report.unresolved.push(path),
            Outcome::Failed(e) => {
                warn!("{}: {}", path.display(), e);
                report.failed.push((path, e));
            }
        }
    }
    report.updated.sort();
    report.unresolved.sort();
    report.failed.sort_by(|a, b| a.0.cmp(&b.0));

    info!(
        "Fetched {} identifier(s); {} unresolved, {} failed",
        report.updated.len(),
        report.unresolved.len(),
        report.failed.len()
    );
    report
}
