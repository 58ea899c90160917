//! Error type shared by the library and the command layer

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Directory scan failed: {0}")]
    Walk(#[from] walkdir::Error),

    /// A transformation failed; documents written before it stay written.
    #[error("Batch aborted at '{}': {source}", path.display())]
    BatchAbort {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("Cannot rename '{from}' to '{to}': {reason}")]
    RenameConflict {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Transformation failed: {0}")]
    Transform(String),

    /// External reference lookup answered with an error
    #[error("Lookup failed: {0}")]
    Lookup(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Map an I/O failure on `path` to `NotFound` or `Read`.
    pub fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Error::NotFound(path)
        } else {
            Error::Read { path, source }
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Write { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
