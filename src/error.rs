use object::read::FileKind;
use thiserror::Error;

use crate::pe_debug::CodeViewTag;

/// Errors from reading the PDB identity out of a PE binary.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ExtractError {
    #[error("The PE binary does not contain a debug directory entry.")]
    NoDebugEntry,

    #[error("The PE binary contains an unsupported debug entry type: {0}")]
    UnsupportedDebugEntryType(CodeViewTag),

    #[error("Object could not parse the file: {0}")]
    ObjectParseError(#[source] object::read::Error),

    #[error("The file is not a PE (Windows) binary, it was detected as {0:?}")]
    NotPe(FileKind),

    #[error("Invalid debug directory: {0}")]
    InvalidDebugDirectory(&'static str),

    #[error("The debug directory entry is truncated: {0}")]
    TruncatedDebugEntry(&'static str),

    #[error("The embedded path to the PDB file was not valid utf-8.")]
    PdbPathNotUtf8,
}

/// Errors from downloading a PDB from a symbol server.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FetchError {
    #[error("The symbol server returned 404. PDB not found.")]
    PdbNotFound,

    #[error("The symbol server returned unexpected status code {0}")]
    UnexpectedReturnStatus(u16),

    #[error("Creating the reqwest client failed: {0}")]
    ClientCreationFailed(String),

    #[error("The request failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> FetchError {
        FetchError::Transport(Box::new(err))
    }
}
