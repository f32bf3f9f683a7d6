//! Error types for the ledger core.
//!
//! Zero-row query results are not errors; they are reported as empty result
//! values by the store. The variants here cover the cases where an operation
//! must abort: bad input, a failed file write, an unreadable backing file,
//! or a failed export.

use std::fmt;

/// Errors from the ledger store and its collaborators.
#[derive(Debug)]
pub enum LedgerError {
    /// Rejected input: no contact slot provided, empty query string,
    /// a reserved delimiter inside a slot value, unparseable amount.
    Validation(String),
    /// Backing-file or export-file I/O failure. The in-memory store is
    /// rolled back to its pre-operation content when a save fails.
    Io(std::io::Error),
    /// Backing-file (de)serialization failure.
    Serialization(serde_json::Error),
    /// Backing file parsed but its columns are inconsistent or a cell
    /// could not be decoded.
    Corrupt(String),
    /// The spreadsheet export collaborator failed to write.
    Export(csv::Error),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "validation failed: {}", msg),
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::Serialization(e) => write!(f, "serialization error: {}", e),
            Self::Corrupt(msg) => write!(f, "corrupt ledger file: {}", msg),
            Self::Export(e) => write!(f, "export failed: {}", e),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<std::io::Error> for LedgerError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e)
    }
}

impl From<csv::Error> for LedgerError {
    fn from(e: csv::Error) -> Self {
        Self::Export(e)
    }
}
