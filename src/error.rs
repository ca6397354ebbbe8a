//! Error types for loading a graph.
//!
//! Only loading can fail. A search that finds no path returns
//! [`Connection::NotConnected`](crate::graph_analysis::Connection), and an
//! ambiguous or unknown name is just a set of candidates with zero or
//! several entries.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The kind of input record an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Entity,
    Work,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Entity => f.write_str("entity"),
            RecordKind::Work => f.write_str("work"),
        }
    }
}

/// Errors that abort a load. No partial store is ever returned.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed CSV in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{kind} record {record} is missing required field '{field}'")]
    MissingField {
        kind: RecordKind,
        /// 1-based position of the record in its input sequence.
        record: usize,
        field: &'static str,
    },

    #[error("duplicate {kind} id '{id}'")]
    DuplicateId { kind: RecordKind, id: String },
}

/// An appearance record naming an id the store does not know.
///
/// These records are dropped during load and never reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnknownReference {
    #[error("unknown entity id '{0}'")]
    Entity(String),

    #[error("unknown work id '{0}'")]
    Work(String),
}
