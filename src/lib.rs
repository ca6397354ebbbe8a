//! Degrees of separation between people, measured in shared works.
//!
//! Load a data directory into a [`GraphStore`], turn names into ids with
//! [`GraphStore::resolve`], then ask [`shortest_path`] for the chain of
//! movies linking two people.

pub mod data_cleaning;
pub mod error;
pub mod graph_analysis;
pub mod graph_store;

pub use error::{LoadError, RecordKind, UnknownReference};
pub use graph_analysis::{shortest_path, Connection, Hop};
pub use graph_store::{Entity, EntityId, GraphStore, Work, WorkId};
