//! The in-memory person/work graph.
//!
//! A [`GraphStore`] is built once by [`GraphStore::load`] and never mutated
//! afterwards, so it can be shared by reference between any number of
//! concurrent searches.
//!
//! Every store keeps the bipartite adjacency invariant: a work is in an
//! entity's `works` exactly when that entity is in the work's
//! `participants`. Both sides are ordered sets, so iteration runs in
//! ascending id order and is the same for every run over the same input.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;

use tracing::{debug, info};

use crate::data_cleaning::{self, AppearanceRecord, EntityRecord, WorkRecord};
use crate::error::{LoadError, RecordKind, UnknownReference};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id! {
    /// Identifier of a person.
    EntityId
}

string_id! {
    /// Identifier of a movie.
    WorkId
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub name: String,
    pub birth: Option<String>,
    pub works: BTreeSet<WorkId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Work {
    pub title: String,
    pub year: u16,
    pub participants: BTreeSet<EntityId>,
}

#[derive(Debug, Default)]
pub struct GraphStore {
    entities: HashMap<EntityId, Entity>,
    works: HashMap<WorkId, Work>,
    /// Lower-cased display name -> every entity carrying that name.
    names: HashMap<String, BTreeSet<EntityId>>,
    appearances: usize,
    dropped: usize,
}

impl GraphStore {
    /// Builds a store from entity, work and appearance records.
    ///
    /// Entity and work records must have a non-empty id and name/title, and
    /// ids must be unique. Appearances naming an unknown entity or work are
    /// dropped; repeated appearances collapse into one.
    pub fn load<E, W, A>(entities: E, works: W, appearances: A) -> Result<Self, LoadError>
    where
        E: IntoIterator<Item = EntityRecord>,
        W: IntoIterator<Item = WorkRecord>,
        A: IntoIterator<Item = AppearanceRecord>,
    {
        let mut store = GraphStore::default();

        for (index, record) in entities.into_iter().enumerate() {
            store.insert_entity(index + 1, record)?;
        }
        for (index, record) in works.into_iter().enumerate() {
            store.insert_work(index + 1, record)?;
        }
        for (index, record) in appearances.into_iter().enumerate() {
            if let Err(reference) = store.link(&record) {
                debug!(record = index + 1, %reference, "dropping appearance");
                store.dropped += 1;
            }
        }

        info!(
            entities = store.entities.len(),
            works = store.works.len(),
            appearances = store.appearances,
            dropped = store.dropped,
            "graph loaded"
        );
        Ok(store)
    }

    /// Reads `people.csv`, `movies.csv` and `stars.csv` from `directory`.
    pub fn from_dir(directory: &Path) -> Result<Self, LoadError> {
        debug!(directory = %directory.display(), "reading data directory");
        let dataset = data_cleaning::parse_dir(directory)?;
        Self::load(dataset.entities, dataset.works, dataset.appearances)
    }

    fn insert_entity(&mut self, record_number: usize, record: EntityRecord) -> Result<(), LoadError> {
        let id = required(RecordKind::Entity, record_number, "id", record.id)?;
        let name = required(RecordKind::Entity, record_number, "name", record.name)?;
        let id = EntityId::from(id);
        if self.entities.contains_key(&id) {
            return Err(LoadError::DuplicateId {
                kind: RecordKind::Entity,
                id: id.0,
            });
        }

        self.names
            .entry(name.to_lowercase())
            .or_default()
            .insert(id.clone());
        self.entities.insert(
            id,
            Entity {
                name,
                birth: record.birth.filter(|birth| !birth.is_empty()),
                works: BTreeSet::new(),
            },
        );
        Ok(())
    }

    fn insert_work(&mut self, record_number: usize, record: WorkRecord) -> Result<(), LoadError> {
        let id = required(RecordKind::Work, record_number, "id", record.id)?;
        let title = required(RecordKind::Work, record_number, "title", record.title)?;
        let id = WorkId::from(id);
        if self.works.contains_key(&id) {
            return Err(LoadError::DuplicateId {
                kind: RecordKind::Work,
                id: id.0,
            });
        }

        self.works.insert(
            id,
            Work {
                title,
                year: record.year,
                participants: BTreeSet::new(),
            },
        );
        Ok(())
    }

    /// Adds both directions of an appearance, or neither.
    fn link(&mut self, record: &AppearanceRecord) -> Result<(), UnknownReference> {
        let entity_id = EntityId::new(record.entity_id.as_str());
        let work_id = WorkId::new(record.work_id.as_str());
        let Some(entity) = self.entities.get_mut(&entity_id) else {
            return Err(UnknownReference::Entity(entity_id.0));
        };
        let Some(work) = self.works.get_mut(&work_id) else {
            return Err(UnknownReference::Work(work_id.0));
        };

        let added = work.participants.insert(entity_id);
        entity.works.insert(work_id);
        if added {
            self.appearances += 1;
        }
        Ok(())
    }

    /// Case-insensitive exact lookup of a display name.
    pub fn resolve(&self, name: &str) -> BTreeSet<EntityId> {
        self.names
            .get(&name.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    /// Every `(work, co-participant)` pair reachable from `id` in one hop.
    ///
    /// Pairs come out by ascending work id, then ascending entity id. The
    /// queried entity never appears as its own neighbor. An unknown id has
    /// no neighbors.
    pub fn neighbors<'a>(
        &'a self,
        id: &'a EntityId,
    ) -> impl Iterator<Item = (&'a WorkId, &'a EntityId)> + 'a {
        self.entities
            .get(id)
            .into_iter()
            .flat_map(|entity| entity.works.iter())
            .flat_map(move |work_id| {
                self.works
                    .get(work_id)
                    .into_iter()
                    .flat_map(|work| work.participants.iter())
                    .filter(move |participant| *participant != id)
                    .map(move |participant| (work_id, participant))
            })
    }

    pub fn entity(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn work(&self, id: &WorkId) -> Option<&Work> {
        self.works.get(id)
    }

    pub fn contains_entity(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn work_count(&self) -> usize {
        self.works.len()
    }

    /// Distinct entity/work pairs linked during load.
    pub fn appearance_count(&self) -> usize {
        self.appearances
    }

    /// Appearance records dropped for naming an unknown entity or work.
    pub fn dropped_appearances(&self) -> usize {
        self.dropped
    }

    /// All entity ids in ascending order.
    pub fn entity_ids(&self) -> BTreeSet<&EntityId> {
        self.entities.keys().collect()
    }
}

fn required(
    kind: RecordKind,
    record: usize,
    field: &'static str,
    value: String,
) -> Result<String, LoadError> {
    if value.is_empty() {
        return Err(LoadError::MissingField { kind, record, field });
    }
    Ok(value)
}
