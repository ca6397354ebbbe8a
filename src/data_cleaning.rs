//! Reading the raw CSV tables of a data directory into typed records.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::LoadError;

pub const PEOPLE_FILE: &str = "people.csv";
pub const MOVIES_FILE: &str = "movies.csv";
pub const STARS_FILE: &str = "stars.csv";

/// A row of `people.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntityRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub birth: Option<String>,
}

/// A row of `movies.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkRecord {
    pub id: String,
    pub title: String,
    pub year: u16,
}

/// A row of `stars.csv`, pairing a person with a movie they appeared in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppearanceRecord {
    #[serde(rename = "person_id")]
    pub entity_id: String,
    #[serde(rename = "movie_id")]
    pub work_id: String,
}

/// The three tables of a data directory, in file order.
#[derive(Debug, Default)]
pub struct Dataset {
    pub entities: Vec<EntityRecord>,
    pub works: Vec<WorkRecord>,
    pub appearances: Vec<AppearanceRecord>,
}

pub fn parse_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>, LoadError> {
    let file = File::open(file_path).map_err(|source| LoadError::Io {
        path: file_path.to_path_buf(),
        source,
    })?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true) // column titles map onto record fields
        .trim(Trim::All)
        .from_reader(BufReader::new(file));

    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|source| LoadError::Csv {
            path: file_path.to_path_buf(),
            source,
        })
}

/// Reads `people.csv`, `movies.csv` and `stars.csv` from `directory`.
pub fn parse_dir(directory: &Path) -> Result<Dataset, LoadError> {
    Ok(Dataset {
        entities: parse_csv(&directory.join(PEOPLE_FILE))?,
        works: parse_csv(&directory.join(MOVIES_FILE))?,
        appearances: parse_csv(&directory.join(STARS_FILE))?,
    })
}
