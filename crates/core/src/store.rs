//! Persistence for the patient collection.
//!
//! The whole collection is read into memory on [`PatientStore::load`] and written back in
//! full on [`PatientStore::save`]. There is no partial or append write.
//!
//! ## Storage Layout
//!
//! [`JsonFileStore`] keeps a single JSON object keyed by patient id:
//!
//! ```text
//! {
//!   "P001": { "name": "...", "city": "...", "age": 30, "gender": "male", "height": 1.75, "weight": 70.0 },
//!   "P002": { ... }
//! }
//! ```
//!
//! Key order in the file is the collection order. A record that is an object but not a
//! valid patient loads as [`StoredRecord::Incomplete`] instead of failing the whole load.

use crate::constants::TEMP_FILE_SUFFIX;
use crate::patient::{PatientFields, PatientView, StoredRecord};
use crate::{PatientError, PatientResult};
use pms_types::NonEmptyText;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

// ============================================================================
// COLLECTION
// ============================================================================

/// Every stored patient, keyed by id, in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Collection {
    entries: Vec<(String, StoredRecord)>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&StoredRecord> {
        self.position(id).map(|i| &self.entries[i].1)
    }

    /// Inserts or replaces the record for `id`, returning the previous record.
    ///
    /// A replaced record keeps its position; a new record is appended.
    pub fn insert(&mut self, id: String, fields: PatientFields) -> Option<StoredRecord> {
        self.insert_record(id, StoredRecord::Complete(fields))
    }

    fn insert_record(&mut self, id: String, record: StoredRecord) -> Option<StoredRecord> {
        match self.position(&id) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, record)),
            None => {
                self.entries.push((id, record));
                None
            }
        }
    }

    /// Removes the record for `id`, keeping the order of the remaining records.
    pub fn remove(&mut self, id: &str) -> Option<StoredRecord> {
        self.position(id).map(|i| self.entries.remove(i).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StoredRecord)> {
        self.entries.iter().map(|(id, record)| (id.as_str(), record))
    }

    /// Presentation form of every record, in collection order.
    pub fn views(&self) -> Vec<PatientView> {
        self.iter()
            .map(|(id, record)| record.view(id))
            .collect()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|(key, _)| key == id)
    }
}

impl Serialize for Collection {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, record) in &self.entries {
            map.serialize_entry(id, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Collection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(CollectionVisitor)
    }
}

struct CollectionVisitor;

impl<'de> Visitor<'de> for CollectionVisitor {
    type Value = Collection;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object mapping patient id to patient fields")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut collection = Collection::new();
        while let Some(id) = access.next_key::<NonEmptyText>()? {
            let raw = access.next_value::<serde_json::Map<String, serde_json::Value>>()?;
            let record = StoredRecord::from_raw(id.as_str(), raw);
            // Duplicate keys: last value wins, first position is kept.
            collection.insert_record(id.into_string(), record);
        }
        Ok(collection)
    }
}

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Durable home of the patient collection.
pub trait PatientStore: fmt::Debug + Send + Sync {
    /// Reads the full collection. A store that does not exist yet is empty.
    fn load(&self) -> PatientResult<Collection>;

    /// Replaces the stored collection with `collection`.
    fn save(&self, collection: &Collection) -> PatientResult<()>;
}

// ============================================================================
// JSON FILE STORE
// ============================================================================

/// Store backed by one pretty-printed JSON file.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut raw = self.path.clone().into_os_string();
        raw.push(TEMP_FILE_SUFFIX);
        PathBuf::from(raw)
    }
}

impl PatientStore for JsonFileStore {
    /// # Errors
    ///
    /// Returns `PatientError` if:
    /// - the file exists but cannot be read ([`PatientError::FileRead`])
    /// - the content is not a valid collection ([`PatientError::Deserialization`])
    fn load(&self) -> PatientResult<Collection> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("store {} not found, starting empty", self.path.display());
                return Ok(Collection::new());
            }
            Err(e) => return Err(PatientError::FileRead(e)),
        };

        let mut deserializer = serde_json::Deserializer::from_str(&raw);
        let collection: Collection = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(PatientError::Deserialization)?;

        tracing::debug!(
            "loaded {} patients from {}",
            collection.len(),
            self.path.display()
        );
        Ok(collection)
    }

    /// Writes to a sibling temporary file, then renames it over the store.
    ///
    /// # Errors
    ///
    /// Returns `PatientError` if:
    /// - serialisation fails ([`PatientError::Serialization`])
    /// - the temporary file cannot be written or renamed ([`PatientError::FileWrite`])
    fn save(&self, collection: &Collection) -> PatientResult<()> {
        let mut json =
            serde_json::to_string_pretty(collection).map_err(PatientError::Serialization)?;
        json.push('\n');

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, json) {
            discard_temp(&temp_path);
            return Err(PatientError::FileWrite(e));
        }

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            discard_temp(&temp_path);
            return Err(PatientError::FileWrite(e));
        }

        tracing::debug!(
            "saved {} patients to {}",
            collection.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Best-effort removal of a temporary file left by a failed save.
fn discard_temp(temp_path: &Path) {
    match fs::remove_file(temp_path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(
            "failed to remove temporary store {}: {}",
            temp_path.display(),
            e
        ),
    }
}

// ============================================================================
// MEMORY STORE
// ============================================================================

/// Store that keeps the collection in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collection: Mutex<Collection>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(collection: Collection) -> Self {
        Self {
            collection: Mutex::new(collection),
        }
    }
}

impl PatientStore for MemoryStore {
    fn load(&self) -> PatientResult<Collection> {
        let guard = self
            .collection
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(guard.clone())
    }

    fn save(&self, collection: &Collection) -> PatientResult<()> {
        let mut guard = self
            .collection
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = collection.clone();
        Ok(())
    }
}
