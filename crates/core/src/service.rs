//! Record service: the operations exposed over the patient collection.
//!
//! Every call re-loads the collection from the store, so the store is the only source of
//! truth. Mutating calls follow one pattern: load the full collection, compute the new full
//! collection, save it. A failure at any step leaves the stored collection untouched.
//!
//! ## Concurrency
//!
//! Mutations hold a service-wide write lock across load → mutate → save, so two requests
//! handled by the same process cannot overwrite each other's changes. Reads do not take the
//! lock; they always observe a complete saved collection. Nothing coordinates separate
//! processes sharing one store file.
//!
//! ## Pure Data Operations
//!
//! No HTTP concerns live here. Status codes and wire formats belong in `api-rest`.

use crate::config::CoreConfig;
use crate::patient::{NewPatient, Patient, PatientView};
use crate::sort::{sort_views, SortField, SortOrder};
use crate::store::{Collection, JsonFileStore, PatientStore};
use crate::update::PatientUpdate;
use crate::{PatientError, PatientResult};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Patient record operations backed by a [`PatientStore`].
#[derive(Clone, Debug)]
pub struct RecordService {
    store: Arc<dyn PatientStore>,
    write_lock: Arc<Mutex<()>>,
}

impl RecordService {
    pub fn new(store: Arc<dyn PatientStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Service over the JSON store file named in `cfg`.
    pub fn from_config(cfg: &CoreConfig) -> Self {
        Self::new(Arc::new(JsonFileStore::new(cfg.data_file())))
    }

    /// Lists every patient in collection order, with derived fields.
    ///
    /// # Errors
    ///
    /// Returns `PatientError` if the store cannot be read.
    pub fn list_all(&self) -> PatientResult<Vec<PatientView>> {
        Ok(self.store.load()?.views())
    }

    /// Fetches one patient by id.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::NotFound` if no patient has this id, or a store error.
    pub fn get(&self, id: &str) -> PatientResult<PatientView> {
        let collection = self.store.load()?;
        collection
            .get(id)
            .map(|record| record.view(id))
            .ok_or_else(|| PatientError::NotFound(id.to_owned()))
    }

    /// Lists every patient ordered by `field`. Ties keep collection order.
    ///
    /// # Errors
    ///
    /// Returns `PatientError` if the store cannot be read.
    pub fn sort(&self, field: SortField, order: SortOrder) -> PatientResult<Vec<PatientView>> {
        let mut views = self.store.load()?.views();
        sort_views(&mut views, field, order);
        Ok(views)
    }

    /// Parses raw query values and sorts.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::InvalidArgument` if `field` is not `height`, `weight` or `bmi`,
    /// or `order` is present and not `asc`/`desc`.
    pub fn sort_by(&self, field: &str, order: Option<&str>) -> PatientResult<Vec<PatientView>> {
        let field: SortField = field.parse()?;
        let order = SortOrder::parse_or_default(order)?;
        self.sort(field, order)
    }

    /// Creates a patient under its caller-supplied id.
    ///
    /// The input is validated before the duplicate check, so an invalid body is reported as
    /// a validation failure even when the id is taken.
    ///
    /// # Errors
    ///
    /// Returns `PatientError` if:
    /// - any field is invalid ([`PatientError::Validation`])
    /// - the id already exists ([`PatientError::Conflict`])
    /// - the store cannot be read or written
    pub fn create(&self, input: NewPatient) -> PatientResult<PatientView> {
        let patient = Patient::new(input)?;
        let id = patient.id.as_str();

        let _guard = self.lock_writes();
        let mut collection = self.store.load()?;

        if collection.contains(id) {
            tracing::warn!("create rejected, patient {} already exists", id);
            return Err(PatientError::Conflict(id.to_owned()));
        }

        collection.insert(id.to_owned(), patient.fields.clone());
        self.store.save(&collection)?;

        tracing::info!("created patient {}", id);
        Ok(patient.view())
    }

    /// Applies a partial update to an existing patient.
    ///
    /// Only supplied fields change; the merged record is validated as a whole before it
    /// is saved.
    ///
    /// # Errors
    ///
    /// Returns `PatientError` if:
    /// - no patient has this id ([`PatientError::NotFound`])
    /// - the merged record is invalid ([`PatientError::Validation`])
    /// - the store cannot be read or written
    pub fn update(&self, id: &str, update: PatientUpdate) -> PatientResult<PatientView> {
        if update.is_empty() {
            tracing::debug!("update for patient {} supplies no fields", id);
        }

        let _guard = self.lock_writes();
        let mut collection = self.store.load()?;

        let existing = collection
            .get(id)
            .ok_or_else(|| PatientError::NotFound(id.to_owned()))?;
        let merged = update.apply(existing)?;

        let view = PatientView::new(id, &merged);
        collection.insert(id.to_owned(), merged);
        self.store.save(&collection)?;

        tracing::info!("updated patient {}", id);
        Ok(view)
    }

    /// Deletes a patient.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::NotFound` if no patient has this id, or a store error.
    pub fn delete(&self, id: &str) -> PatientResult<()> {
        let _guard = self.lock_writes();
        let mut collection: Collection = self.store.load()?;

        if collection.remove(id).is_none() {
            return Err(PatientError::NotFound(id.to_owned()));
        }
        self.store.save(&collection)?;

        tracing::info!("deleted patient {}", id);
        Ok(())
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        // The guarded value is `()`, so a poisoned lock carries no broken state.
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use pms_types::{Gender, Verdict};
    use std::thread;
    use tempfile::TempDir;

    fn service() -> RecordService {
        RecordService::new(Arc::new(MemoryStore::new()))
    }

    fn new_patient(id: &str, height: f64, weight: f64) -> NewPatient {
        NewPatient {
            id: id.into(),
            name: "A".into(),
            city: "X".into(),
            age: 30,
            gender: "male".into(),
            height,
            weight,
        }
    }

    #[test]
    fn create_then_get_returns_fields_and_derived_values() {
        let service = service();
        service.create(new_patient("P001", 1.75, 70.0)).unwrap();

        let view = service.get("P001").expect("patient should exist");
        assert_eq!(view.id, "P001");
        assert_eq!(view.name.as_deref(), Some("A"));
        assert_eq!(view.city.as_deref(), Some("X"));
        assert_eq!(view.age, Some(30));
        assert_eq!(view.gender, Some(Gender::Male));
        assert_eq!(view.height, Some(1.75));
        assert_eq!(view.weight, Some(70.0));
        assert_eq!(view.bmi, Some(22.86));
        assert_eq!(view.verdict, Some(Verdict::Normal));
    }

    #[test]
    fn reads_are_idempotent() {
        let service = service();
        service.create(new_patient("P001", 1.75, 70.0)).unwrap();
        service.create(new_patient("P002", 1.6, 50.0)).unwrap();

        assert_eq!(service.list_all().unwrap(), service.list_all().unwrap());
        assert_eq!(service.get("P002").unwrap(), service.get("P002").unwrap());
    }

    #[test]
    fn list_all_on_empty_store_is_empty() {
        assert!(service().list_all().unwrap().is_empty());
    }

    #[test]
    fn duplicate_create_conflicts_and_keeps_original() {
        let service = service();
        service.create(new_patient("P001", 1.75, 70.0)).unwrap();

        let err = service
            .create(new_patient("P001", 1.5, 90.0))
            .expect_err("duplicate id should fail");
        assert!(matches!(err, PatientError::Conflict(ref id) if id == "P001"));

        let view = service.get("P001").unwrap();
        assert_eq!(view.height, Some(1.75));
        assert_eq!(view.weight, Some(70.0));
        assert_eq!(service.list_all().unwrap().len(), 1);
    }

    #[test]
    fn invalid_create_persists_nothing() {
        let service = service();
        let mut input = new_patient("P001", 1.75, 70.0);
        input.gender = "unknown".into();

        assert!(matches!(
            service.create(input),
            Err(PatientError::Validation { field: "gender", .. })
        ));
        assert!(service.list_all().unwrap().is_empty());
    }

    #[test]
    fn get_unknown_id_is_not_found() {
        assert!(matches!(
            service().get("P404"),
            Err(PatientError::NotFound(ref id)) if id == "P404"
        ));
    }

    #[test]
    fn partial_update_recomputes_derived_fields() {
        let service = service();
        service.create(new_patient("P001", 1.75, 70.0)).unwrap();

        let update = PatientUpdate {
            weight: Some(100.0),
            ..Default::default()
        };
        let view = service.update("P001", update).unwrap();
        assert_eq!(view.bmi, Some(32.65));
        assert_eq!(view.verdict, Some(Verdict::Obese));

        let stored = service.get("P001").unwrap();
        assert_eq!(stored, view);
        assert_eq!(stored.name.as_deref(), Some("A"));
        assert_eq!(stored.height, Some(1.75));
    }

    #[test]
    fn invalid_update_leaves_record_unchanged() {
        let service = service();
        service.create(new_patient("P001", 1.75, 70.0)).unwrap();
        let before = service.get("P001").unwrap();

        let update = PatientUpdate {
            age: Some(130),
            weight: Some(80.0),
            ..Default::default()
        };
        assert!(matches!(
            service.update("P001", update),
            Err(PatientError::Validation { field: "age", .. })
        ));
        assert_eq!(service.get("P001").unwrap(), before);
    }

    #[test]
    fn update_unknown_id_is_not_found_even_with_invalid_body() {
        let update = PatientUpdate {
            age: Some(130),
            ..Default::default()
        };
        assert!(matches!(
            service().update("P404", update),
            Err(PatientError::NotFound(_))
        ));
    }

    #[test]
    fn delete_removes_and_absent_delete_is_not_found() {
        let service = service();
        service.create(new_patient("P001", 1.75, 70.0)).unwrap();
        service.create(new_patient("P002", 1.6, 50.0)).unwrap();

        assert!(matches!(
            service.delete("P404"),
            Err(PatientError::NotFound(_))
        ));
        assert_eq!(service.list_all().unwrap().len(), 2);

        service.delete("P001").unwrap();
        assert!(matches!(service.get("P001"), Err(PatientError::NotFound(_))));
        assert_eq!(service.list_all().unwrap().len(), 1);
    }

    #[test]
    fn sort_by_bmi_desc() {
        let service = service();
        // bmi 18.0, 30.5, 22.1 with height 1.0
        service.create(new_patient("low", 1.0, 18.0)).unwrap();
        service.create(new_patient("high", 1.0, 30.5)).unwrap();
        service.create(new_patient("mid", 1.0, 22.1)).unwrap();

        let sorted = service.sort_by("bmi", Some("desc")).unwrap();
        let bmis: Vec<f64> = sorted.iter().filter_map(|v| v.bmi).collect();
        assert_eq!(bmis, [30.5, 22.1, 18.0]);

        let sorted = service.sort_by("bmi", None).unwrap();
        let bmis: Vec<f64> = sorted.iter().filter_map(|v| v.bmi).collect();
        assert_eq!(bmis, [18.0, 22.1, 30.5]);
    }

    #[test]
    fn sort_rejects_unknown_field_or_order() {
        let service = service();
        assert!(matches!(
            service.sort_by("color", None),
            Err(PatientError::InvalidArgument(_))
        ));
        assert!(matches!(
            service.sort_by("height", Some("sideways")),
            Err(PatientError::InvalidArgument(_))
        ));
    }

    #[test]
    fn end_to_end_on_file_store() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = CoreConfig::new(temp_dir.path().join("patients.json")).unwrap();
        let service = RecordService::from_config(&cfg);

        let created = service.create(new_patient("P001", 1.75, 70.0)).unwrap();
        assert_eq!(created.bmi, Some(22.86));
        assert_eq!(created.verdict, Some(Verdict::Normal));

        // A fresh service over the same file sees the write.
        let reopened = RecordService::from_config(&cfg);
        let updated = reopened
            .update(
                "P001",
                PatientUpdate {
                    weight: Some(100.0),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.bmi, Some(32.65));
        assert_eq!(updated.verdict, Some(Verdict::Obese));

        service.delete("P001").unwrap();
        assert!(matches!(reopened.get("P001"), Err(PatientError::NotFound(_))));
    }

    #[test]
    fn incomplete_stored_record_does_not_block_other_operations() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("patients.json");
        std::fs::write(
            &path,
            r#"{
  "OLD": {"name": "B", "city": "Y", "age": 40, "gender": "female", "weight": 90.0},
  "P002": {"name": "A", "city": "X", "age": 30, "gender": "male", "height": 1.75, "weight": 70.0}
}"#,
        )
        .unwrap();
        let cfg = CoreConfig::new(path.clone()).unwrap();
        let service = RecordService::from_config(&cfg);

        let sorted = service.sort_by("weight", Some("desc")).unwrap();
        let ids: Vec<&str> = sorted.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, ["OLD", "P002"]);

        let sorted = service.sort_by("height", None).unwrap();
        let ids: Vec<&str> = sorted.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, ["OLD", "P002"]);

        assert_eq!(service.get("P002").unwrap().bmi, Some(22.86));
        assert_eq!(service.get("OLD").unwrap().height, None);
        service.create(new_patient("P003", 1.6, 50.0)).unwrap();
        assert_eq!(service.list_all().unwrap().len(), 3);

        // Strict validation applies once the record is edited.
        let partial = PatientUpdate {
            city: Some("Z".into()),
            ..Default::default()
        };
        assert!(matches!(
            service.update("OLD", partial),
            Err(PatientError::Validation { field: "height", .. })
        ));
        let repaired = service
            .update(
                "OLD",
                PatientUpdate {
                    height: Some(2.0),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(repaired.bmi, Some(22.5));

        service.delete("OLD").unwrap();
        assert_eq!(service.list_all().unwrap().len(), 2);
    }

    #[test]
    fn concurrent_creates_are_not_lost() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = CoreConfig::new(temp_dir.path().join("patients.json")).unwrap();
        let service = RecordService::from_config(&cfg);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let service = service.clone();
                thread::spawn(move || {
                    service
                        .create(new_patient(&format!("P{i:03}"), 1.7, 60.0 + i as f64))
                        .expect("create should succeed");
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("thread should not panic");
        }

        assert_eq!(service.list_all().unwrap().len(), 8);
    }
}
