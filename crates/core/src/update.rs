//! Partial edits to an existing patient.

use crate::patient::{PatientFields, StoredRecord};
use crate::validation::require;
use crate::PatientResult;

/// All-optional projection of a patient's fields.
///
/// `None` means "leave unchanged". The id is deliberately absent: it cannot be edited.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PatientUpdate {
    pub name: Option<String>,
    pub city: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
}

impl PatientUpdate {
    /// True when no field is supplied.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.city.is_none()
            && self.age.is_none()
            && self.gender.is_none()
            && self.height.is_none()
            && self.weight.is_none()
    }

    /// Merges the supplied fields over `existing` and validates the result as a whole record.
    ///
    /// `existing` is not modified; the caller decides whether to keep the merged value. An
    /// incomplete record only merges when the update supplies every value it lacks.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::Validation` if a merged field is missing or violates its
    /// constraint.
    pub fn apply(&self, existing: &StoredRecord) -> PatientResult<PatientFields> {
        PatientFields::new(
            require("name", self.name.as_deref().or(existing.name()))?,
            require("city", self.city.as_deref().or(existing.city()))?,
            require("age", self.age.or(existing.age()))?,
            require("gender", self.gender.as_deref().or(existing.gender()))?,
            require("height", self.height.or(existing.height()))?,
            require("weight", self.weight.or(existing.weight()))?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PatientError;
    use pms_types::{Gender, Verdict};

    fn existing() -> StoredRecord {
        PatientFields::new("A", "X", 30, "male", 1.75, 70.0)
            .unwrap()
            .into()
    }

    #[test]
    fn empty_update_keeps_record() {
        let update = PatientUpdate::default();
        assert!(update.is_empty());
        assert_eq!(StoredRecord::from(update.apply(&existing()).unwrap()), existing());
    }

    #[test]
    fn weight_only_update_preserves_other_fields() {
        let update = PatientUpdate {
            weight: Some(100.0),
            ..Default::default()
        };
        let merged = update.apply(&existing()).unwrap();

        assert_eq!(merged.name(), "A");
        assert_eq!(merged.city(), "X");
        assert_eq!(merged.age(), 30);
        assert_eq!(merged.gender(), Gender::Male);
        assert_eq!(merged.height(), 1.75);
        assert_eq!(merged.weight(), 100.0);
        assert_eq!(merged.bmi(), 32.65);
        assert_eq!(merged.verdict(), Verdict::Obese);
    }

    #[test]
    fn invalid_field_fails_merge() {
        let update = PatientUpdate {
            age: Some(130),
            ..Default::default()
        };
        match update.apply(&existing()) {
            Err(PatientError::Validation { field, .. }) => assert_eq!(field, "age"),
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn incomplete_record_needs_missing_values() {
        let raw = serde_json::json!({"name":"B","city":"Y","age":40,"gender":"female","weight":55.0});
        let serde_json::Value::Object(raw) = raw else {
            panic!("object literal");
        };
        let legacy = StoredRecord::from_raw("OLD", raw);

        let weight_only = PatientUpdate {
            weight: Some(60.0),
            ..Default::default()
        };
        assert!(matches!(
            weight_only.apply(&legacy),
            Err(PatientError::Validation { field: "height", .. })
        ));

        let repair = PatientUpdate {
            height: Some(1.6),
            ..Default::default()
        };
        let merged = repair.apply(&legacy).unwrap();
        assert_eq!(merged.name(), "B");
        assert_eq!(merged.weight(), 55.0);
        assert_eq!(merged.bmi(), 21.48);
    }

    #[test]
    fn gender_update_is_validated() {
        let update = PatientUpdate {
            gender: Some("others".into()),
            city: Some("  Leeds ".into()),
            ..Default::default()
        };
        let merged = update.apply(&existing()).unwrap();
        assert_eq!(merged.gender(), Gender::Others);
        assert_eq!(merged.city(), "Leeds");

        let bad = PatientUpdate {
            gender: Some("other".into()),
            ..Default::default()
        };
        assert!(matches!(
            bad.apply(&existing()),
            Err(PatientError::Validation { field: "gender", .. })
        ));
    }
}
