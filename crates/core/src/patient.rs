//! Patient record model.
//!
//! Responsibilities:
//! - Define the validated domain type ([`Patient`], [`PatientFields`])
//! - Define the strict wire model used by the store file
//! - Hold records read from the store as [`StoredRecord`], complete or not
//! - Derive BMI and verdict on demand, never storing them
//!
//! Notes:
//! - The stored form omits `id` (it is the collection key) and the derived fields
//! - Older store files may carry `bmi`/`verdict` keys; they are ignored on load
//! - A stored object that does not hold a valid patient is kept verbatim as
//!   [`StoredRecord::Incomplete`] and written back unchanged

use crate::constants::BMI_DECIMALS;
use crate::validation::{validate_age, validate_gender, validate_measure, validate_text};
use crate::{PatientError, PatientResult};
use pms_types::{Gender, NonEmptyText, Verdict};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Public domain-level types
// ============================================================================

/// Raw field values for a patient that does not exist yet.
///
/// Nothing here is trusted; [`Patient::new`] validates every field.
#[derive(Clone, Debug, PartialEq)]
pub struct NewPatient {
    pub id: String,
    pub name: String,
    pub city: String,
    pub age: i64,
    pub gender: String,
    pub height: f64,
    pub weight: f64,
}

/// Validated, stored fields of a patient (everything except the id).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredPatient", into = "StoredPatient")]
pub struct PatientFields {
    name: NonEmptyText,
    city: NonEmptyText,
    age: u8,
    gender: Gender,
    height: f64,
    weight: f64,
}

impl PatientFields {
    /// Validates raw values into stored fields.
    ///
    /// Fields are checked in declaration order and the first failure is returned.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::Validation` naming the first field that violates its constraint.
    /// A height and weight whose BMI is not a finite number are reported against `height`.
    pub fn new(
        name: &str,
        city: &str,
        age: i64,
        gender: &str,
        height: f64,
        weight: f64,
    ) -> PatientResult<Self> {
        let fields = Self {
            name: validate_text("name", name)?,
            city: validate_text("city", city)?,
            age: validate_age(age)?,
            gender: validate_gender(gender)?,
            height: validate_measure("height", height)?,
            weight: validate_measure("weight", weight)?,
        };

        if !fields.bmi().is_finite() {
            return Err(PatientError::validation(
                "height",
                format!("height {} and weight {} do not give a finite BMI", height, weight),
            ));
        }
        Ok(fields)
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn city(&self) -> &str {
        self.city.as_str()
    }

    pub fn age(&self) -> u8 {
        self.age
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    /// Height in metres.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Weight in kilograms.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn bmi(&self) -> f64 {
        bmi(self.height, self.weight)
    }

    pub fn verdict(&self) -> Verdict {
        Verdict::from_bmi(self.bmi())
    }
}

/// A complete, validated patient.
#[derive(Clone, Debug, PartialEq)]
pub struct Patient {
    pub id: NonEmptyText,
    pub fields: PatientFields,
}

impl Patient {
    /// Validates a new patient, including its id.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::Validation` if the id or any field is invalid.
    pub fn new(input: NewPatient) -> PatientResult<Self> {
        let id = validate_text("id", &input.id)?;
        let fields = PatientFields::new(
            &input.name,
            &input.city,
            input.age,
            &input.gender,
            input.height,
            input.weight,
        )?;
        Ok(Self { id, fields })
    }

    pub fn view(&self) -> PatientView {
        PatientView::new(self.id.as_str(), &self.fields)
    }
}

/// A patient as presented to callers: stored fields plus derived BMI and verdict.
///
/// Every field is present for a complete record. An incomplete record shows only the
/// values it holds in a usable form; absent values are left out when serialised.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PatientView {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
}

impl PatientView {
    /// Builds the presentation form, computing the derived fields.
    pub fn new(id: &str, fields: &PatientFields) -> Self {
        let bmi = fields.bmi();
        Self {
            id: id.to_owned(),
            name: Some(fields.name().to_owned()),
            city: Some(fields.city().to_owned()),
            age: Some(fields.age()),
            gender: Some(fields.gender()),
            height: Some(fields.height()),
            weight: Some(fields.weight()),
            bmi: Some(bmi),
            verdict: Some(Verdict::from_bmi(bmi)),
        }
    }
}

// ============================================================================
// Stored records
// ============================================================================

/// One record as read from the store.
///
/// Records written by this crate are always `Complete`. Older files can hold objects that
/// miss a field or carry an out-of-range value; those load as `Incomplete` so the rest of
/// the collection stays usable. An update that supplies the missing values turns an
/// incomplete record back into a complete one.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StoredRecord {
    Complete(PatientFields),
    Incomplete(Map<String, Value>),
}

impl StoredRecord {
    /// Reads a stored object, falling back to `Incomplete` when it is not a valid patient.
    pub fn from_raw(id: &str, raw: Map<String, Value>) -> Self {
        match PatientFields::deserialize(&Value::Object(raw.clone())) {
            Ok(fields) => StoredRecord::Complete(fields),
            Err(e) => {
                tracing::warn!("stored patient {} is incomplete: {}", id, e);
                StoredRecord::Incomplete(raw)
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, StoredRecord::Complete(_))
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            StoredRecord::Complete(fields) => Some(fields.name()),
            StoredRecord::Incomplete(raw) => raw.get("name").and_then(Value::as_str),
        }
    }

    pub fn city(&self) -> Option<&str> {
        match self {
            StoredRecord::Complete(fields) => Some(fields.city()),
            StoredRecord::Incomplete(raw) => raw.get("city").and_then(Value::as_str),
        }
    }

    pub fn age(&self) -> Option<i64> {
        match self {
            StoredRecord::Complete(fields) => Some(i64::from(fields.age())),
            StoredRecord::Incomplete(raw) => raw.get("age").and_then(Value::as_i64),
        }
    }

    pub fn gender(&self) -> Option<&str> {
        match self {
            StoredRecord::Complete(fields) => Some(fields.gender().as_str()),
            StoredRecord::Incomplete(raw) => raw.get("gender").and_then(Value::as_str),
        }
    }

    pub fn height(&self) -> Option<f64> {
        match self {
            StoredRecord::Complete(fields) => Some(fields.height()),
            StoredRecord::Incomplete(raw) => raw.get("height").and_then(Value::as_f64),
        }
    }

    pub fn weight(&self) -> Option<f64> {
        match self {
            StoredRecord::Complete(fields) => Some(fields.weight()),
            StoredRecord::Incomplete(raw) => raw.get("weight").and_then(Value::as_f64),
        }
    }

    /// Presentation form of this record under `id`.
    pub fn view(&self, id: &str) -> PatientView {
        if let StoredRecord::Complete(fields) = self {
            return PatientView::new(id, fields);
        }

        let bmi = match (self.height(), self.weight()) {
            (Some(height), Some(weight)) if height > 0.0 && weight > 0.0 => {
                Some(bmi(height, weight)).filter(|value| value.is_finite())
            }
            _ => None,
        };
        PatientView {
            id: id.to_owned(),
            name: self.name().map(str::to_owned),
            city: self.city().map(str::to_owned),
            age: self.age().and_then(|age| u8::try_from(age).ok()),
            gender: self.gender().and_then(|gender| gender.parse().ok()),
            height: self.height(),
            weight: self.weight(),
            bmi,
            verdict: bmi.map(Verdict::from_bmi),
        }
    }
}

impl From<PatientFields> for StoredRecord {
    fn from(fields: PatientFields) -> Self {
        StoredRecord::Complete(fields)
    }
}

/// Body mass index, `weight / height²`, rounded to two decimals.
///
/// Rounding is round-half-to-even on the scaled value (`f64::round_ties_even`).
pub fn bmi(height: f64, weight: f64) -> f64 {
    round_ties_even(weight / (height * height), BMI_DECIMALS)
}

fn round_ties_even(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

// ============================================================================
// Wire model
// ============================================================================

/// Store-file representation of one record.
///
/// Unknown keys are tolerated so files written with derived fields still load.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredPatient {
    name: String,
    city: String,
    age: i64,
    gender: String,
    height: f64,
    weight: f64,
}

impl TryFrom<StoredPatient> for PatientFields {
    type Error = PatientError;

    fn try_from(wire: StoredPatient) -> Result<Self, Self::Error> {
        PatientFields::new(
            &wire.name,
            &wire.city,
            wire.age,
            &wire.gender,
            wire.height,
            wire.weight,
        )
    }
}

impl From<PatientFields> for StoredPatient {
    fn from(fields: PatientFields) -> Self {
        Self {
            name: fields.name.into_string(),
            city: fields.city.into_string(),
            age: i64::from(fields.age),
            gender: fields.gender.as_str().to_owned(),
            height: fields.height,
            weight: fields.weight,
        }
    }
}
