//! Request and response bodies.
//!
//! Request bodies reject unknown keys, which keeps callers from supplying `bmi`, `verdict`
//! or (on update) `id`.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Liveness response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Plain informational or confirmation message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MessageRes {
    #[schema(example = "Patient created successfully")]
    pub message: String,
}

impl MessageRes {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error body returned with every non-2xx status.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    #[schema(example = "Patient not found")]
    pub detail: String,
}

/// Body of `POST /create`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreatePatientReq {
    /// ID of the patient
    #[schema(example = "P001")]
    pub id: String,
    /// Name of the patient
    pub name: String,
    /// City of the patient
    pub city: String,
    /// Age of the patient, 1 to 119
    #[schema(example = 30)]
    pub age: i64,
    /// One of `male`, `female`, `others`
    #[schema(example = "male")]
    pub gender: String,
    /// Height in metres
    #[schema(example = 1.75)]
    pub height: f64,
    /// Weight in kilograms
    #[schema(example = 70.0)]
    pub weight: f64,
}

/// Body of `PUT /edit/{id}`. Absent or null fields are left unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default, deny_unknown_fields)]
pub struct UpdatePatientReq {
    pub name: Option<String>,
    pub city: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
}

/// A patient with derived BMI and verdict.
///
/// Records written by this service carry every field. A record from an older store file
/// may lack some; absent values are omitted, and `bmi`/`verdict` need height and weight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PatientRes {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[schema(example = 22.86)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,
    #[schema(example = "Normal")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<String>,
}

/// Every patient keyed by id, serialised as a JSON object in collection order.
#[derive(Clone, Debug, Default, PartialEq, ToSchema)]
pub struct PatientMapRes(#[schema(value_type = Object)] pub Vec<PatientRes>);

impl Serialize for PatientMapRes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for patient in &self.0 {
            map.serialize_entry(&patient.id, patient)?;
        }
        map.end()
    }
}

/// Query string of `GET /sort`.
#[derive(Clone, Debug, PartialEq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SortQuery {
    /// Sort by `height`, `weight` or `bmi`
    pub sort_by: String,
    /// Sort order: `asc` (default) or `desc`
    pub order: Option<String>,
}
