//! Per-field input validation.
//!
//! Each function checks one raw value against one field constraint and returns the
//! validated form. Failures are reported as [`PatientError::Validation`] carrying the
//! field name, so callers can tell the user exactly what to correct.
//!
//! The one cross-field rule, a finite BMI, is checked by `PatientFields::new`.

use crate::constants::{MAX_AGE_EXCLUSIVE, MIN_AGE_EXCLUSIVE};
use crate::{PatientError, PatientResult};
use pms_types::{Gender, NonEmptyText};

/// Takes a field value that must be present.
///
/// # Errors
///
/// Returns `PatientError::Validation` if `value` is `None`.
pub fn require<T>(field: &'static str, value: Option<T>) -> PatientResult<T> {
    value.ok_or_else(|| PatientError::validation(field, "field required"))
}

/// Validates a free-text field such as `name` or `city`.
///
/// # Errors
///
/// Returns `PatientError::Validation` if the value is empty after trimming.
pub fn validate_text(field: &'static str, value: &str) -> PatientResult<NonEmptyText> {
    NonEmptyText::new(value).map_err(|e| PatientError::validation(field, e.to_string()))
}

/// Validates `age`, which must lie strictly between 0 and 120.
///
/// # Errors
///
/// Returns `PatientError::Validation` if the age is out of range.
pub fn validate_age(value: i64) -> PatientResult<u8> {
    if value <= MIN_AGE_EXCLUSIVE || value >= MAX_AGE_EXCLUSIVE {
        return Err(PatientError::validation(
            "age",
            format!(
                "must be greater than {} and less than {}, got {}",
                MIN_AGE_EXCLUSIVE, MAX_AGE_EXCLUSIVE, value
            ),
        ));
    }

    u8::try_from(value).map_err(|e| PatientError::validation("age", e.to_string()))
}

/// Validates a body measurement (`height` in metres or `weight` in kilograms).
///
/// # Errors
///
/// Returns `PatientError::Validation` if the value is not a finite number above zero.
pub fn validate_measure(field: &'static str, value: f64) -> PatientResult<f64> {
    if !value.is_finite() {
        return Err(PatientError::validation(field, "must be a finite number"));
    }
    if value <= 0.0 {
        return Err(PatientError::validation(
            field,
            format!("must be greater than 0, got {}", value),
        ));
    }
    Ok(value)
}

/// Validates `gender` against its wire spelling.
///
/// # Errors
///
/// Returns `PatientError::Validation` if the value is not `male`, `female` or `others`.
pub fn validate_gender(value: &str) -> PatientResult<Gender> {
    value
        .parse::<Gender>()
        .map_err(|e| PatientError::validation("gender", e.to_string()))
}
