//! Sort keys and directions accepted by the record service.

use crate::patient::PatientView;
use crate::PatientError;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Numeric field a listing can be ordered by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortField {
    Height,
    Weight,
    Bmi,
}

impl SortField {
    pub const ALL: [SortField; 3] = [SortField::Height, SortField::Weight, SortField::Bmi];

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Height => "height",
            SortField::Weight => "weight",
            SortField::Bmi => "bmi",
        }
    }

    /// Value of this field on `view`. A record without the value compares as 0.
    pub fn key(self, view: &PatientView) -> f64 {
        let value = match self {
            SortField::Height => view.height,
            SortField::Weight => view.weight,
            SortField::Bmi => view.bmi,
        };
        value.unwrap_or(0.0)
    }
}

impl FromStr for SortField {
    type Err = PatientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = SortField::ALL.iter().map(|f| f.as_str()).collect();
                PatientError::InvalidArgument(format!(
                    "invalid field '{}', choose from {:?}",
                    s, valid
                ))
            })
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a sort. Ascending unless stated otherwise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    /// Parses an optional order, defaulting to ascending when absent.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::InvalidArgument` for anything other than `asc` or `desc`.
    pub fn parse_or_default(value: Option<&str>) -> Result<Self, PatientError> {
        value.map_or(Ok(SortOrder::default()), str::parse::<SortOrder>)
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for SortOrder {
    type Err = PatientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(PatientError::InvalidArgument(format!(
                "invalid order '{}', use 'asc' or 'desc'",
                other
            ))),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable in-place sort of `views` by `field`.
///
/// Records with equal keys keep their relative order in both directions.
pub fn sort_views(views: &mut [PatientView], field: SortField, order: SortOrder) {
    views.sort_by(|a, b| order.apply(field.key(a).total_cmp(&field.key(b))));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patient::{PatientFields, StoredRecord};

    fn view(id: &str, height: f64, weight: f64) -> PatientView {
        PatientView::new(
            id,
            &PatientFields::new("A", "X", 30, "male", height, weight).unwrap(),
        )
    }

    fn ids(views: &[PatientView]) -> Vec<&str> {
        views.iter().map(|v| v.id.as_str()).collect()
    }

    #[test]
    fn parses_known_fields_and_orders() {
        assert_eq!("bmi".parse::<SortField>().unwrap(), SortField::Bmi);
        assert_eq!("height".parse::<SortField>().unwrap(), SortField::Height);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert_eq!(SortOrder::parse_or_default(None).unwrap(), SortOrder::Asc);
    }

    #[test]
    fn rejects_unknown_field_and_order() {
        assert!(matches!(
            "color".parse::<SortField>(),
            Err(PatientError::InvalidArgument(_))
        ));
        assert!(matches!(
            SortOrder::parse_or_default(Some("up")),
            Err(PatientError::InvalidArgument(_))
        ));
        // Matching is exact.
        assert!("BMI".parse::<SortField>().is_err());
    }

    #[test]
    fn desc_is_stable_for_ties() {
        let mut views = vec![
            view("a", 1.7, 60.0),
            view("b", 1.8, 70.0),
            view("c", 1.6, 70.0),
            view("d", 1.5, 50.0),
        ];
        sort_views(&mut views, SortField::Weight, SortOrder::Desc);
        assert_eq!(ids(&views), ["b", "c", "a", "d"]);

        sort_views(&mut views, SortField::Weight, SortOrder::Asc);
        assert_eq!(ids(&views), ["d", "a", "b", "c"]);
    }

    #[test]
    fn missing_value_sorts_as_zero() {
        let raw = serde_json::json!({"name": "Old", "weight": 55.0});
        let serde_json::Value::Object(raw) = raw else {
            panic!("object literal");
        };
        let legacy = StoredRecord::from_raw("old", raw).view("old");

        let mut views = vec![view("a", 1.7, 60.0), legacy, view("b", 1.5, 50.0)];
        sort_views(&mut views, SortField::Height, SortOrder::Asc);
        assert_eq!(ids(&views), ["old", "b", "a"]);

        sort_views(&mut views, SortField::Bmi, SortOrder::Desc);
        assert_eq!(ids(&views), ["b", "a", "old"]);
    }
}
