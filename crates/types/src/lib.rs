//! # PMS Types
//!
//! Small validated value types shared by every crate in the workspace.
//!
//! - [`NonEmptyText`]: trimmed text that can never be blank
//! - [`Gender`]: the closed set of accepted gender values
//! - [`Verdict`]: the qualitative BMI band

use std::fmt;
use std::str::FromStr;

/// Errors raised while constructing a value type from raw input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    /// The input was empty or whitespace only.
    #[error("text cannot be empty")]
    Empty,
    /// The input is not one of the accepted gender values.
    #[error("'{0}' is not one of: male, female, others")]
    UnknownGender(String),
}

/// Text guaranteed to hold at least one non-whitespace character.
///
/// Leading and trailing whitespace is removed on construction, so two inputs that
/// differ only by padding produce equal values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Trim `input` and wrap it, rejecting blank values.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NonEmptyText::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Recorded gender of a patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Others,
}

impl Gender {
    /// Wire spelling used in requests, responses and the store file.
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Others => "others",
        }
    }
}

impl FromStr for Gender {
    type Err = TextError;

    /// Parses the exact lowercase wire spelling; no case folding is applied.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "others" => Ok(Gender::Others),
            other => Err(TextError::UnknownGender(other.to_owned())),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Qualitative band a BMI value falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Verdict {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl Verdict {
    /// Band for a BMI value. Each band includes its lower threshold.
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Verdict::Underweight
        } else if bmi < 25.0 {
            Verdict::Normal
        } else if bmi < 30.0 {
            Verdict::Overweight
        } else {
            Verdict::Obese
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Underweight => "Underweight",
            Verdict::Normal => "Normal",
            Verdict::Overweight => "Overweight",
            Verdict::Obese => "Obese",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  Pune \n").expect("should accept padded text");
        assert_eq!(text.as_str(), "Pune");
    }

    #[test]
    fn non_empty_text_rejects_blank_input() {
        assert_eq!(NonEmptyText::new("").unwrap_err(), TextError::Empty);
        assert_eq!(NonEmptyText::new(" \t ").unwrap_err(), TextError::Empty);
    }

    #[test]
    fn non_empty_text_deserialize_rejects_blank() {
        let err = serde_json::from_str::<NonEmptyText>("\"   \"").expect_err("blank should fail");
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn gender_parses_wire_spelling_only() {
        assert_eq!("male".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!("female".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!("others".parse::<Gender>().unwrap(), Gender::Others);

        let err = "Male".parse::<Gender>().expect_err("case must match");
        assert_eq!(err, TextError::UnknownGender("Male".into()));
    }

    #[test]
    fn gender_serializes_lowercase() {
        let json = serde_json::to_string(&Gender::Others).unwrap();
        assert_eq!(json, "\"others\"");
    }

    #[test]
    fn verdict_bands_include_lower_threshold() {
        assert_eq!(Verdict::from_bmi(18.49), Verdict::Underweight);
        assert_eq!(Verdict::from_bmi(18.5), Verdict::Normal);
        assert_eq!(Verdict::from_bmi(24.999), Verdict::Normal);
        assert_eq!(Verdict::from_bmi(25.0), Verdict::Overweight);
        assert_eq!(Verdict::from_bmi(29.99), Verdict::Overweight);
        assert_eq!(Verdict::from_bmi(30.0), Verdict::Obese);
    }

    #[test]
    fn verdict_serializes_capitalised() {
        let json = serde_json::to_string(&Verdict::Underweight).unwrap();
        assert_eq!(json, "\"Underweight\"");
    }
}
