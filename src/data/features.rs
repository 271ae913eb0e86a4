//! Feature schema shared by training and inference
//!
//! Every feature vector fed to a model, whether it comes from a joined training
//! row or from form input, is built by the functions in this module so that the
//! Gender encoding and the BMI derivation cannot drift between the two paths.

use crate::error::{CalorieError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Model input columns, in the order models are trained on
pub const FEATURE_COLUMNS: [&str; 8] = [
    "Gender",
    "Age",
    "Height",
    "Weight",
    "Duration",
    "Heart_Rate",
    "Body_Temp",
    "BMI",
];

/// Number of model input columns
pub const N_FEATURES: usize = FEATURE_COLUMNS.len();

/// Biological sex as recorded in the exercise dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Numeric encoding used as the first feature: male = 0, female = 1
    pub fn code(self) -> f64 {
        match self {
            Gender::Male => 0.0,
            Gender::Female => 1.0,
        }
    }

    /// Inverse of [`Gender::code`]
    pub fn from_code(code: f64) -> Result<Self> {
        if code == 0.0 {
            Ok(Gender::Male)
        } else if code == 1.0 {
            Ok(Gender::Female)
        } else {
            Err(CalorieError::DataError(format!(
                "Gender code must be 0 or 1, got {}",
                code
            )))
        }
    }

    /// Literal used in the source files
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl FromStr for Gender {
    type Err = CalorieError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(CalorieError::DataError(format!(
                "unmapped Gender category '{}' (expected 'male' or 'female')",
                other
            ))),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body mass index from height in centimetres and weight in kilograms
pub fn bmi(height_cm: f64, weight_kg: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

/// One model input row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub gender: Gender,
    pub age: f64,
    /// Centimetres
    pub height: f64,
    /// Kilograms
    pub weight: f64,
    /// Minutes
    pub duration: f64,
    /// Beats per minute
    pub heart_rate: f64,
    /// Degrees Celsius
    pub body_temp: f64,
    pub bmi: f64,
}

impl FeatureVector {
    /// Build a feature vector from raw measurements, deriving BMI
    pub fn from_measurements(
        gender: Gender,
        age: f64,
        height: f64,
        weight: f64,
        duration: f64,
        heart_rate: f64,
        body_temp: f64,
    ) -> Self {
        Self {
            gender,
            age,
            height,
            weight,
            duration,
            heart_rate,
            body_temp,
            bmi: bmi(height, weight),
        }
    }

    /// Same vector with a different workout duration; BMI is left untouched
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    /// Values in [`FEATURE_COLUMNS`] order
    pub fn values(&self) -> [f64; N_FEATURES] {
        [
            self.gender.code(),
            self.age,
            self.height,
            self.weight,
            self.duration,
            self.heart_rate,
            self.body_temp,
            self.bmi,
        ]
    }

    pub fn to_array(&self) -> Array1<f64> {
        Array1::from_vec(self.values().to_vec())
    }

    /// Single-row matrix suitable for `Regressor::predict`
    pub fn to_row(&self) -> Array2<f64> {
        self.to_array().insert_axis(ndarray::Axis(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_encoding_is_a_bijection() {
        for gender in [Gender::Male, Gender::Female] {
            let parsed: Gender = gender.as_str().parse().unwrap();
            assert_eq!(parsed, gender);
            assert_eq!(Gender::from_code(gender.code()).unwrap(), gender);
        }
        assert_eq!(Gender::Male.code(), 0.0);
        assert_eq!(Gender::Female.code(), 1.0);
    }

    #[test]
    fn test_unknown_gender_is_rejected() {
        for literal in ["Male", "FEMALE", "other", "", " male"] {
            let err = literal.parse::<Gender>().unwrap_err();
            assert!(matches!(err, CalorieError::DataError(_)), "{literal:?} -> {err}");
        }
        assert!(Gender::from_code(0.5).is_err());
    }

    #[test]
    fn test_bmi_reference_value() {
        let value = bmi(170.0, 70.0);
        assert!((value - 24.22).abs() < 0.01, "BMI = {}", value);
    }

    #[test]
    fn test_feature_order_matches_schema() {
        let fv = FeatureVector::from_measurements(Gender::Female, 30.0, 170.0, 70.0, 45.0, 100.0, 37.0);
        let values = fv.values();
        assert_eq!(values.len(), FEATURE_COLUMNS.len());
        assert_eq!(values[0], 1.0);
        assert_eq!(values[4], 45.0);
        assert_eq!(values[7], fv.bmi);

        let row = fv.to_row();
        assert_eq!(row.shape(), &[1, N_FEATURES]);
    }

    #[test]
    fn test_with_duration_keeps_bmi() {
        let fv = FeatureVector::from_measurements(Gender::Male, 30.0, 180.0, 80.0, 45.0, 100.0, 37.0);
        let longer = fv.with_duration(90.0);
        assert_eq!(longer.duration, 90.0);
        assert_eq!(longer.bmi, fv.bmi);
    }
}
