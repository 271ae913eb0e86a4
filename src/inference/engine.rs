//! Single-row and batch prediction through a trained model

use super::activity::Activity;
use crate::data::{FeatureVector, FEATURE_COLUMNS, N_FEATURES};
use crate::error::{CalorieError, Result};
use crate::training::TrainedModel;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Durations, in minutes, sampled by [`duration_curve`]
pub const CURVE_DURATIONS: [f64; 12] = [
    10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0, 110.0, 120.0,
];

/// One point of a calories-vs-duration curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub duration: f64,
    pub calories: f64,
}

fn check_schema(model: &TrainedModel) -> Result<()> {
    let names = model.feature_names();
    if names.len() != N_FEATURES || names.iter().zip(FEATURE_COLUMNS.iter()).any(|(a, b)| a != b) {
        return Err(CalorieError::InferenceError(format!(
            "{} was trained on features {:?}, expected {:?}",
            model.name(),
            names,
            FEATURE_COLUMNS
        )));
    }
    Ok(())
}

/// Negative burn is not meaningful
fn floor_at_zero(raw: f64) -> f64 {
    raw.max(0.0)
}

/// Estimate calories for one feature vector, floored at zero
pub fn predict(model: &TrainedModel, features: &FeatureVector) -> Result<f64> {
    check_schema(model)?;

    let output = model
        .predict(&features.to_row())
        .map_err(|e| CalorieError::InferenceError(format!("{}: {}", model.name(), e)))?;

    match output.first() {
        Some(&raw) if raw.is_finite() => Ok(floor_at_zero(raw)),
        Some(&raw) => Err(CalorieError::InferenceError(format!(
            "{} produced a non-finite estimate ({})",
            model.name(),
            raw
        ))),
        None => Err(CalorieError::InferenceError(format!(
            "{} returned no estimate",
            model.name()
        ))),
    }
}

/// Estimate calories for every row of a frame laid out exactly as [`FEATURE_COLUMNS`]
///
/// Columns are neither reordered nor renamed; any difference in names or
/// order is an [`CalorieError::InferenceError`].
pub fn predict_frame(model: &TrainedModel, df: &DataFrame) -> Result<Array1<f64>> {
    check_schema(model)?;

    let names: Vec<String> = df.get_column_names().into_iter().map(|n| n.to_string()).collect();
    if names.len() != N_FEATURES || names.iter().zip(FEATURE_COLUMNS.iter()).any(|(a, b)| a != b) {
        return Err(CalorieError::InferenceError(format!(
            "frame columns {:?} do not match feature schema {:?}",
            names, FEATURE_COLUMNS
        )));
    }

    let x = frame_to_matrix(df)?;
    let output = model
        .predict(&x)
        .map_err(|e| CalorieError::InferenceError(format!("{}: {}", model.name(), e)))?;
    Ok(output.mapv(floor_at_zero))
}

fn frame_to_matrix(df: &DataFrame) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let mut x = Array2::zeros((n_rows, N_FEATURES));

    for (c, column) in df.get_columns().iter().enumerate() {
        let cast = column.cast(&DataType::Float64).map_err(|e| {
            CalorieError::InferenceError(format!("column '{}' is not numeric: {}", column.name(), e))
        })?;
        let values = cast
            .f64()
            .map_err(|e| CalorieError::InferenceError(e.to_string()))?;

        for (r, value) in values.into_iter().enumerate() {
            x[[r, c]] = value.ok_or_else(|| {
                CalorieError::InferenceError(format!(
                    "column '{}' has a missing value at row {}",
                    column.name(),
                    r
                ))
            })?;
        }
    }

    Ok(x)
}

/// Activity-scaled estimates for 10 to 120 minutes with every other feature held fixed
pub fn duration_curve(
    model: &TrainedModel,
    features: &FeatureVector,
    activity: Activity,
) -> Result<Vec<CurvePoint>> {
    CURVE_DURATIONS
        .iter()
        .map(|&duration| {
            let raw = predict(model, &features.with_duration(duration))?;
            Ok(CurvePoint {
                duration,
                calories: activity.apply(raw),
            })
        })
        .collect()
}
