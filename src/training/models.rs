//! Regressor trait and evaluation metrics

use crate::error::{CalorieError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Held-out regression metrics for one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// R-squared
    pub r2: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Training time in seconds
    pub training_time_secs: f64,
    /// Number of training samples
    pub n_train: usize,
    /// Number of evaluation samples
    pub n_test: usize,
}

impl ModelMetrics {
    /// Compute regression metrics
    pub fn compute_regression(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let n = y_true.len() as f64;
        let errors: Vec<f64> = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| p - t)
            .collect();

        let mse = errors.iter().map(|e| e * e).sum::<f64>() / n;
        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        let y_mean = y_true.iter().sum::<f64>() / n;
        let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
        let ss_res: f64 = errors.iter().map(|e| e.powi(2)).sum();

        // Constant target: only an exact fit explains it
        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };

        Self {
            mae,
            r2,
            mse,
            rmse: mse.sqrt(),
            training_time_secs: 0.0,
            n_train: 0,
            n_test: y_true.len(),
        }
    }
}

/// Uniform fit/predict capability shared by every model kind
pub trait Regressor: Send + Sync {
    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Make predictions, one per row of `x`
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Get feature importances (if available)
    fn feature_importances(&self) -> Option<Array1<f64>> {
        None
    }
}

/// Shape and finiteness checks every `fit` runs first
pub fn validate_training_input(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(CalorieError::ShapeError {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(CalorieError::InvalidInput(format!(
            "cannot fit on an empty matrix ({} x {})",
            x.nrows(),
            x.ncols()
        )));
    }
    if let Some(pos) = x.iter().position(|v| !v.is_finite()) {
        return Err(CalorieError::InvalidInput(format!(
            "non-finite feature value at row {}, column {}",
            pos / x.ncols(),
            pos % x.ncols()
        )));
    }
    if let Some(row) = y.iter().position(|v| !v.is_finite()) {
        return Err(CalorieError::InvalidInput(format!(
            "non-finite target value at row {}",
            row
        )));
    }
    Ok(())
}

/// Check that a prediction matrix has the width the model was fitted on
pub fn check_n_features(expected: usize, x: &Array2<f64>) -> Result<()> {
    if x.ncols() != expected {
        return Err(CalorieError::ShapeError {
            expected: format!("{} features", expected),
            actual: format!("{} features", x.ncols()),
        });
    }
    Ok(())
}
