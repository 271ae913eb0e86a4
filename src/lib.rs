//! Calorie Burn Predictor
//!
//! Trains regression models on a workout dataset and estimates the calories a
//! workout burns.
//!
//! # Modules
//!
//! - [`data`] - Load and join the exercise and calories CSVs, derive BMI, build features
//! - [`training`] - Seeded train/test split, Linear Regression, Random Forest and XGBoost, MAE and R²
//! - [`inference`] - Single and batch prediction, activity multipliers, health readouts
//! - [`history`] - One-row CSV holding the latest saved estimate
//! - [`cli`] - Command-line interface and interactive form
//!
//! # Example
//!
//! ```no_run
//! use calorie_predictor::prelude::*;
//!
//! # fn main() -> calorie_predictor::Result<()> {
//! let (x, y) = build_training_data(&DatasetConfig::default())?;
//! let models = train_and_evaluate(&x, &y)?;
//!
//! let features = FeatureVector::from_measurements(Gender::Male, 30.0, 170.0, 70.0, 45.0, 100.0, 37.0);
//! for result in &models {
//!     let kcal = Activity::Running.apply(predict(&result.model, &features)?);
//!     println!("{}: {:.1} kcal (MAE {:.2})", result.model.name(), kcal, result.metrics.mae);
//! }
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Pipeline
pub mod data;
pub mod training;
pub mod inference;

// Presentation
pub mod history;
pub mod cli;

pub use error::{CalorieError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{CalorieError, Result};

    // Data
    pub use crate::data::{build_training_data, DatasetConfig, DatasetLoader, FeatureVector, Gender, FEATURE_COLUMNS};

    // Training
    pub use crate::training::{train_and_evaluate, ModelKind, TrainEngine, TrainedModel, TrainedModels, TrainingConfig};

    // Inference
    pub use crate::inference::{duration_curve, predict, predict_frame, Activity, BmiStatus, BurnLevel};

    // History
    pub use crate::history::{load_history, save_prediction, PredictionRecord};
}
