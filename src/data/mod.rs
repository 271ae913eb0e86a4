//! Dataset loader and feature builder
//!
//! Reads the exercise and calories sources, joins them on `User_ID` and turns
//! each joined row into the fixed 8-column feature layout:
//! Gender, Age, Height, Weight, Duration, Heart_Rate, Body_Temp, BMI.

mod features;
mod loader;

pub use features::{bmi, FeatureVector, Gender, FEATURE_COLUMNS, N_FEATURES};
pub use loader::{
    build_from_frames, build_training_data, join_sources, load_csv, DatasetConfig, DatasetLoader,
    TrainingData, CALORIE_COLUMNS, EXERCISE_COLUMNS, ID_COLUMN, TARGET_COLUMN,
};
