//! Integration test: load, train, predict and save end-to-end

use calorie_predictor::data::{build_training_data, DatasetConfig, DatasetLoader, FeatureVector, Gender};
use calorie_predictor::error::CalorieError;
use calorie_predictor::history::{load_history, save_prediction, PredictionRecord};
use calorie_predictor::inference::{duration_curve, predict, predict_frame, Activity};
use calorie_predictor::training::{train_and_evaluate, ModelKind, TrainEngine, TrainingConfig};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::fmt::Write as _;
use std::path::PathBuf;

const N_EXERCISE: usize = 120;

/// Per-test scratch directory under the system temp dir
fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("calorie_it_{}_{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn exercise_csv(skip_column: Option<&str>) -> String {
    let columns = ["User_ID", "Gender", "Age", "Height", "Weight", "Duration", "Heart_Rate", "Body_Temp"];
    let keep: Vec<usize> = (0..columns.len())
        .filter(|&c| Some(columns[c]) != skip_column)
        .collect();

    let mut out = keep.iter().map(|&c| columns[c]).collect::<Vec<_>>().join(",");
    out.push('\n');
    for i in 0..N_EXERCISE {
        let row = [
            format!("{}", 10_000 + i),
            (if i % 2 == 0 { "male" } else { "female" }).to_string(),
            format!("{}", 20 + i % 50),
            format!("{}", 155 + (i * 7) % 45),
            format!("{}", 50 + (i * 11) % 50),
            format!("{}", 5 + (i * 13) % 26),
            format!("{}", 80 + (i * 5) % 40),
            format!("{:.1}", 38.0 + (i % 20) as f64 * 0.15),
        ];
        let fields: Vec<&str> = keep.iter().map(|&c| row[c].as_str()).collect();
        writeln!(out, "{}", fields.join(",")).unwrap();
    }
    out
}

fn calories_for(i: usize) -> f64 {
    let duration = (5 + (i * 13) % 26) as f64;
    let heart_rate = (80 + (i * 5) % 40) as f64;
    duration * (0.08 * heart_rate - 3.0) + if i % 2 == 0 { 4.0 } else { 0.0 }
}

/// Every tenth user has no calories row; two calories rows have no exercise row
fn calories_csv() -> String {
    let mut out = String::from("User_ID,Calories\n");
    for i in (0..N_EXERCISE).rev().filter(|i| i % 10 != 3) {
        writeln!(out, "{},{:.1}", 10_000 + i, calories_for(i)).unwrap();
    }
    out.push_str("99001,50.0\n99002,75.0\n");
    out
}

fn write_dataset(name: &str, exercise: &str, calories: &str) -> DatasetConfig {
    let dir = scratch(name);
    let exercise_path = dir.join("Exercise.csv");
    let calories_path = dir.join("Calories.csv");
    std::fs::write(&exercise_path, exercise).unwrap();
    std::fs::write(&calories_path, calories).unwrap();
    DatasetConfig::new(exercise_path, calories_path)
}

fn fixture(name: &str) -> DatasetConfig {
    write_dataset(name, &exercise_csv(None), &calories_csv())
}

fn small_config() -> TrainingConfig {
    TrainingConfig::new().with_n_estimators(10)
}

fn reference_vector() -> FeatureVector {
    FeatureVector::from_measurements(Gender::Male, 30.0, 170.0, 70.0, 45.0, 100.0, 37.0)
}

#[test]
fn test_join_keeps_ids_present_in_both_sources() {
    let config = fixture("join");
    let data = DatasetLoader::new(config).load().unwrap();

    assert_eq!(data.n_exercise_rows, N_EXERCISE);
    assert_eq!(data.n_calorie_rows, 110);
    assert_eq!(data.n_rows(), 108);
    assert_eq!(data.x.ncols(), 8);

    // First exercise row (id 10000, male, 155 cm, 50 kg)
    assert_eq!(data.x[[0, 0]], 0.0);
    assert!((data.x[[0, 7]] - 50.0 / (1.55 * 1.55)).abs() < 1e-9);
    assert!((data.y[0] - calories_for(0)).abs() < 0.051);
}

#[test]
fn test_missing_column_is_data_error() {
    let config = write_dataset("missing", &exercise_csv(Some("Heart_Rate")), &calories_csv());
    let err = build_training_data(&config).unwrap_err();
    assert!(matches!(err, CalorieError::DataError(_)), "got {err}");
    assert!(err.to_string().contains("Heart_Rate"));
}

#[test]
fn test_disjoint_ids_is_data_error() {
    let config = write_dataset("disjoint", &exercise_csv(None), "User_ID,Calories\n1,10.0\n2,20.0\n");
    assert!(matches!(build_training_data(&config), Err(CalorieError::DataError(_))));
}

#[test]
fn test_missing_file_is_data_error() {
    let config = DatasetConfig::new(scratch("nofile").join("absent.csv"), "also_absent.csv");
    assert!(matches!(build_training_data(&config), Err(CalorieError::DataError(_))));
}

#[test]
fn test_unmapped_gender_is_data_error() {
    let exercise = exercise_csv(None).replacen("female", "unknown", 1);
    let config = write_dataset("gender", &exercise, &calories_csv());
    let err = build_training_data(&config).unwrap_err();
    assert!(err.to_string().contains("unknown"), "got {err}");
}

#[test]
fn test_same_seed_same_split_and_linear_metrics() {
    let (x, y) = build_training_data(&fixture("determinism")).unwrap();
    let engine = TrainEngine::new(small_config());

    let a = engine.train_and_evaluate(&x, &y).unwrap();
    let b = engine.train_and_evaluate(&x, &y).unwrap();

    assert_eq!(a.split(), b.split());
    let la = &a.get(ModelKind::LinearRegression).unwrap().metrics;
    let lb = &b.get(ModelKind::LinearRegression).unwrap().metrics;
    assert_eq!(la.mae, lb.mae);
    assert_eq!(la.r2, lb.r2);
    assert_eq!(a.split().n_test(), 22);
}

#[test]
fn test_metrics_bounds_and_model_order() {
    let (x, y) = build_training_data(&fixture("bounds")).unwrap();
    let models = TrainEngine::new(small_config()).train_and_evaluate(&x, &y).unwrap();

    let names: Vec<&str> = models.iter().map(|r| r.model.name()).collect();
    assert_eq!(names, vec!["Linear Regression", "Random Forest", "XGBoost"]);

    for result in &models {
        assert!(result.metrics.mae >= 0.0, "{} MAE {}", result.model.name(), result.metrics.mae);
        assert!(result.metrics.r2 <= 1.0, "{} R² {}", result.model.name(), result.metrics.r2);
    }
}

#[test]
fn test_reference_vector_through_every_model() {
    let (x, y) = build_training_data(&fixture("reference")).unwrap();
    let models = train_and_evaluate(&x, &y).unwrap();
    assert_eq!(models.len(), 3);

    let features = reference_vector();
    assert!((features.bmi - 24.22).abs() < 0.01);

    for result in &models {
        let raw = predict(&result.model, &features).unwrap();
        assert!(raw.is_finite() && raw >= 0.0, "{}: {}", result.model.name(), raw);
        assert_eq!(Activity::Running.apply(raw), raw * 1.3);
    }
}

#[test]
fn test_duration_curve_has_twelve_points() {
    let (x, y) = build_training_data(&fixture("curve")).unwrap();
    let models = TrainEngine::new(small_config()).train_and_evaluate(&x, &y).unwrap();
    let model = &models.get(ModelKind::XGBoost).unwrap().model;

    let curve = duration_curve(model, &reference_vector(), Activity::Yoga).unwrap();
    let durations: Vec<f64> = curve.iter().map(|p| p.duration).collect();
    assert_eq!(durations, (1..=12).map(|k| k as f64 * 10.0).collect::<Vec<_>>());
    assert!(curve.iter().all(|p| p.calories >= 0.0));
}

#[test]
fn test_shape_mismatch_names_the_model() {
    let x = Array2::from_shape_fn((30, 7), |(r, c)| (r + c) as f64);
    let y = Array1::from_shape_fn(30, |r| r as f64);

    let err = train_and_evaluate(&x, &y).unwrap_err();
    match err {
        CalorieError::TrainingError { model, .. } => assert_eq!(model, "Linear Regression"),
        other => panic!("expected TrainingError, got {other}"),
    }
}

#[test]
fn test_frame_with_wrong_schema_is_inference_error() {
    let (x, y) = build_training_data(&fixture("schema")).unwrap();
    let models = TrainEngine::new(small_config()).train_and_evaluate(&x, &y).unwrap();
    let model = &models.primary().unwrap().model;

    let missing_bmi = df!(
        "Gender" => &[0.0],
        "Age" => &[30.0],
        "Height" => &[170.0],
        "Weight" => &[70.0],
        "Duration" => &[45.0],
        "Heart_Rate" => &[100.0],
        "Body_Temp" => &[37.0]
    )
    .unwrap();

    assert!(matches!(
        predict_frame(model, &missing_bmi),
        Err(CalorieError::InferenceError(_))
    ));
}

#[test]
fn test_second_save_overwrites_first() {
    let path = scratch("history").join("calorie_prediction_history.csv");
    let first = PredictionRecord {
        gender: Gender::Male,
        age: 30,
        activity: Activity::Walking,
        calories_burned: 180.0,
    };
    let second = PredictionRecord {
        gender: Gender::Female,
        age: 52,
        activity: Activity::Cycling,
        calories_burned: 240.5,
    };

    save_prediction(&path, &first).unwrap();
    save_prediction(&path, &second).unwrap();

    let rows = load_history(&path).unwrap();
    assert_eq!(rows, vec![second]);
}
