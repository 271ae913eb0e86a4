//! Dataset loading and feature construction

use super::features::{bmi, Gender, N_FEATURES};
use crate::error::{CalorieError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Join key shared by both source files
pub const ID_COLUMN: &str = "User_ID";

/// Target column of the calories file
pub const TARGET_COLUMN: &str = "Calories";

/// Columns the exercise file must provide
pub const EXERCISE_COLUMNS: [&str; 8] = [
    ID_COLUMN,
    "Gender",
    "Age",
    "Height",
    "Weight",
    "Duration",
    "Heart_Rate",
    "Body_Temp",
];

/// Columns the calories file must provide
pub const CALORIE_COLUMNS: [&str; 2] = [ID_COLUMN, TARGET_COLUMN];

const ROW_INDEX: &str = "__row";

/// Location of the two source files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub exercise_path: PathBuf,
    pub calories_path: PathBuf,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            exercise_path: PathBuf::from("Exercise.csv"),
            calories_path: PathBuf::from("Calories.csv"),
        }
    }
}

impl DatasetConfig {
    pub fn new(exercise_path: impl Into<PathBuf>, calories_path: impl Into<PathBuf>) -> Self {
        Self {
            exercise_path: exercise_path.into(),
            calories_path: calories_path.into(),
        }
    }
}

/// Feature matrix and target vector produced from the joined sources
#[derive(Debug, Clone)]
pub struct TrainingData {
    /// `n_rows x 8` matrix in `FEATURE_COLUMNS` order
    pub x: Array2<f64>,
    /// Calories, row-aligned with `x`
    pub y: Array1<f64>,
    pub n_exercise_rows: usize,
    pub n_calorie_rows: usize,
}

impl TrainingData {
    pub fn n_rows(&self) -> usize {
        self.x.nrows()
    }

    pub fn into_parts(self) -> (Array2<f64>, Array1<f64>) {
        (self.x, self.y)
    }
}

/// Reads the exercise and calories files and builds the training matrix
pub struct DatasetLoader {
    config: DatasetConfig,
}

impl DatasetLoader {
    pub fn new(config: DatasetConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Load both files, join them and derive features
    pub fn load(&self) -> Result<TrainingData> {
        self.load_with_joined().map(|(_, data)| data)
    }

    /// Like [`load`](Self::load), also returning the inner-joined raw frame
    pub fn load_with_joined(&self) -> Result<(DataFrame, TrainingData)> {
        let start = Instant::now();
        let exercise = load_csv(&self.config.exercise_path)?;
        let calories = load_csv(&self.config.calories_path)?;

        let joined = join_sources(&exercise, &calories)?;
        let data = features_from_joined(&joined, exercise.height(), calories.height())?;
        info!(
            rows = data.n_rows(),
            exercise_rows = data.n_exercise_rows,
            calorie_rows = data.n_calorie_rows,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Training data ready"
        );
        Ok((joined, data))
    }
}

/// Load both sources and return `(X, y)`
pub fn build_training_data(config: &DatasetConfig) -> Result<(Array2<f64>, Array1<f64>)> {
    Ok(DatasetLoader::new(config.clone()).load()?.into_parts())
}

/// Read a headered CSV file
///
/// Column types are inferred from every row, so a decimal value far down an
/// otherwise whole-number column widens it to `Float64`.
pub fn load_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .map_err(|e| CalorieError::DataError(format!("cannot open {}: {}", path.display(), e)))?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .into_reader_with_file_handle(file)
        .finish()
        .map_err(|e| CalorieError::DataError(format!("cannot parse {}: {}", path.display(), e)))?;

    debug!(path = %path.display(), rows = df.height(), cols = df.width(), "Loaded CSV");
    Ok(df)
}

/// Join in-memory exercise and calories frames and derive the feature matrix
pub fn build_from_frames(exercise: &DataFrame, calories: &DataFrame) -> Result<TrainingData> {
    let joined = join_sources(exercise, calories)?;
    features_from_joined(&joined, exercise.height(), calories.height())
}

fn features_from_joined(joined: &DataFrame, n_exercise_rows: usize, n_calorie_rows: usize) -> Result<TrainingData> {
    let n_rows = joined.height();

    let genders = gender_column(joined)?;
    let age = numeric_column(joined, "Age")?;
    let height = numeric_column(joined, "Height")?;
    let weight = numeric_column(joined, "Weight")?;
    let duration = numeric_column(joined, "Duration")?;
    let heart_rate = numeric_column(joined, "Heart_Rate")?;
    let body_temp = numeric_column(joined, "Body_Temp")?;
    let target = numeric_column(joined, TARGET_COLUMN)?;

    if let Some(row) = height.iter().position(|&h| h <= 0.0) {
        return Err(CalorieError::DataError(format!(
            "Height must be positive to derive BMI, got {} at row {}",
            height[row], row
        )));
    }

    let x = Array2::from_shape_fn((n_rows, N_FEATURES), |(r, c)| match c {
        0 => genders[r].code(),
        1 => age[r],
        2 => height[r],
        3 => weight[r],
        4 => duration[r],
        5 => heart_rate[r],
        6 => body_temp[r],
        _ => bmi(height[r], weight[r]),
    });

    Ok(TrainingData {
        x,
        y: Array1::from_vec(target),
        n_exercise_rows,
        n_calorie_rows,
    })
}

/// Inner join on `User_ID`, keeping the exercise file's row order
pub fn join_sources(exercise: &DataFrame, calories: &DataFrame) -> Result<DataFrame> {
    require_columns(exercise, &EXERCISE_COLUMNS, "exercise data")?;
    require_columns(calories, &CALORIE_COLUMNS, "calories data")?;

    let left = exercise
        .select(EXERCISE_COLUMNS)?
        .with_row_index(ROW_INDEX.into(), None)?;
    let right = calories.select(CALORIE_COLUMNS)?;

    let joined = left
        .inner_join(&right, [ID_COLUMN], [ID_COLUMN])?
        .sort(
            [ROW_INDEX],
            SortMultipleOptions::default().with_maintain_order(true),
        )?
        .drop(ROW_INDEX)?;

    if joined.height() == 0 {
        return Err(CalorieError::DataError(format!(
            "joining exercise ({} rows) and calories ({} rows) on {} produced no rows",
            exercise.height(),
            calories.height(),
            ID_COLUMN
        )));
    }

    debug!(rows = joined.height(), "Joined sources");
    Ok(joined)
}

fn require_columns(df: &DataFrame, required: &[&str], source: &str) -> Result<()> {
    let present: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();

    for column in required {
        if !present.iter().any(|p| p == column) {
            return Err(CalorieError::DataError(format!(
                "{} is missing required column '{}'",
                source, column
            )));
        }
    }
    Ok(())
}

fn gender_column(df: &DataFrame) -> Result<Vec<Gender>> {
    let column = df.column("Gender")?;
    let values = column.str().map_err(|_| {
        CalorieError::DataError(format!(
            "Gender column must hold text labels, found {}",
            column.dtype()
        ))
    })?;

    values
        .into_iter()
        .enumerate()
        .map(|(row, value)| match value {
            Some(literal) => literal.parse::<Gender>().map_err(|e| match e {
                CalorieError::DataError(msg) => CalorieError::DataError(format!("row {}: {}", row, msg)),
                other => other,
            }),
            None => Err(CalorieError::DataError(format!(
                "row {}: missing Gender value",
                row
            ))),
        })
        .collect()
}

fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .map_err(|_| CalorieError::DataError(format!("missing column '{}'", name)))?;
    let cast = column.cast(&DataType::Float64).map_err(|e| {
        CalorieError::DataError(format!("column '{}' is not numeric: {}", name, e))
    })?;

    cast.f64()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.ok_or_else(|| {
                CalorieError::DataError(format!(
                    "column '{}' has a missing or non-numeric value at row {}",
                    name, row
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise_df() -> DataFrame {
        df!(
            "User_ID" => &[1i64, 2, 3, 4],
            "Gender" => &["male", "female", "male", "female"],
            "Age" => &[30i64, 25, 40, 35],
            "Height" => &[170.0, 160.0, 180.0, 165.0],
            "Weight" => &[70.0, 55.0, 85.0, 60.0],
            "Duration" => &[45.0, 20.0, 30.0, 10.0],
            "Heart_Rate" => &[100.0, 95.0, 110.0, 85.0],
            "Body_Temp" => &[37.0, 38.5, 40.1, 39.0]
        )
        .unwrap()
    }

    fn calories_df() -> DataFrame {
        df!(
            "User_ID" => &[4i64, 2, 1, 99],
            "Calories" => &[35.0, 80.0, 210.0, 5.0]
        )
        .unwrap()
    }

    #[test]
    fn test_inner_join_cardinality() {
        let data = build_from_frames(&exercise_df(), &calories_df()).unwrap();
        // IDs 1, 2, 4 appear on both sides
        assert_eq!(data.n_rows(), 3);
        assert_eq!(data.y.len(), 3);
        assert_eq!(data.x.ncols(), N_FEATURES);
    }

    #[test]
    fn test_rows_follow_exercise_order() {
        let data = build_from_frames(&exercise_df(), &calories_df()).unwrap();
        assert_eq!(data.y.to_vec(), vec![210.0, 80.0, 35.0]);
        // Gender column is encoded male = 0, female = 1
        assert_eq!(data.x[[0, 0]], 0.0);
        assert_eq!(data.x[[1, 0]], 1.0);
    }

    #[test]
    fn test_bmi_column() {
        let data = build_from_frames(&exercise_df(), &calories_df()).unwrap();
        assert!((data.x[[0, 7]] - 24.22).abs() < 0.01);
    }

    #[test]
    fn test_missing_column_is_data_error() {
        let exercise = exercise_df().drop("Heart_Rate").unwrap();
        let err = build_from_frames(&exercise, &calories_df()).unwrap_err();
        assert!(matches!(err, CalorieError::DataError(ref m) if m.contains("Heart_Rate")));
    }

    #[test]
    fn test_empty_join_is_data_error() {
        let calories = df!(
            "User_ID" => &[100i64, 200],
            "Calories" => &[1.0, 2.0]
        )
        .unwrap();
        let err = build_from_frames(&exercise_df(), &calories).unwrap_err();
        assert!(matches!(err, CalorieError::DataError(_)));
    }

    #[test]
    fn test_unmapped_gender_is_data_error() {
        let mut exercise = exercise_df();
        exercise
            .replace("Gender", Series::new("Gender".into(), &["male", "other", "male", "female"]))
            .unwrap();
        let err = build_from_frames(&exercise, &calories_df()).unwrap_err();
        assert!(matches!(err, CalorieError::DataError(ref m) if m.contains("other")));
    }

    #[test]
    fn test_duplicate_ids_propagate() {
        let calories = df!(
            "User_ID" => &[1i64, 1, 2],
            "Calories" => &[210.0, 211.0, 80.0]
        )
        .unwrap();
        let data = build_from_frames(&exercise_df(), &calories).unwrap();
        assert_eq!(data.n_rows(), 3);
    }

    #[test]
    fn test_null_numeric_cell_is_data_error() {
        let mut exercise = exercise_df();
        exercise
            .replace("Weight", Series::new("Weight".into(), &[Some(70.0), None, Some(85.0), Some(60.0)]))
            .unwrap();
        let err = build_from_frames(&exercise, &calories_df()).unwrap_err();
        assert!(matches!(err, CalorieError::DataError(ref m) if m.contains("Weight") && m.contains("row 1")));
    }

    #[test]
    fn test_non_numeric_cell_is_data_error() {
        let mut exercise = exercise_df();
        exercise
            .replace("Duration", Series::new("Duration".into(), &["45", "twenty", "30", "10"]))
            .unwrap();
        let err = build_from_frames(&exercise, &calories_df()).unwrap_err();
        assert!(matches!(err, CalorieError::DataError(ref m) if m.contains("Duration")));
    }

    #[test]
    fn test_missing_gender_is_data_error() {
        let mut exercise = exercise_df();
        exercise
            .replace("Gender", Series::new("Gender".into(), &[Some("male"), None, Some("male"), Some("female")]))
            .unwrap();
        let err = build_from_frames(&exercise, &calories_df()).unwrap_err();
        assert!(matches!(err, CalorieError::DataError(ref m) if m.contains("missing Gender")));
    }

    #[test]
    fn test_numeric_gender_column_is_data_error() {
        let mut exercise = exercise_df();
        exercise
            .replace("Gender", Series::new("Gender".into(), &[0i64, 1, 0, 1]))
            .unwrap();
        let err = build_from_frames(&exercise, &calories_df()).unwrap_err();
        assert!(matches!(err, CalorieError::DataError(ref m) if m.contains("text labels")));
    }

    #[test]
    fn test_non_positive_height_is_data_error() {
        let mut exercise = exercise_df();
        exercise
            .replace("Height", Series::new("Height".into(), &[170.0, 0.0, 180.0, 165.0]))
            .unwrap();
        let err = build_from_frames(&exercise, &calories_df()).unwrap_err();
        assert!(matches!(err, CalorieError::DataError(ref m) if m.contains("Height")));
    }

    #[test]
    fn test_late_decimal_widens_column() {
        let dir = std::env::temp_dir().join(format!("calorie_loader_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let n = 1200;
        let mut exercise = String::from("User_ID,Gender,Age,Height,Weight,Duration,Heart_Rate,Body_Temp\n");
        let mut calories = String::from("User_ID,Calories\n");
        for i in 0..n {
            let gender = if i % 2 == 0 { "male" } else { "female" };
            let weight = if i == n - 1 { "70.5".to_string() } else { (60 + i % 30).to_string() };
            exercise.push_str(&format!(
                "{},{},{},{},{},{},{},{}\n",
                1000 + i,
                gender,
                20 + i % 40,
                160 + i % 30,
                weight,
                10 + i % 50,
                90 + i % 40,
                37 + i % 3
            ));
            calories.push_str(&format!("{},{}\n", 1000 + i, 50 + i % 200));
        }

        let config = DatasetConfig::new(dir.join("Exercise.csv"), dir.join("Calories.csv"));
        std::fs::write(&config.exercise_path, exercise).unwrap();
        std::fs::write(&config.calories_path, calories).unwrap();

        let (joined, data) = DatasetLoader::new(config).load_with_joined().unwrap();
        assert_eq!(joined.column("Weight").unwrap().dtype(), &DataType::Float64);
        assert_eq!(data.n_rows(), n);
        assert_eq!(data.x[[n - 1, 3]], 70.5);
        assert_eq!(joined.height(), data.n_rows());

        std::fs::remove_dir_all(&dir).ok();
    }
}
