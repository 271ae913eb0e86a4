//! Latest-prediction CSV
//!
//! Each save replaces the file with a single row; earlier results are not kept.

use crate::data::{load_csv, Gender};
use crate::error::{CalorieError, Result};
use crate::inference::Activity;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::info;

/// File written by the `--save` flag and the interactive form
pub const DEFAULT_HISTORY_PATH: &str = "calorie_prediction_history.csv";

/// Column layout of the history file
pub const HISTORY_COLUMNS: [&str; 4] = ["Gender", "Age", "Activity", "Calories_Burned"];

/// One saved estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub gender: Gender,
    pub age: u32,
    pub activity: Activity,
    /// Activity-scaled estimate in kcal
    pub calories_burned: f64,
}

/// Write `record` to `path`, replacing whatever the file held before
pub fn save_prediction(path: &Path, record: &PredictionRecord) -> Result<()> {
    let mut df = df!(
        HISTORY_COLUMNS[0] => &[record.gender.as_str()],
        HISTORY_COLUMNS[1] => &[record.age],
        HISTORY_COLUMNS[2] => &[record.activity.name()],
        HISTORY_COLUMNS[3] => &[record.calories_burned]
    )?;

    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .map_err(|e| CalorieError::DataError(format!("cannot write {}: {}", path.display(), e)))?;

    info!(path = %path.display(), kcal = record.calories_burned, "Saved prediction");
    Ok(())
}

/// Read every row of a history file
pub fn load_history(path: &Path) -> Result<Vec<PredictionRecord>> {
    let df = load_csv(path)?;
    for column in HISTORY_COLUMNS {
        if df.column(column).is_err() {
            return Err(CalorieError::DataError(format!(
                "{} is missing column '{}'",
                path.display(),
                column
            )));
        }
    }

    let genders = df.column("Gender")?.cast(&DataType::String)?;
    let activities = df.column("Activity")?.cast(&DataType::String)?;
    let ages = df.column("Age")?.cast(&DataType::Float64)?;
    let calories = df.column("Calories_Burned")?.cast(&DataType::Float64)?;

    genders
        .str()?
        .into_iter()
        .zip(activities.str()?.into_iter())
        .zip(ages.f64()?.into_iter())
        .zip(calories.f64()?.into_iter())
        .enumerate()
        .map(|(row, (((gender, activity), age), kcal))| {
            let missing = || CalorieError::DataError(format!("history row {} is incomplete", row));
            Ok(PredictionRecord {
                gender: gender.ok_or_else(missing)?.parse()?,
                age: age.ok_or_else(missing)?.round() as u32,
                activity: activity.ok_or_else(missing)?.parse()?,
                calories_burned: kcal.ok_or_else(missing)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("calorie_history_{}_{}.csv", name, std::process::id()))
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_path("roundtrip");
        let record = PredictionRecord {
            gender: Gender::Female,
            age: 41,
            activity: Activity::Swimming,
            calories_burned: 312.5,
        };
        save_prediction(&path, &record).unwrap();

        let header = std::fs::read_to_string(&path).unwrap();
        assert!(header.starts_with("Gender,Age,Activity,Calories_Burned"));
        assert_eq!(load_history(&path).unwrap(), vec![record]);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_rejects_foreign_file() {
        let path = temp_path("foreign");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();
        assert!(matches!(load_history(&path), Err(CalorieError::DataError(_))));
        std::fs::remove_file(&path).ok();
    }
}
