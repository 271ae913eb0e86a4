//! Activity multipliers and the health readouts shown next to an estimate

use crate::error::{CalorieError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Workout type selected in the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Activity {
    #[default]
    Walking,
    Running,
    Cycling,
    Swimming,
    Yoga,
}

impl Activity {
    pub const ALL: [Activity; 5] = [
        Activity::Walking,
        Activity::Running,
        Activity::Cycling,
        Activity::Swimming,
        Activity::Yoga,
    ];

    /// Scalar applied to a raw model estimate
    pub fn multiplier(self) -> f64 {
        match self {
            Activity::Walking => 1.0,
            Activity::Running => 1.3,
            Activity::Cycling => 1.2,
            Activity::Swimming => 1.4,
            Activity::Yoga => 0.8,
        }
    }

    pub fn apply(self, raw_calories: f64) -> f64 {
        raw_calories * self.multiplier()
    }

    pub fn name(self) -> &'static str {
        match self {
            Activity::Walking => "Walking",
            Activity::Running => "Running",
            Activity::Cycling => "Cycling",
            Activity::Swimming => "Swimming",
            Activity::Yoga => "Yoga",
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Activity {
    type Err = CalorieError;

    fn from_str(s: &str) -> Result<Self> {
        Activity::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                CalorieError::InvalidInput(format!(
                    "unknown activity '{}', expected one of Walking, Running, Cycling, Swimming, Yoga",
                    s
                ))
            })
    }
}

/// Intensity band of an estimated burn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BurnLevel {
    Light,
    Moderate,
    High,
}

impl BurnLevel {
    /// Light below 150 kcal, High above 350 kcal, Moderate in between
    pub fn classify(calories: f64) -> Self {
        if calories < 150.0 {
            BurnLevel::Light
        } else if calories <= 350.0 {
            BurnLevel::Moderate
        } else {
            BurnLevel::High
        }
    }

    pub fn tip(self) -> &'static str {
        match self {
            BurnLevel::Light => "Light burn. Try increasing duration or choosing a higher-intensity activity.",
            BurnLevel::Moderate => "Moderate burn. Great job, stay consistent!",
            BurnLevel::High => "High burn! Stay hydrated and fuel your body.",
        }
    }
}

/// Weight category from body mass index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BmiStatus {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiStatus {
    pub fn classify(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiStatus::Underweight
        } else if bmi < 25.0 {
            BmiStatus::Normal
        } else if bmi < 30.0 {
            BmiStatus::Overweight
        } else {
            BmiStatus::Obese
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BmiStatus::Underweight => "Underweight",
            BmiStatus::Normal => "Normal weight",
            BmiStatus::Overweight => "Overweight",
            BmiStatus::Obese => "Obese",
        }
    }
}

impl fmt::Display for BmiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
