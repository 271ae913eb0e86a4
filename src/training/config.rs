//! Training configuration

use crate::error::{CalorieError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Regression models trained on every run, in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    /// Ordinary least squares
    LinearRegression,
    /// Bagged regression trees
    RandomForest,
    /// Second-order gradient boosted trees
    XGBoost,
}

impl ModelKind {
    /// All models, in the order they are fitted and reported
    pub const ALL: [ModelKind; 3] = [
        ModelKind::LinearRegression,
        ModelKind::RandomForest,
        ModelKind::XGBoost,
    ];

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            ModelKind::LinearRegression => "Linear Regression",
            ModelKind::RandomForest => "Random Forest",
            ModelKind::XGBoost => "XGBoost",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Case, spaces, `-` and `_` are ignored: `random-forest` names Random Forest
impl FromStr for ModelKind {
    type Err = CalorieError;

    fn from_str(s: &str) -> Result<Self> {
        let key = |name: &str| -> String {
            name.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .map(|c| c.to_ascii_lowercase())
                .collect()
        };
        let wanted = key(s);
        ModelKind::ALL
            .into_iter()
            .find(|kind| key(kind.name()) == wanted)
            .ok_or_else(|| {
                CalorieError::InvalidInput(format!(
                    "unknown model '{}', expected one of Linear Regression, Random Forest, XGBoost",
                    s
                ))
            })
    }
}

/// Configuration for the multi-model trainer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Fraction of rows held out for evaluation
    pub test_size: f64,

    /// Seed for the split, bootstrap samples and boosting subsamples
    pub random_state: u64,

    /// Number of trees (random forest) and boosting rounds (XGBoost)
    pub n_estimators: usize,

    /// Shrinkage applied to each boosting round
    pub learning_rate: f64,

    /// Maximum depth of boosted trees
    pub boosting_max_depth: usize,

    /// Maximum depth of forest trees (None = grow until pure)
    pub forest_max_depth: Option<usize>,

    /// Minimum samples per forest leaf
    pub min_samples_leaf: usize,

    /// L2 regularization on boosted leaf weights
    pub reg_lambda: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            random_state: 42,
            n_estimators: 100,
            learning_rate: 0.1,
            boosting_max_depth: 6,
            forest_max_depth: None,
            min_samples_leaf: 1,
            reg_lambda: 1.0,
        }
    }
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the held-out fraction
    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    /// Builder method to set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Builder method to set number of estimators
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    /// Builder method to set learning rate
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Builder method to cap forest tree depth
    pub fn with_forest_max_depth(mut self, depth: usize) -> Self {
        self.forest_max_depth = Some(depth);
        self
    }

    /// Builder method to set boosted tree depth
    pub fn with_boosting_max_depth(mut self, depth: usize) -> Self {
        self.boosting_max_depth = depth;
        self
    }

    /// Reject values no model can train with
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(CalorieError::ConfigError(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if self.n_estimators == 0 {
            return Err(CalorieError::ConfigError(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(CalorieError::ConfigError(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.boosting_max_depth == 0 {
            return Err(CalorieError::ConfigError(
                "boosting_max_depth must be at least 1".to_string(),
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(CalorieError::ConfigError(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        if self.reg_lambda < 0.0 {
            return Err(CalorieError::ConfigError(format!(
                "reg_lambda must be non-negative, got {}",
                self.reg_lambda
            )));
        }
        Ok(())
    }

    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TrainingConfig::default();
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.random_state, 42);
        assert_eq!(config.n_estimators, 100);
        assert_eq!(config.learning_rate, 0.1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = TrainingConfig::new()
            .with_n_estimators(20)
            .with_random_state(7)
            .with_forest_max_depth(5);

        assert_eq!(config.n_estimators, 20);
        assert_eq!(config.random_state, 7);
        assert_eq!(config.forest_max_depth, Some(5));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(TrainingConfig::new().with_test_size(0.0).validate().is_err());
        assert!(TrainingConfig::new().with_test_size(1.0).validate().is_err());
        assert!(TrainingConfig::new().with_n_estimators(0).validate().is_err());
        assert!(TrainingConfig::new().with_learning_rate(-0.1).validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: TrainingConfig = serde_json::from_str(r#"{"n_estimators": 10}"#).unwrap();
        assert_eq!(config.n_estimators, 10);
        assert_eq!(config.learning_rate, 0.1);
    }

    #[test]
    fn test_model_order_and_names() {
        let names: Vec<&str> = ModelKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names, vec!["Linear Regression", "Random Forest", "XGBoost"]);
    }

    #[test]
    fn test_model_kind_parse() {
        assert_eq!("Linear Regression".parse::<ModelKind>().unwrap(), ModelKind::LinearRegression);
        assert_eq!("random-forest".parse::<ModelKind>().unwrap(), ModelKind::RandomForest);
        assert_eq!("xgboost".parse::<ModelKind>().unwrap(), ModelKind::XGBoost);
        assert!(matches!("svm".parse::<ModelKind>(), Err(CalorieError::InvalidInput(_))));
    }
}
