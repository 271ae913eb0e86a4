//! Multi-model training engine

use super::config::{ModelKind, TrainingConfig};
use super::linear_models::LinearRegression;
use super::models::{ModelMetrics, Regressor};
use super::random_forest::RandomForest;
use super::split::{train_test_split, SplitData, TrainTestSplit};
use super::xgboost::{XGBoostConfig, XGBoostRegressor};
use crate::data::FEATURE_COLUMNS;
use crate::error::{CalorieError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Fitted estimator, one variant per [`ModelKind`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Estimator {
    LinearRegression(LinearRegression),
    RandomForest(RandomForest),
    XGBoost(XGBoostRegressor),
}

impl Estimator {
    /// Unfitted estimator for `kind`, configured from `config`
    pub fn for_kind(kind: ModelKind, config: &TrainingConfig) -> Self {
        match kind {
            ModelKind::LinearRegression => Estimator::LinearRegression(LinearRegression::new()),
            ModelKind::RandomForest => {
                let mut forest = RandomForest::new(config.n_estimators)
                    .with_min_samples_leaf(config.min_samples_leaf)
                    .with_random_state(config.random_state);
                if let Some(depth) = config.forest_max_depth {
                    forest = forest.with_max_depth(depth);
                }
                Estimator::RandomForest(forest)
            }
            ModelKind::XGBoost => Estimator::XGBoost(XGBoostRegressor::new(XGBoostConfig {
                n_estimators: config.n_estimators,
                learning_rate: config.learning_rate,
                max_depth: config.boosting_max_depth,
                reg_lambda: config.reg_lambda,
                random_state: config.random_state,
                ..XGBoostConfig::default()
            })),
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Estimator::LinearRegression(_) => ModelKind::LinearRegression,
            Estimator::RandomForest(_) => ModelKind::RandomForest,
            Estimator::XGBoost(_) => ModelKind::XGBoost,
        }
    }

    fn as_regressor(&self) -> &dyn Regressor {
        match self {
            Estimator::LinearRegression(m) => m,
            Estimator::RandomForest(m) => m,
            Estimator::XGBoost(m) => m,
        }
    }

    fn as_regressor_mut(&mut self) -> &mut dyn Regressor {
        match self {
            Estimator::LinearRegression(m) => m,
            Estimator::RandomForest(m) => m,
            Estimator::XGBoost(m) => m,
        }
    }
}

/// A fitted model together with the feature schema it was trained on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    estimator: Estimator,
    feature_names: Vec<String>,
}

impl TrainedModel {
    pub fn kind(&self) -> ModelKind {
        self.estimator.kind()
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn estimator(&self) -> &Estimator {
        &self.estimator
    }

    /// Column names, in order, that `predict` expects
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Raw model output, one value per row
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.estimator.as_regressor().predict(x)
    }

    pub fn feature_importances(&self) -> Option<Array1<f64>> {
        self.estimator.as_regressor().feature_importances()
    }

    /// Feature names paired with importances, highest first
    pub fn ranked_importances(&self) -> Vec<(String, f64)> {
        let Some(importances) = self.feature_importances() else {
            return Vec::new();
        };
        let mut ranked: Vec<(String, f64)> = self
            .feature_names
            .iter()
            .cloned()
            .zip(importances.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }
}

/// One evaluated model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResult {
    pub model: TrainedModel,
    pub metrics: ModelMetrics,
}

/// Every model fitted in one run, in [`ModelKind::ALL`] order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModels {
    results: Vec<ModelResult>,
    split: TrainTestSplit,
    config: TrainingConfig,
}

impl TrainedModels {
    pub fn results(&self) -> &[ModelResult] {
        &self.results
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ModelResult> {
        self.results.iter()
    }

    pub fn get(&self, kind: ModelKind) -> Option<&ModelResult> {
        self.results.iter().find(|r| r.model.kind() == kind)
    }

    /// First declared model (Linear Regression)
    pub fn primary(&self) -> Option<&ModelResult> {
        self.results.first()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Row indices of the partition every model shared
    pub fn split(&self) -> &TrainTestSplit {
        &self.split
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }
}

impl<'a> IntoIterator for &'a TrainedModels {
    type Item = &'a ModelResult;
    type IntoIter = std::slice::Iter<'a, ModelResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// Main training engine
#[derive(Debug, Clone)]
pub struct TrainEngine {
    config: TrainingConfig,
    feature_names: Vec<String>,
}

impl Default for TrainEngine {
    fn default() -> Self {
        Self::new(TrainingConfig::default())
    }
}

impl TrainEngine {
    /// Create a new training engine for the standard feature layout
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            feature_names: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Override the expected feature schema
    pub fn with_feature_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.feature_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Split once, then fit and score every model on the same partition
    pub fn train_and_evaluate(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<TrainedModels> {
        self.config.validate()?;

        // Input problems surface before any model runs; report them against the first one
        let first = ModelKind::ALL[0].name();
        self.check_inputs(x, y).map_err(|e| CalorieError::training(first, e))?;

        let split = train_test_split(x.nrows(), self.config.test_size, self.config.random_state)?;
        let data = split.apply(x, y);
        info!(
            n_train = split.n_train(),
            n_test = split.n_test(),
            seed = self.config.random_state,
            "Split dataset"
        );

        let results = ModelKind::ALL
            .iter()
            .map(|&kind| {
                self.fit_and_score(kind, &data)
                    .map_err(|e| CalorieError::training(kind.name(), e))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(TrainedModels {
            results,
            split,
            config: self.config.clone(),
        })
    }

    fn check_inputs(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.ncols() != self.feature_names.len() {
            return Err(CalorieError::ShapeError {
                expected: format!("{} feature columns", self.feature_names.len()),
                actual: format!("{} feature columns", x.ncols()),
            });
        }
        if x.nrows() != y.len() {
            return Err(CalorieError::ShapeError {
                expected: format!("{} targets", x.nrows()),
                actual: format!("{} targets", y.len()),
            });
        }
        Ok(())
    }

    fn fit_and_score(&self, kind: ModelKind, data: &SplitData) -> Result<ModelResult> {
        let start = Instant::now();
        let mut estimator = Estimator::for_kind(kind, &self.config);
        debug!(model = %kind, "Fitting");
        estimator.as_regressor_mut().fit(&data.x_train, &data.y_train)?;
        let elapsed = start.elapsed().as_secs_f64();

        let y_pred = estimator.as_regressor().predict(&data.x_test)?;
        if y_pred.iter().any(|p| !p.is_finite()) {
            return Err(CalorieError::ComputationError(
                "non-finite predictions on the test partition".to_string(),
            ));
        }

        let mut metrics = ModelMetrics::compute_regression(&data.y_test, &y_pred);
        metrics.training_time_secs = elapsed;
        metrics.n_train = data.y_train.len();

        info!(
            model = %kind,
            mae = metrics.mae,
            r2 = metrics.r2,
            secs = elapsed,
            "Model evaluated"
        );

        Ok(ModelResult {
            model: TrainedModel {
                estimator,
                feature_names: self.feature_names.clone(),
            },
            metrics,
        })
    }
}

/// Train every model with the default configuration
pub fn train_and_evaluate(x: &Array2<f64>, y: &Array1<f64>) -> Result<TrainedModels> {
    TrainEngine::default().train_and_evaluate(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic(n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 3), |(r, c)| ((r * (c + 3) + c * 5) % 17) as f64);
        let y: Array1<f64> = x
            .rows()
            .into_iter()
            .map(|r| 4.0 * r[0] + 2.0 * r[1] - r[2] + 10.0)
            .collect();
        (x, y)
    }

    fn small_engine() -> TrainEngine {
        TrainEngine::new(TrainingConfig::new().with_n_estimators(10))
            .with_feature_names(["a", "b", "c"])
    }

    #[test]
    fn test_models_in_declaration_order() {
        let (x, y) = synthetic(60);
        let models = small_engine().train_and_evaluate(&x, &y).unwrap();

        let kinds: Vec<ModelKind> = models.iter().map(|r| r.model.kind()).collect();
        assert_eq!(kinds, ModelKind::ALL.to_vec());
        assert_eq!(models.primary().unwrap().model.kind(), ModelKind::LinearRegression);
    }

    #[test]
    fn test_metrics_bounds() {
        let (x, y) = synthetic(60);
        let models = small_engine().train_and_evaluate(&x, &y).unwrap();
        for result in &models {
            assert!(result.metrics.mae >= 0.0, "{}", result.model.name());
            assert!(result.metrics.r2 <= 1.0, "{}", result.model.name());
            assert_eq!(result.metrics.n_test, 12);
            assert_eq!(result.metrics.n_train, 48);
        }
        // exact linear target
        let linear = models.get(ModelKind::LinearRegression).unwrap();
        assert!(linear.metrics.mae < 1e-6);
    }

    #[test]
    fn test_wrong_width_names_first_model() {
        let (x, y) = synthetic(30);
        let err = TrainEngine::default().train_and_evaluate(&x, &y).unwrap_err();
        match err {
            CalorieError::TrainingError { model, .. } => assert_eq!(model, "Linear Regression"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_target_length_mismatch() {
        let (x, _) = synthetic(30);
        let y = Array1::zeros(29);
        assert!(matches!(
            small_engine().train_and_evaluate(&x, &y),
            Err(CalorieError::TrainingError { .. })
        ));
    }

    #[test]
    fn test_non_finite_feature_is_training_error() {
        let (mut x, y) = synthetic(30);
        x[[3, 1]] = f64::NAN;
        let err = small_engine().train_and_evaluate(&x, &y).unwrap_err();
        assert!(err.to_string().starts_with("Training error in "));
    }

    #[test]
    fn test_ranked_importances() {
        let (x, y) = synthetic(60);
        let models = small_engine().train_and_evaluate(&x, &y).unwrap();
        let forest = models.get(ModelKind::RandomForest).unwrap();
        let ranked = forest.model.ranked_importances();
        assert_eq!(ranked.len(), 3);
        assert!(ranked[0].1 >= ranked[1].1 && ranked[1].1 >= ranked[2].1);

        let linear = models.get(ModelKind::LinearRegression).unwrap();
        assert!(linear.model.ranked_importances().is_empty());
    }
}
