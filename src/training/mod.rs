//! Model training module
//!
//! Fits three regressors on one seeded train/test partition and scores them
//! on the held-out rows:
//! - Ordinary least squares linear regression
//! - Random Forest of bootstrapped CART regression trees
//! - XGBoost-style second-order gradient boosting

mod config;
mod engine;
mod models;
mod split;
pub mod decision_tree;
pub mod linear_models;
pub mod random_forest;
pub mod xgboost;

pub use config::{ModelKind, TrainingConfig};
pub use decision_tree::{DecisionTree, TreeNode};
pub use engine::{train_and_evaluate, Estimator, ModelResult, TrainEngine, TrainedModel, TrainedModels};
pub use linear_models::LinearRegression;
pub use models::{check_n_features, validate_training_input, ModelMetrics, Regressor};
pub use random_forest::{MaxFeatures, RandomForest};
pub use split::{train_test_split, SplitData, TrainTestSplit};
pub use xgboost::{XGBoostConfig, XGBoostRegressor};
