//! Inference module
//!
//! Turns a [`FeatureVector`](crate::data::FeatureVector) into a calorie
//! estimate through one trained model. Activity multipliers, burn levels and
//! BMI status are applied on top of the raw estimate and never feed back into
//! the model.

mod activity;
mod engine;

pub use activity::{Activity, BmiStatus, BurnLevel};
pub use engine::{duration_curve, predict, predict_frame, CurvePoint, CURVE_DURATIONS};
