//! # Forecast Engine
//!
//! This crate trains, compares, persists, and serves the regression models
//! that project future revenue from an engineered feature matrix.
//!
//! ## Architectural Principles
//!
//! - **Tournament, not configuration:** three candidate models (Linear
//!   Regression, Random Forest, Gradient Boosting) are always fitted, and
//!   the one with the best held-out R² wins. Callers never pick a model.
//! - **Explicit lifecycle:** a [`RevenueForecaster`] starts untrained, and
//!   every prediction or save before a successful `train()` (or `load()`)
//!   fails loudly with [`ForecastError::NotTrained`]. There are no silent
//!   default predictions.
//! - **Self-describing artifacts:** the saved bincode artifact carries the
//!   winning model, its name, the feature column order, and the validation
//!   metrics of all candidates, so a loaded forecaster can validate inputs
//!   and explain itself without retraining.

pub mod error;
pub mod models;
pub mod predictor;

// Re-export the key components to create a clean, public-facing API.
pub use error::ForecastError;
pub use models::{ForecastModel, GradientBoostingParameters, GradientBoostingRegressor, ModelKind};
pub use predictor::{
    forecast_insights, ForecastInsights, ModelMetrics, RevenueForecaster, TrainOptions,
};
