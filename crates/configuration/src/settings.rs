use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every field carries a default so the engines run sensibly without a
/// `config.toml`; a partial file overrides only the sections it names.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisSettings,
    pub forecasting: ForecastSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            analysis: AnalysisSettings::default(),
            forecasting: ForecastSettings::default(),
        }
    }
}

/// Parameters for the Cleaning Stage and the KPI Engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// The assumed cash balance used for the runway calculation.
    pub current_cash: f64,
    /// The assumed initial investment used for the ROI calculation.
    pub initial_investment: f64,
    /// Absolute z-score at or beyond which a row is considered an outlier.
    pub z_score_threshold: f64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            current_cash: 50_000.0,
            initial_investment: 100_000.0,
            z_score_threshold: 3.0,
        }
    }
}

/// Parameters for feature engineering and the Forecast Engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForecastSettings {
    /// The column the models learn to predict.
    pub target_column: String,
    /// Lag periods (in rows) to derive from the target column.
    pub lag_periods: Vec<usize>,
    /// Trailing window sizes for rolling mean/std features.
    pub rolling_windows: Vec<usize>,
    /// Fraction of the feature matrix held out for model scoring.
    pub test_size: f64,
    /// Seed for the train/test partition, fixed for reproducibility.
    pub partition_seed: u64,
    /// Number of future periods to project.
    pub forecast_periods: usize,
    /// Where the trained model artifact is written.
    pub model_path: PathBuf,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            target_column: "Revenue".to_string(),
            lag_periods: vec![1, 2, 3],
            rolling_windows: vec![3, 5],
            test_size: 0.2,
            partition_seed: 42,
            forecast_periods: 6,
            model_path: PathBuf::from("models/revenue_forecaster.bin"),
        }
    }
}
