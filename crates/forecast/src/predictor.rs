use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use ml_features::MlData;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::linear_regression::{LinearRegression, LinearRegressionParameters};
use smartcore::metrics::{mean_absolute_error, mean_squared_error, r2};
use smartcore::model_selection::train_test_split;
use tracing::info;

use crate::error::ForecastError;
use crate::models::{ForecastModel, GradientBoostingParameters, GradientBoostingRegressor, ModelKind};

/// Minimum number of samples for a train/test split: one row on each side.
const MIN_TRAINING_SAMPLES: usize = 2;

/// Held-out validation scores for one candidate model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
}

/// Knobs controlling the train/validation partition.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    /// Fraction of rows held out for validation, in (0, 1).
    pub test_size: f32,
    /// Seed for the shuffled partition, so reruns score identically.
    pub seed: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
        }
    }
}

/// Everything needed to make and explain predictions after training.
/// This whole struct is the persisted artifact.
#[derive(Serialize, Deserialize)]
struct TrainedState {
    model: ForecastModel,
    model_name: ModelKind,
    feature_names: Vec<String>,
    metrics: BTreeMap<String, ModelMetrics>,
}

/// Trains three regression models on an engineered feature matrix and keeps
/// whichever scores best on a held-out split.
///
/// The forecaster is a small state machine: it starts untrained, and
/// [`RevenueForecaster::predict`], [`RevenueForecaster::predict_next_periods`]
/// and [`RevenueForecaster::save`] all fail with
/// [`ForecastError::NotTrained`] until either [`RevenueForecaster::train`]
/// succeeds or [`RevenueForecaster::load`] restores a saved artifact.
#[derive(Default)]
pub struct RevenueForecaster {
    state: Option<TrainedState>,
}

impl RevenueForecaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_trained(&self) -> bool {
        self.state.is_some()
    }

    /// Name of the winning model, once trained.
    pub fn best_model(&self) -> Option<ModelKind> {
        self.state.as_ref().map(|s| s.model_name)
    }

    /// Validation metrics for all three candidates, once trained.
    pub fn metrics(&self) -> Option<&BTreeMap<String, ModelMetrics>> {
        self.state.as_ref().map(|s| &s.metrics)
    }

    /// Feature column names the model was trained on, in matrix order.
    pub fn feature_names(&self) -> Option<&[String]> {
        self.state.as_ref().map(|s| s.feature_names.as_slice())
    }

    /// Fits Linear Regression, Random Forest, and Gradient Boosting on a
    /// shuffled train/validation split, scores each on the held-out rows
    /// (or on the training rows when the table is too small to hold any
    /// out), and keeps the model with the highest R². Ties go to the model
    /// fitted first, so results are reproducible for a given seed.
    pub fn train(
        &mut self,
        data: &MlData,
        options: &TrainOptions,
    ) -> Result<&BTreeMap<String, ModelMetrics>, ForecastError> {
        if data.x.len() < MIN_TRAINING_SAMPLES {
            return Err(ForecastError::InsufficientData(format!(
                "need at least {MIN_TRAINING_SAMPLES} samples after feature engineering, got {}",
                data.x.len()
            )));
        }

        let x = DenseMatrix::from_2d_vec(&data.x)
            .map_err(|e| ForecastError::Training(format!("failed to build feature matrix: {e}")))?;
        let (x_train, x_test, y_train, y_test) =
            train_test_split(&x, &data.y, options.test_size, true, Some(options.seed));

        info!(
            train_rows = y_train.len(),
            test_rows = y_test.len(),
            features = data.feature_names.len(),
            "Fitting forecast models"
        );

        let linear = LinearRegression::fit(&x_train, &y_train, LinearRegressionParameters::default())
            .map_err(|e| ForecastError::Training(format!("linear regression: {e}")))?;

        let forest_params = RandomForestRegressorParameters::default()
            .with_n_trees(100)
            .with_max_depth(10)
            .with_seed(options.seed);
        let forest = RandomForestRegressor::fit(&x_train, &y_train, forest_params)
            .map_err(|e| ForecastError::Training(format!("random forest: {e}")))?;

        let boosting =
            GradientBoostingRegressor::fit(&x_train, &y_train, GradientBoostingParameters::default())
                .map_err(|e| ForecastError::Training(format!("gradient boosting: {e}")))?;

        let candidates = vec![
            ForecastModel::Linear(linear),
            ForecastModel::RandomForest(forest),
            ForecastModel::GradientBoosting(boosting),
        ];

        // On very small tables the split can round the held-out side down to
        // zero rows; score on the training rows then, rather than refusing a
        // degraded but valid fit.
        let (x_eval, y_eval) = if y_test.is_empty() {
            (&x_train, &y_train)
        } else {
            (&x_test, &y_test)
        };

        let mut metrics = BTreeMap::new();
        let mut scores = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            let predictions = candidate
                .predict(x_eval)
                .map_err(|e| ForecastError::Training(format!("{}: {e}", candidate.kind())))?;
            let score = r2(y_eval, &predictions);
            metrics.insert(
                candidate.kind().key().to_string(),
                ModelMetrics {
                    mae: round2(mean_absolute_error(y_eval, &predictions)),
                    rmse: round2(mean_squared_error(y_eval, &predictions).sqrt()),
                    r2: round4(score),
                },
            );
            scores.push(score);
        }

        // Strictly-greater keeps the earlier candidate on ties.
        let mut best = 0;
        for (i, score) in scores.iter().enumerate() {
            if *score > scores[best] {
                best = i;
            }
        }
        let winner = candidates
            .into_iter()
            .nth(best)
            .ok_or_else(|| ForecastError::Training("no candidate models were fitted".to_string()))?;

        info!(model = %winner.kind(), r2 = scores[best], "Selected best forecast model");

        let state = self.state.insert(TrainedState {
            model_name: winner.kind(),
            model: winner,
            feature_names: data.feature_names.clone(),
            metrics,
        });
        Ok(&state.metrics)
    }

    /// Predicts the target for each feature row.
    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ForecastError> {
        let state = self.state.as_ref().ok_or(ForecastError::NotTrained)?;
        if let Some(row) = rows.iter().find(|r| r.len() != state.feature_names.len()) {
            return Err(ForecastError::ShapeMismatch {
                expected: state.feature_names.len(),
                got: row.len(),
            });
        }

        let x = DenseMatrix::from_2d_vec(&rows.to_vec())
            .map_err(|e| ForecastError::Prediction(format!("failed to build feature matrix: {e}")))?;
        state
            .model
            .predict(&x)
            .map_err(|e| ForecastError::Prediction(e.to_string()))
    }

    /// Projects the next `periods` values from the most recent feature row.
    ///
    /// The feature vector is held fixed across the horizon rather than rolled
    /// forward, so this is a flat projection of current conditions, not a
    /// compounding simulation. Values are rounded to two decimals.
    pub fn predict_next_periods(
        &self,
        last_features: &[f64],
        periods: usize,
    ) -> Result<Vec<f64>, ForecastError> {
        if self.state.is_none() {
            return Err(ForecastError::NotTrained);
        }

        let mut projections = Vec::with_capacity(periods);
        for _ in 0..periods {
            let predicted = self.predict(&[last_features.to_vec()])?;
            projections.push(round2(*predicted.first().unwrap_or(&0.0)));
        }
        Ok(projections)
    }

    /// Writes the trained model, winner name, feature order, and metrics to
    /// `path` with bincode. The write goes to a sibling temp file first and
    /// is renamed into place, so a crash never leaves a truncated artifact.
    pub fn save(&self, path: &Path) -> Result<(), ForecastError> {
        let state = self.state.as_ref().ok_or(ForecastError::NotTrained)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = path.with_extension("tmp");
        let file = File::create(&tmp_path)?;
        bincode::serialize_into(BufWriter::new(file), state)?;
        fs::rename(&tmp_path, path)?;

        info!(path = %path.display(), model = %state.model_name, "Saved forecast model");
        Ok(())
    }

    /// Restores a forecaster from a saved artifact, ready to predict.
    pub fn load(path: &Path) -> Result<Self, ForecastError> {
        let file = File::open(path)?;
        let state: TrainedState = bincode::deserialize_from(BufReader::new(file))?;
        info!(path = %path.display(), model = %state.model_name, "Loaded forecast model");
        Ok(Self { state: Some(state) })
    }
}

/// Summary comparing recent observed values against a forecast horizon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastInsights {
    pub current_average: f64,
    pub predicted_average: f64,
    pub expected_growth_rate: f64,
}

/// Compares the mean of the trailing observed window (up to six values)
/// against the mean of the predictions. Growth is zero when the observed
/// baseline is zero.
pub fn forecast_insights(observed: &[f64], predicted: &[f64]) -> ForecastInsights {
    let tail = &observed[observed.len().saturating_sub(6)..];
    let current_average = mean(tail);
    let predicted_average = mean(predicted);
    let expected_growth_rate = if current_average != 0.0 {
        round2((predicted_average - current_average) / current_average * 100.0)
    } else {
        0.0
    };
    ForecastInsights {
        current_average: round2(current_average),
        predicted_average: round2(predicted_average),
        expected_growth_rate,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fifty rows of y = 2*a + 3*b + 5, which linear regression fits exactly.
    fn linear_dataset() -> MlData {
        let mut x = Vec::with_capacity(50);
        let mut y = Vec::with_capacity(50);
        for i in 0..50 {
            let a = i as f64;
            let b = ((i * 7) % 13) as f64;
            x.push(vec![a, b]);
            y.push(2.0 * a + 3.0 * b + 5.0);
        }
        MlData {
            x,
            y,
            feature_names: vec!["a".to_string(), "b".to_string()],
        }
    }

    #[test]
    fn predict_before_train_fails() {
        let forecaster = RevenueForecaster::new();
        let err = forecaster.predict(&[vec![1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, ForecastError::NotTrained));

        let err = forecaster.predict_next_periods(&[1.0, 2.0], 3).unwrap_err();
        assert!(matches!(err, ForecastError::NotTrained));

        // A zero-period horizon must still hit the precondition.
        let err = forecaster.predict_next_periods(&[1.0, 2.0], 0).unwrap_err();
        assert!(matches!(err, ForecastError::NotTrained));
    }

    #[test]
    fn save_before_train_fails() {
        let forecaster = RevenueForecaster::new();
        let err = forecaster.save(Path::new("/tmp/never-written.bin")).unwrap_err();
        assert!(matches!(err, ForecastError::NotTrained));
    }

    #[test]
    fn training_scores_all_candidates_and_picks_the_linear_fit() {
        let data = linear_dataset();
        let mut forecaster = RevenueForecaster::new();
        let metrics = forecaster
            .train(&data, &TrainOptions::default())
            .unwrap()
            .clone();

        assert_eq!(metrics.len(), 3);
        assert!(metrics.contains_key("linear_regression"));
        assert!(metrics.contains_key("random_forest"));
        assert!(metrics.contains_key("gradient_boosting"));

        // An exactly linear target should leave linear regression unbeaten.
        assert_eq!(forecaster.best_model(), Some(ModelKind::LinearRegression));
        assert!(metrics["linear_regression"].r2 > 0.999);
        assert_eq!(forecaster.feature_names().unwrap(), &["a", "b"]);
    }

    #[test]
    fn trained_predictions_track_the_target() {
        let data = linear_dataset();
        let mut forecaster = RevenueForecaster::new();
        forecaster.train(&data, &TrainOptions::default()).unwrap();

        let predicted = forecaster.predict(&[vec![10.0, 5.0]]).unwrap();
        assert!((predicted[0] - 40.0).abs() < 1.0, "got {}", predicted[0]);
    }

    #[test]
    fn predict_next_periods_returns_exactly_n_values() {
        let data = linear_dataset();
        let mut forecaster = RevenueForecaster::new();
        forecaster.train(&data, &TrainOptions::default()).unwrap();

        let horizon = forecaster.predict_next_periods(&[10.0, 5.0], 6).unwrap();
        assert_eq!(horizon.len(), 6);
        // A frozen feature vector yields a flat projection.
        for value in &horizon {
            assert_eq!(*value, horizon[0]);
        }
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let data = linear_dataset();
        let mut forecaster = RevenueForecaster::new();
        forecaster.train(&data, &TrainOptions::default()).unwrap();

        let err = forecaster.predict(&[vec![1.0, 2.0, 3.0]]).unwrap_err();
        assert!(matches!(
            err,
            ForecastError::ShapeMismatch { expected: 2, got: 3 }
        ));
    }

    #[test]
    fn single_row_is_rejected() {
        let data = MlData {
            x: vec![vec![1.0]],
            y: vec![1.0],
            feature_names: vec!["a".to_string()],
        };
        let mut forecaster = RevenueForecaster::new();
        let err = forecaster.train(&data, &TrainOptions::default()).unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientData(_)));
    }

    #[test]
    fn small_valid_dataset_still_yields_a_fit() {
        // Nine rows of y = 3a + 1: small, but enough for a split and a fit.
        let data = MlData {
            x: (1..=9).map(|i| vec![i as f64]).collect(),
            y: (1..=9).map(|i| 3.0 * i as f64 + 1.0).collect(),
            feature_names: vec!["a".to_string()],
        };
        let mut forecaster = RevenueForecaster::new();
        let metrics = forecaster
            .train(&data, &TrainOptions::default())
            .unwrap()
            .clone();

        assert!(forecaster.is_trained());
        assert_eq!(metrics.len(), 3);
        let predicted = forecaster.predict(&[vec![10.0]]).unwrap();
        assert!((predicted[0] - 31.0).abs() < 1.0, "got {}", predicted[0]);
    }

    #[test]
    fn saved_artifact_round_trips_with_identical_predictions() {
        let data = linear_dataset();
        let mut forecaster = RevenueForecaster::new();
        forecaster.train(&data, &TrainOptions::default()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("revenue.bin");
        forecaster.save(&path).unwrap();

        let restored = RevenueForecaster::load(&path).unwrap();
        assert_eq!(restored.best_model(), forecaster.best_model());
        assert_eq!(restored.feature_names(), forecaster.feature_names());
        assert_eq!(restored.metrics(), forecaster.metrics());

        let rows = vec![vec![3.0, 4.0], vec![20.0, 1.0]];
        assert_eq!(
            restored.predict(&rows).unwrap(),
            forecaster.predict(&rows).unwrap()
        );
    }

    #[test]
    fn insights_compare_trailing_window_to_horizon() {
        // Trailing six of observed: 100..=105, mean 102.5.
        let observed: Vec<f64> = (95..=105).map(f64::from).collect();
        let predicted = vec![112.75; 4];
        let insights = forecast_insights(&observed, &predicted);

        assert_eq!(insights.current_average, 102.5);
        assert_eq!(insights.predicted_average, 112.75);
        assert_eq!(insights.expected_growth_rate, 10.0);
    }

    #[test]
    fn insights_with_zero_baseline_report_zero_growth() {
        let insights = forecast_insights(&[0.0, 0.0], &[50.0]);
        assert_eq!(insights.expected_growth_rate, 0.0);
    }
}
