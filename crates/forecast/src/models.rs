use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::RandomForestRegressor;
use smartcore::error::Failed;
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::linear_regression::LinearRegression;
use smartcore::tree::decision_tree_regressor::{
    DecisionTreeRegressor, DecisionTreeRegressorParameters,
};

/// Identifies a candidate model. The enum order is also the scoring order,
/// so earlier variants win ties on the validation score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    LinearRegression,
    RandomForest,
    GradientBoosting,
}

impl ModelKind {
    /// Stable key used in the metrics map and in the saved artifact.
    pub fn key(&self) -> &'static str {
        match self {
            ModelKind::LinearRegression => "linear_regression",
            ModelKind::RandomForest => "random_forest",
            ModelKind::GradientBoosting => "gradient_boosting",
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ModelKind::LinearRegression => "Linear Regression",
            ModelKind::RandomForest => "Random Forest",
            ModelKind::GradientBoosting => "Gradient Boosting",
        };
        write!(f, "{label}")
    }
}

/// A fitted regression model of any of the three supported kinds.
///
/// Wrapping the concrete `smartcore` types in one enum keeps the saved
/// artifact self-describing: deserializing it restores the right model
/// without the caller knowing which kind won training.
#[derive(Serialize, Deserialize)]
pub enum ForecastModel {
    Linear(LinearRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>),
    RandomForest(RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>),
    GradientBoosting(GradientBoostingRegressor),
}

impl ForecastModel {
    pub fn predict(&self, x: &DenseMatrix<f64>) -> Result<Vec<f64>, Failed> {
        match self {
            ForecastModel::Linear(model) => model.predict(x),
            ForecastModel::RandomForest(model) => model.predict(x),
            ForecastModel::GradientBoosting(model) => model.predict(x),
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            ForecastModel::Linear(_) => ModelKind::LinearRegression,
            ForecastModel::RandomForest(_) => ModelKind::RandomForest,
            ForecastModel::GradientBoosting(_) => ModelKind::GradientBoosting,
        }
    }
}

/// Hyperparameters for [`GradientBoostingRegressor`].
#[derive(Debug, Clone)]
pub struct GradientBoostingParameters {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: u16,
}

impl Default for GradientBoostingParameters {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 5,
        }
    }
}

/// Gradient-boosted regression trees built on `smartcore`'s decision tree.
///
/// `smartcore` ships random forests but no boosting regressor, so this
/// implements the standard least-squares formulation: start from the mean
/// of the targets, then repeatedly fit a shallow tree to the residuals and
/// add its (shrunk) predictions to the running estimate.
#[derive(Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    base_prediction: f64,
    learning_rate: f64,
    trees: Vec<DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>>,
}

impl GradientBoostingRegressor {
    pub fn fit(
        x: &DenseMatrix<f64>,
        y: &Vec<f64>,
        params: GradientBoostingParameters,
    ) -> Result<Self, Failed> {
        let base_prediction = y.iter().sum::<f64>() / y.len() as f64;
        let mut current: Vec<f64> = vec![base_prediction; y.len()];
        let mut trees = Vec::with_capacity(params.n_estimators);

        for _ in 0..params.n_estimators {
            let residuals: Vec<f64> = y
                .iter()
                .zip(current.iter())
                .map(|(target, estimate)| target - estimate)
                .collect();

            let tree = DecisionTreeRegressor::fit(
                x,
                &residuals,
                DecisionTreeRegressorParameters::default().with_max_depth(params.max_depth),
            )?;

            let corrections = tree.predict(x)?;
            for (estimate, correction) in current.iter_mut().zip(corrections.iter()) {
                *estimate += params.learning_rate * correction;
            }
            trees.push(tree);
        }

        Ok(Self {
            base_prediction,
            learning_rate: params.learning_rate,
            trees,
        })
    }

    pub fn predict(&self, x: &DenseMatrix<f64>) -> Result<Vec<f64>, Failed> {
        let mut predictions = vec![self.base_prediction; x.shape().0];
        for tree in &self.trees {
            let corrections = tree.predict(x)?;
            for (prediction, correction) in predictions.iter_mut().zip(corrections.iter()) {
                *prediction += self.learning_rate * correction;
            }
        }
        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boosting_fits_residuals_toward_targets() {
        // y = 10 * x, easily captured by a few shallow trees.
        let rows: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64]).collect();
        let x = DenseMatrix::from_2d_vec(&rows).unwrap();
        let y: Vec<f64> = (0..30).map(|i| 10.0 * i as f64).collect();

        let model = GradientBoostingRegressor::fit(
            &x,
            &y,
            GradientBoostingParameters::default(),
        )
        .unwrap();
        let predictions = model.predict(&x).unwrap();

        let mean = y.iter().sum::<f64>() / y.len() as f64;
        let mae_vs_mean: f64 =
            y.iter().map(|v| (v - mean).abs()).sum::<f64>() / y.len() as f64;
        let mae: f64 = y
            .iter()
            .zip(predictions.iter())
            .map(|(t, p)| (t - p).abs())
            .sum::<f64>()
            / y.len() as f64;

        // The boosted ensemble must beat the constant mean baseline by a wide margin.
        assert!(mae < mae_vs_mean / 4.0, "mae={mae}, baseline={mae_vs_mean}");
    }

    #[test]
    fn boosting_with_zero_trees_predicts_the_mean() {
        let rows: Vec<Vec<f64>> = (0..5).map(|i| vec![i as f64]).collect();
        let x = DenseMatrix::from_2d_vec(&rows).unwrap();
        let y = vec![2.0, 4.0, 6.0, 8.0, 10.0];

        let params = GradientBoostingParameters {
            n_estimators: 0,
            ..Default::default()
        };
        let model = GradientBoostingRegressor::fit(&x, &y, params).unwrap();
        let predictions = model.predict(&x).unwrap();

        for p in predictions {
            assert!((p - 6.0).abs() < 1e-12);
        }
    }
}
