use thiserror::Error;

/// Errors produced while training, evaluating, or persisting forecast models.
#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Model has not been trained yet. Call train() before predicting or saving.")]
    NotTrained,

    #[error("Not enough data to train a model: {0}")]
    InsufficientData(String),

    #[error("Feature shape mismatch: model expects {expected} features but received {got}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("Model training failed: {0}")]
    Training(String),

    #[error("Model prediction failed: {0}")]
    Prediction(String),

    #[error("Failed to persist model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize model artifact: {0}")]
    Serialization(#[from] bincode::Error),
}
