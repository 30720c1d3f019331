use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use settings::{AnalysisSettings, Config, ForecastSettings};

/// Loads the application configuration.
///
/// When `path` is `None` the built-in defaults are used. When a path is
/// given, the file is read and deserialized into our strongly-typed
/// `Config` struct; sections missing from the file fall back to defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let builder = config::Config::builder()
        .add_source(config::File::from(path))
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct.
    let config = builder.try_deserialize::<Config>()?;

    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    let f = &config.forecasting;
    if !(f.test_size > 0.0 && f.test_size < 1.0) {
        return Err(ConfigError::InvalidSetting {
            setting: "forecasting.test_size",
            reason: format!("must be in (0, 1), got {}", f.test_size),
        });
    }
    if config.analysis.z_score_threshold <= 0.0 {
        return Err(ConfigError::InvalidSetting {
            setting: "analysis.z_score_threshold",
            reason: format!("must be positive, got {}", config.analysis.z_score_threshold),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_no_file_given() {
        let config = load_config(None).unwrap();
        assert_eq!(config.analysis.current_cash, 50_000.0);
        assert_eq!(config.analysis.initial_investment, 100_000.0);
        assert_eq!(config.forecasting.target_column, "Revenue");
        assert_eq!(config.forecasting.lag_periods, vec![1, 2, 3]);
        assert_eq!(config.forecasting.forecast_periods, 6);
    }

    #[test]
    fn rejects_out_of_range_test_size() {
        let mut config = Config::default();
        config.forecasting.test_size = 1.5;
        let err = validate(&config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidSetting {
                setting: "forecasting.test_size",
                ..
            }
        ));
    }
}
