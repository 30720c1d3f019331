//! # Feature Engineering Stage
//!
//! Turns a cleaned transaction table into a numeric feature matrix for the
//! Forecast Engine: calendar parts, lagged target values, rolling
//! statistics and growth rates, followed by a warm-up trim of rows whose
//! derived values are incomplete.
//!
//! The pipeline is an explicit sequence of transformations, each taking and
//! returning a `DataFrame` snapshot, so the ordering dependencies between
//! steps stay auditable. Rows are consumed in table order: lag and rolling
//! features are only chronologically meaningful if the caller sorts the
//! table by date first.

use anyhow::{Context, Result, bail};
use chrono::Datelike;
use core_types::Transaction;
use ndarray::Array2;
use polars::prelude::*;

/// Knobs for the feature pipeline.
#[derive(Debug, Clone)]
pub struct FeatureParams {
    /// Column the lag/rolling/growth derivations are computed over, and the
    /// value the forecast models will learn to predict.
    pub target: String,
    /// Lag periods, in rows.
    pub lags: Vec<usize>,
    /// Trailing window sizes for rolling mean and std.
    pub windows: Vec<usize>,
    /// Whether to append a running total of the target.
    pub cumulative: bool,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            target: "Revenue".to_string(),
            lags: vec![1, 2, 3],
            windows: vec![3, 5],
            cumulative: false,
        }
    }
}

/// The (X, y) split handed to the Forecast Engine.
#[derive(Debug, Clone)]
pub struct MlData {
    /// Row-major feature matrix: every numeric column except the target.
    pub x: Vec<Vec<f64>>,
    /// Target column values.
    pub y: Vec<f64>,
    /// Column names of `x`, in matrix order.
    pub feature_names: Vec<String>,
}

/// Generates the feature matrix from a cleaned table.
///
/// Warm-up rows (missing lag/rolling/growth values) and rows without a
/// parseable date (missing calendar values) are dropped at the end, not
/// lazily.
pub fn engineer_features(table: &[Transaction], params: &FeatureParams) -> Result<DataFrame> {
    let df = base_frame(table)?;
    let df = with_calendar_features(df, table)?;
    let df = with_lag_features(df, &params.target, &params.lags)?;
    let df = with_rolling_features(df, &params.target, &params.windows)?;
    let df = with_growth_rate(df, &params.target)?;
    let df = if params.cumulative {
        with_cumulative_sum(df, &params.target)?
    } else {
        df
    };

    let complete = df.drop_nulls::<&str>(None)?;
    tracing::debug!(
        rows_in = table.len(),
        rows_out = complete.height(),
        columns = complete.width(),
        "Feature matrix generated"
    );
    Ok(complete)
}

/// Splits the feature matrix into features (X) and target (y).
pub fn prepare_ml_data(df: &DataFrame, target: &str) -> Result<MlData> {
    if !df.get_column_names().contains(&target) {
        bail!("Target column '{target}' not found in feature matrix");
    }
    if df.height() == 0 {
        bail!("Feature matrix is empty after warm-up trimming; not enough rows to learn from");
    }

    let x_df = df.drop(target)?;
    let feature_names: Vec<String> = x_df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let x_ndarray: Array2<f64> = x_df
        .to_ndarray::<Float64Type>(IndexOrder::C)
        .context("Failed to convert feature matrix to ndarray")?;
    let x: Vec<Vec<f64>> = x_ndarray.outer_iter().map(|row| row.to_vec()).collect();

    let y: Vec<f64> = df
        .column(target)?
        .f64()?
        .into_no_null_iter()
        .collect();

    Ok(MlData {
        x,
        y,
        feature_names,
    })
}

/// The raw numeric columns of the cleaned table, all as f64 series.
fn base_frame(table: &[Transaction]) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        Series::new("Units_sold", column(table, |t| t.units_sold)),
        Series::new("Price", column(table, |t| t.unit_price)),
        Series::new("Revenue", column(table, |t| t.revenue)),
        Series::new("Costs_Of_Goods", column(table, |t| t.costs_of_goods)),
        Series::new("Marketing_Cost", column(table, |t| t.marketing_cost)),
        Series::new("Logistic_Cost", column(table, |t| t.logistic_cost)),
        Series::new("Operating_Expenses", column(table, |t| t.operating_expenses)),
        Series::new("Other_Cost", column(table, |t| t.other_cost)),
    ])?;
    Ok(df)
}

/// Month, quarter, year, day-of-week (Monday = 0) and weekend flag from the
/// date column. Rows without a date get nulls and fall to the final trim.
fn with_calendar_features(mut df: DataFrame, table: &[Transaction]) -> Result<DataFrame> {
    let months: Vec<Option<f64>> = table
        .iter()
        .map(|t| t.date.map(|d| d.month() as f64))
        .collect();
    let quarters: Vec<Option<f64>> = table
        .iter()
        .map(|t| t.date.map(|d| ((d.month() - 1) / 3 + 1) as f64))
        .collect();
    let years: Vec<Option<f64>> = table
        .iter()
        .map(|t| t.date.map(|d| d.year() as f64))
        .collect();
    let weekdays: Vec<Option<f64>> = table
        .iter()
        .map(|t| t.date.map(|d| d.weekday().num_days_from_monday() as f64))
        .collect();
    let weekends: Vec<Option<f64>> = weekdays
        .iter()
        .map(|w| w.map(|d| if d >= 5.0 { 1.0 } else { 0.0 }))
        .collect();

    df.with_column(Series::new("Month", months))?;
    df.with_column(Series::new("Quarter", quarters))?;
    df.with_column(Series::new("Year", years))?;
    df.with_column(Series::new("Day_of_Week", weekdays))?;
    df.with_column(Series::new("Is_Weekend", weekends))?;
    Ok(df)
}

/// `{target}_Lag_{n}`: the target value n rows back.
fn with_lag_features(mut df: DataFrame, target: &str, lags: &[usize]) -> Result<DataFrame> {
    let values = target_values(&df, target)?;
    for &lag in lags {
        let lagged = lag_column(&values, lag);
        df.with_column(Series::new(&format!("{target}_Lag_{lag}"), lagged))?;
    }
    Ok(df)
}

/// `{target}_MA_{w}` and `{target}_STD_{w}`: trailing mean and sample std
/// over windows of size w.
fn with_rolling_features(mut df: DataFrame, target: &str, windows: &[usize]) -> Result<DataFrame> {
    let values = target_values(&df, target)?;
    for &window in windows {
        let means = rolling_mean(&values, window);
        let stds = rolling_std(&values, window);
        df.with_column(Series::new(&format!("{target}_MA_{window}"), means))?;
        df.with_column(Series::new(&format!("{target}_STD_{window}"), stds))?;
    }
    Ok(df)
}

/// `{target}_Growth`: percent change from the previous row.
fn with_growth_rate(mut df: DataFrame, target: &str) -> Result<DataFrame> {
    let values = target_values(&df, target)?;
    let growth = pct_change(&values);
    df.with_column(Series::new(&format!("{target}_Growth"), growth))?;
    Ok(df)
}

/// `{target}_Cumsum`: running total of the target.
fn with_cumulative_sum(mut df: DataFrame, target: &str) -> Result<DataFrame> {
    let values = target_values(&df, target)?;
    let mut total = 0.0;
    let cumsum: Vec<f64> = values
        .iter()
        .map(|v| {
            total += v;
            total
        })
        .collect();
    df.with_column(Series::new(&format!("{target}_Cumsum"), cumsum))?;
    Ok(df)
}

fn target_values(df: &DataFrame, target: &str) -> Result<Vec<f64>> {
    let values = df
        .column(target)
        .with_context(|| format!("Target column '{target}' not found"))?
        .f64()?
        .into_no_null_iter()
        .collect();
    Ok(values)
}

fn column(table: &[Transaction], value: impl Fn(&Transaction) -> f64) -> Vec<f64> {
    table.iter().map(value).collect()
}

/// Values shifted back by `periods` rows; the first `periods` rows have no
/// lagged value.
fn lag_column(values: &[f64], periods: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if i < periods {
                None
            } else {
                Some(values[i - periods])
            }
        })
        .collect()
}

/// Trailing mean over windows of exactly `window` values.
fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                return None;
            }
            let slice = &values[i + 1 - window..=i];
            Some(slice.iter().sum::<f64>() / window as f64)
        })
        .collect()
}

/// Trailing sample standard deviation over windows of exactly `window`
/// values. A window of one has no sample deviation.
fn rolling_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if window < 2 || i + 1 < window {
                return None;
            }
            let slice = &values[i + 1 - window..=i];
            let mean = slice.iter().sum::<f64>() / window as f64;
            let variance =
                slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (window as f64 - 1.0);
            Some(variance.sqrt())
        })
        .collect()
}

/// Percent change from the previous row, ×100. The first row (and any row
/// following a zero) has no defined change.
fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if i == 0 {
                return None;
            }
            let previous = values[i - 1];
            if previous == 0.0 {
                None
            } else {
                Some((values[i] - previous) / previous * 100.0)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn table(n: usize) -> Vec<Transaction> {
        (0..n)
            .map(|i| Transaction {
                date: NaiveDate::from_ymd_opt(2023, 1, 1)
                    .unwrap()
                    .checked_add_days(chrono::Days::new(i as u64)),
                product: "Widget".to_string(),
                units_sold: 2.0,
                unit_price: 50.0 + i as f64,
                revenue: 100.0 + i as f64,
                costs_of_goods: 40.0,
                marketing_cost: 10.0,
                logistic_cost: 5.0,
                operating_expenses: 8.0,
                other_cost: 2.0,
            })
            .collect()
    }

    #[test]
    fn warm_up_rows_are_dropped() {
        let params = FeatureParams::default();
        let df = engineer_features(&table(20), &params).unwrap();
        // Largest warm-up: the 5-row rolling window leaves 4 incomplete rows.
        assert_eq!(df.height(), 16);

        let names = df.get_column_names();
        for expected in [
            "Month",
            "Quarter",
            "Year",
            "Day_of_Week",
            "Is_Weekend",
            "Revenue_Lag_1",
            "Revenue_Lag_3",
            "Revenue_MA_3",
            "Revenue_STD_5",
            "Revenue_Growth",
        ] {
            assert!(names.contains(&expected), "missing column {expected}");
        }
    }

    #[test]
    fn lag_feature_is_previous_row_value() {
        let df = engineer_features(&table(20), &FeatureParams::default()).unwrap();
        let revenue: Vec<f64> = df.column("Revenue").unwrap().f64().unwrap().into_no_null_iter().collect();
        let lag1: Vec<f64> = df
            .column("Revenue_Lag_1")
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();

        // First surviving row is original row 4 (revenue 104); its lag-1
        // value is original row 3 (revenue 103).
        assert_eq!(revenue[0], 104.0);
        assert_eq!(lag1[0], 103.0);
        // Within the surviving block, lag-1 equals the previous row.
        for i in 1..revenue.len() {
            assert_eq!(lag1[i], revenue[i - 1]);
        }
    }

    #[test]
    fn rows_without_dates_are_dropped() {
        let mut rows = table(20);
        rows[10].date = None;
        let df = engineer_features(&rows, &FeatureParams::default()).unwrap();
        assert_eq!(df.height(), 15);
    }

    #[test]
    fn cumulative_sum_is_running_total() {
        let params = FeatureParams {
            cumulative: true,
            ..FeatureParams::default()
        };
        let df = engineer_features(&table(10), &params).unwrap();
        let cumsum: Vec<f64> = df
            .column("Revenue_Cumsum")
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        // Original row 4 carries the running total of rows 0..=4.
        assert_eq!(cumsum[0], 100.0 + 101.0 + 102.0 + 103.0 + 104.0);
    }

    #[test]
    fn ml_split_excludes_target_and_aligns_shapes() {
        let df = engineer_features(&table(20), &FeatureParams::default()).unwrap();
        let data = prepare_ml_data(&df, "Revenue").unwrap();

        assert_eq!(data.x.len(), data.y.len());
        assert_eq!(data.x[0].len(), data.feature_names.len());
        assert!(!data.feature_names.iter().any(|n| n == "Revenue"));
        assert!(data.feature_names.iter().any(|n| n == "Revenue_Lag_1"));
        assert_eq!(data.y[0], 104.0);
    }

    #[test]
    fn missing_target_column_is_an_error() {
        let df = engineer_features(&table(20), &FeatureParams::default()).unwrap();
        assert!(prepare_ml_data(&df, "Bookings").is_err());
    }
}
