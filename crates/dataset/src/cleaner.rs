use chrono::NaiveDate;
use core_types::{RawRecord, Transaction, UNKNOWN_PRODUCT};
use std::collections::HashSet;

/// Date layouts accepted by the cleaning stage, tried in order.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d-%m-%Y", "%m/%d/%Y", "%Y/%m/%d"];

/// What the Cleaning Stage did to a table, for logging and reporting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanSummary {
    pub rows_in: usize,
    pub rows_out: usize,
    pub cells_imputed: usize,
    pub duplicates_removed: usize,
    pub outliers_removed: usize,
    pub unparseable_dates: usize,
}

/// Normalizes a raw transaction table into a `Vec<Transaction>` satisfying
/// the cleaned-table invariants.
///
/// The four steps run in a fixed, semantically meaningful order:
/// imputation, deduplication, date parsing, then per-column outlier
/// filtering. Duplicates are removed before outlier statistics are taken,
/// so those statistics reflect a deduplicated table. The outlier pass is
/// column-by-column against the current table state, which means a column
/// checked later sees a table already shrunk by earlier columns.
#[derive(Debug, Clone)]
pub struct DataCleaner {
    z_threshold: f64,
}

impl Default for DataCleaner {
    fn default() -> Self {
        Self { z_threshold: 3.0 }
    }
}

impl DataCleaner {
    pub fn new(z_threshold: f64) -> Self {
        Self { z_threshold }
    }

    /// Runs the full cleaning pipeline.
    pub fn clean(&self, records: Vec<RawRecord>) -> (Vec<Transaction>, CleanSummary) {
        let mut summary = CleanSummary {
            rows_in: records.len(),
            ..CleanSummary::default()
        };

        let records = impute_missing(records, &mut summary);
        let records = remove_duplicates(records, &mut summary);
        let table = parse_dates(records, &mut summary);
        let table = self.remove_outliers(table, &mut summary);

        summary.rows_out = table.len();
        tracing::info!(
            rows_in = summary.rows_in,
            rows_out = summary.rows_out,
            cells_imputed = summary.cells_imputed,
            duplicates_removed = summary.duplicates_removed,
            outliers_removed = summary.outliers_removed,
            "Cleaning complete"
        );

        (table, summary)
    }

    /// Step 4: drop rows whose value lies `z_threshold` or more standard
    /// deviations from the column mean, one numeric column at a time.
    ///
    /// Each column recomputes mean/std over whatever rows survived the
    /// previous columns, so removal can compound. A column with zero (or
    /// non-finite) standard deviation filters nothing: no value of a
    /// constant column is an outlier.
    fn remove_outliers(
        &self,
        mut table: Vec<Transaction>,
        summary: &mut CleanSummary,
    ) -> Vec<Transaction> {
        let columns: [fn(&Transaction) -> f64; 8] = [
            |t| t.units_sold,
            |t| t.unit_price,
            |t| t.revenue,
            |t| t.costs_of_goods,
            |t| t.marketing_cost,
            |t| t.logistic_cost,
            |t| t.operating_expenses,
            |t| t.other_cost,
        ];

        for column in columns {
            let values: Vec<f64> = table.iter().map(column).collect();
            let Some((mean, std)) = mean_and_std(&values) else {
                continue;
            };
            if std <= 0.0 || !std.is_finite() {
                continue;
            }

            let before = table.len();
            let threshold = self.z_threshold;
            table.retain(|t| ((column(t) - mean) / std).abs() < threshold);
            summary.outliers_removed += before - table.len();
        }

        table
    }
}

/// Step 1: fill missing numeric cells with the column mean (taken over the
/// non-null values) and missing string cells with the "Unknown" sentinel.
fn impute_missing(mut records: Vec<RawRecord>, summary: &mut CleanSummary) -> Vec<RawRecord> {
    let columns: [fn(&mut RawRecord) -> &mut Option<f64>; 8] = [
        |r| &mut r.units_sold,
        |r| &mut r.unit_price,
        |r| &mut r.revenue,
        |r| &mut r.costs_of_goods,
        |r| &mut r.marketing_cost,
        |r| &mut r.logistic_cost,
        |r| &mut r.operating_expenses,
        |r| &mut r.other_cost,
    ];

    for column in columns {
        let (mut sum, mut count) = (0.0, 0usize);
        for record in records.iter_mut() {
            if let Some(v) = *column(record) {
                sum += v;
                count += 1;
            }
        }
        // An entirely empty column has no mean to impute from; fill with 0.
        let mean = if count > 0 { sum / count as f64 } else { 0.0 };

        for record in records.iter_mut() {
            let cell = column(record);
            if cell.is_none() {
                *cell = Some(mean);
                summary.cells_imputed += 1;
            }
        }
    }

    for record in records.iter_mut() {
        if record.product.is_none() {
            record.product = Some(UNKNOWN_PRODUCT.to_string());
            summary.cells_imputed += 1;
        }
    }

    records
}

/// Step 2: drop exact-duplicate rows, keeping the first occurrence.
fn remove_duplicates(records: Vec<RawRecord>, summary: &mut CleanSummary) -> Vec<RawRecord> {
    let before = records.len();
    let mut seen = HashSet::new();
    let deduped: Vec<RawRecord> = records
        .into_iter()
        .filter(|r| seen.insert(row_key(r)))
        .collect();

    summary.duplicates_removed = before - deduped.len();
    if summary.duplicates_removed > 0 {
        tracing::info!(removed = summary.duplicates_removed, "Removed duplicate rows");
    }
    deduped
}

/// A hashable full-row identity. Numeric cells compare bit-for-bit, which is
/// exactly what "exact duplicate" means for values read from the same file.
fn row_key(r: &RawRecord) -> (Option<String>, Option<String>, [u64; 8]) {
    let bits = [
        r.units_sold.unwrap_or(f64::NAN).to_bits(),
        r.unit_price.unwrap_or(f64::NAN).to_bits(),
        r.revenue.unwrap_or(f64::NAN).to_bits(),
        r.costs_of_goods.unwrap_or(f64::NAN).to_bits(),
        r.marketing_cost.unwrap_or(f64::NAN).to_bits(),
        r.logistic_cost.unwrap_or(f64::NAN).to_bits(),
        r.operating_expenses.unwrap_or(f64::NAN).to_bits(),
        r.other_cost.unwrap_or(f64::NAN).to_bits(),
    ];
    (r.date.clone(), r.product.clone(), bits)
}

/// Step 3: parse the date column. Unparseable values become `None` and the
/// row is kept; a table with no date values at all is reported with a
/// warning and date parsing is skipped.
fn parse_dates(records: Vec<RawRecord>, summary: &mut CleanSummary) -> Vec<Transaction> {
    if records.iter().all(|r| r.date.is_none()) {
        tracing::warn!("No date column found; skipping date parsing");
    }

    records
        .into_iter()
        .map(|r| {
            let date = r.date.as_deref().and_then(parse_date);
            if r.date.is_some() && date.is_none() {
                summary.unparseable_dates += 1;
            }
            Transaction {
                date,
                product: r.product.unwrap_or_else(|| UNKNOWN_PRODUCT.to_string()),
                units_sold: r.units_sold.unwrap_or(0.0),
                unit_price: r.unit_price.unwrap_or(0.0),
                revenue: r.revenue.unwrap_or(0.0),
                costs_of_goods: r.costs_of_goods.unwrap_or(0.0),
                marketing_cost: r.marketing_cost.unwrap_or(0.0),
                logistic_cost: r.logistic_cost.unwrap_or(0.0),
                operating_expenses: r.operating_expenses.unwrap_or(0.0),
                other_cost: r.other_cost.unwrap_or(0.0),
            }
        })
        .collect()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Returns `(mean, sample standard deviation)`, or `None` for fewer than
/// two values.
fn mean_and_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some((mean, variance.sqrt()))
}
