use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sentinel used to fill missing string cells during cleaning.
pub const UNKNOWN_PRODUCT: &str = "Unknown";

/// A single row of a business-activity export, exactly as it arrives.
///
/// Every cell is optional: real exports contain blank cells, and the
/// Cleaning Stage (not the loader) decides how to fill them. Field names
/// map to the CSV headers of the export format; columns the engine does
/// not understand are simply ignored by the reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "Date", default)]
    pub date: Option<String>,

    #[serde(rename = "Product_Name", default)]
    pub product: Option<String>,

    #[serde(rename = "Units_sold", default)]
    pub units_sold: Option<f64>,

    #[serde(rename = "Price", default)]
    pub unit_price: Option<f64>,

    #[serde(rename = "Revenue", default)]
    pub revenue: Option<f64>,

    #[serde(rename = "Costs_Of_Goods", default)]
    pub costs_of_goods: Option<f64>,

    #[serde(rename = "Marketing_Cost", default)]
    pub marketing_cost: Option<f64>,

    #[serde(rename = "Logistic_Cost", default)]
    pub logistic_cost: Option<f64>,

    #[serde(rename = "Operating_Expenses", default)]
    pub operating_expenses: Option<f64>,

    #[serde(rename = "Other_Cost", default)]
    pub other_cost: Option<f64>,
}

/// A cleaned transaction row.
///
/// Invariants (established by the Cleaning Stage):
/// - no numeric cell is missing (imputed with the column mean),
/// - `product` is never empty ("Unknown" sentinel),
/// - `date` is a valid calendar date where the raw value was parseable,
///   `None` otherwise (unparseable dates are nulled, not dropped).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "Date")]
    pub date: Option<NaiveDate>,

    #[serde(rename = "Product_Name")]
    pub product: String,

    #[serde(rename = "Units_sold")]
    pub units_sold: f64,

    #[serde(rename = "Price")]
    pub unit_price: f64,

    #[serde(rename = "Revenue")]
    pub revenue: f64,

    #[serde(rename = "Costs_Of_Goods")]
    pub costs_of_goods: f64,

    #[serde(rename = "Marketing_Cost")]
    pub marketing_cost: f64,

    #[serde(rename = "Logistic_Cost")]
    pub logistic_cost: f64,

    #[serde(rename = "Operating_Expenses")]
    pub operating_expenses: f64,

    #[serde(rename = "Other_Cost")]
    pub other_cost: f64,
}
