//! # Dataset Ingestion & Cleaning
//!
//! This crate owns the first stage of the analysis pipeline: reading the
//! delimited transaction export from disk and normalizing it into a cleaned
//! table of [`core_types::Transaction`] rows.
//!
//! ## Architectural Principles
//!
//! - **Pure pipeline:** cleaning is a fixed sequence of transformations,
//!   each taking and returning a table snapshot, so ordering dependencies
//!   (dedup before outlier statistics, column-by-column z-score filtering)
//!   stay auditable.
//! - **Degeneracies are not errors:** blank cells, unparseable dates and a
//!   wholly absent date column are normalized or logged, never raised. Only
//!   genuine input errors (unreadable file, malformed CSV) surface as
//!   [`DatasetError`].

pub mod cleaner;
pub mod error;
pub mod loader;

// Re-export the key components to create a clean, public-facing API.
pub use cleaner::{CleanSummary, DataCleaner};
pub use error::DatasetError;
pub use loader::{load_csv, write_csv};
