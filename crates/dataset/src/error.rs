use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read transaction table: {0}")]
    Read(#[from] csv::Error),

    #[error("Failed to write cleaned table: {0}")]
    Write(#[source] csv::Error),

    #[error("Transaction table at '{0}' contains no rows")]
    EmptyTable(String),
}
