use std::path::PathBuf;

use thiserror::Error;

use crate::models::Field;

pub type Result<T> = std::result::Result<T, DashboardError>;

/// Fatal failures while bringing the dataset into memory.
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error(
        "student dataset not found (tried {}); regenerate the processed CSV from the data preparation notebook first",
        display_paths(.tried)
    )]
    MissingData { tried: Vec<PathBuf> },

    #[error("required column '{missing}' not found; available columns: {available:?}")]
    Schema {
        missing: &'static str,
        available: Vec<String>,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to read dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a single record could not be classified. Recovered as `Status::Unknown`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordClassificationError {
    #[error("{field} is missing")]
    Missing { field: Field },

    #[error("{field} is not numeric: {raw:?}")]
    NonNumeric { field: Field, raw: String },
}

/// Rejections at the counselling form boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputValidationError {
    #[error("semester must be one of 3, 5 or 7 (got {0})")]
    Semester(u8),

    #[error("GPA must be between 0.00 and 4.00 (got {0})")]
    Gpa(f64),

    #[error("credit load must be between 10 and 24 (got {0})")]
    CreditLoad(u32),

    #[error("household income must be at most 100000000 (got {0})")]
    HouseholdIncome(u64),

    #[error("dependents must be between 1 and 10 (got {0})")]
    Dependents(u32),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
