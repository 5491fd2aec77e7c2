use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{DashboardError, Result};

/// Regional poverty line (per capita, monthly).
pub const DEFAULT_POVERTY_LINE: f64 = 928_278.0;
/// Regional minimum wage. Carried as configuration, not used in scoring.
pub const DEFAULT_MINIMUM_WAGE: f64 = 5_396_761.0;

/// Processed dataset file names, in the order they are tried.
pub const DATASET_CANDIDATES: [&str; 2] = [
    "processed_data_final.csv",
    "processed_data_for_dashboard.csv",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Constants {
    pub poverty_line: f64,
    pub minimum_wage: f64,
}

impl Default for Constants {
    fn default() -> Self {
        Self {
            poverty_line: DEFAULT_POVERTY_LINE,
            minimum_wage: DEFAULT_MINIMUM_WAGE,
        }
    }
}

impl Constants {
    pub fn new(poverty_line: f64, minimum_wage: f64) -> Result<Self> {
        let constants = Self {
            poverty_line,
            minimum_wage,
        };
        constants.validate()?;
        Ok(constants)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.poverty_line.is_finite() || self.poverty_line <= 0.0 {
            return Err(DashboardError::Config(format!(
                "poverty line must be a positive amount (got {})",
                self.poverty_line
            )));
        }
        if !self.minimum_wage.is_finite() || self.minimum_wage < 0.0 {
            return Err(DashboardError::Config(format!(
                "minimum wage must not be negative (got {})",
                self.minimum_wage
            )));
        }
        Ok(())
    }
}

/// Where the processed dataset lives.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    /// An explicit file; no fallback.
    File(PathBuf),
    /// A directory searched for `DATASET_CANDIDATES` in order.
    Directory(PathBuf),
}

impl DataSource {
    pub fn from_args(file: Option<PathBuf>, dir: &Path) -> Self {
        match file {
            Some(path) => DataSource::File(path),
            None => DataSource::Directory(dir.to_path_buf()),
        }
    }

    pub fn candidates(&self) -> Vec<PathBuf> {
        match self {
            DataSource::File(path) => vec![path.clone()],
            DataSource::Directory(dir) => DATASET_CANDIDATES
                .iter()
                .map(|name| dir.join(name))
                .collect(),
        }
    }

    /// First candidate that exists on disk.
    pub fn resolve(&self) -> Result<PathBuf> {
        let tried = self.candidates();
        tried
            .iter()
            .find(|path| path.is_file())
            .cloned()
            .ok_or(DashboardError::MissingData { tried })
    }
}
