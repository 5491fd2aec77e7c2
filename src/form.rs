use clap::Args;

use crate::error::InputValidationError;
use crate::models::{CounselingProfile, StressLevel, TimeManagement};

pub const SEMESTERS: [u8; 3] = [3, 5, 7];
pub const MAX_HOUSEHOLD_INCOME: u64 = 100_000_000;

/// Raw counselling form input, before any range checks.
#[derive(Debug, Clone, Args)]
pub struct CounselingForm {
    #[arg(long, default_value = "Mahasiswa Simulasi")]
    pub name: String,
    #[arg(long, default_value_t = 5)]
    pub semester: u8,
    #[arg(long, default_value_t = 3.15)]
    pub gpa: f64,
    #[arg(long, default_value_t = 21)]
    pub credit_load: u32,
    #[arg(long, default_value_t = 3_000_000)]
    pub household_income: u64,
    #[arg(long, default_value_t = 4)]
    pub dependents: u32,
    #[arg(long, value_enum, default_value_t = StressLevel::Moderate)]
    pub stress: StressLevel,
    #[arg(long, value_enum, default_value_t = TimeManagement::Adequate)]
    pub time_management: TimeManagement,
}

impl CounselingForm {
    pub fn validate(self) -> Result<CounselingProfile, InputValidationError> {
        if !SEMESTERS.contains(&self.semester) {
            return Err(InputValidationError::Semester(self.semester));
        }
        if !(0.0..=4.0).contains(&self.gpa) {
            return Err(InputValidationError::Gpa(self.gpa));
        }
        if !(10..=24).contains(&self.credit_load) {
            return Err(InputValidationError::CreditLoad(self.credit_load));
        }
        if self.household_income > MAX_HOUSEHOLD_INCOME {
            return Err(InputValidationError::HouseholdIncome(self.household_income));
        }
        if !(1..=10).contains(&self.dependents) {
            return Err(InputValidationError::Dependents(self.dependents));
        }

        Ok(CounselingProfile {
            name: self.name,
            semester: self.semester,
            gpa: self.gpa,
            credit_load: self.credit_load,
            household_income: self.household_income,
            dependents: self.dependents,
            stress_level: self.stress,
            time_management: self.time_management,
        })
    }
}
