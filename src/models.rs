use std::fmt;

use clap::ValueEnum;
use serde::Serialize;

/// Canonical dataset columns, after alias resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Field {
    Gpa,
    EconomicIndex,
    StressManagement,
    CreditLoad,
    Program,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Gpa,
        Field::EconomicIndex,
        Field::StressManagement,
        Field::CreditLoad,
        Field::Program,
    ];

    pub fn canonical_name(self) -> &'static str {
        match self {
            Field::Gpa => "GPA",
            Field::EconomicIndex => "EconomicIndex",
            Field::StressManagement => "StressManagement",
            Field::CreditLoad => "CreditLoad",
            Field::Program => "Program",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// A numeric cell as it came out of the dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Value(f64),
    Missing,
    Invalid(String),
}

impl Reading {
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim) else {
            return Reading::Missing;
        };
        if raw.is_empty() {
            return Reading::Missing;
        }
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Reading::Value(value),
            _ => Reading::Invalid(raw.to_string()),
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Reading::Value(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Value(value) => write!(f, "{value}"),
            Reading::Missing => Ok(()),
            Reading::Invalid(raw) => f.write_str(raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentRecord {
    pub gpa: Reading,
    pub economic_index: Reading,
    pub stress_management: Reading,
    pub credit_load: Option<u32>,
    pub program: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    EconomicallyVulnerable,
    StressVulnerable,
    Safe,
    Unknown,
}

impl Status {
    pub fn is_at_risk(self) -> bool {
        self != Status::Safe
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Status::EconomicallyVulnerable => "Economically vulnerable",
            Status::StressVulnerable => "Stress vulnerable",
            Status::Safe => "Safe",
            Status::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRecord {
    pub record: StudentRecord,
    pub status: Status,
}

/// Self-reported stress, from calmest to most stressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StressLevel {
    #[value(alias = "sangat-rendah")]
    VeryLow,
    #[value(alias = "rendah")]
    Low,
    #[value(alias = "sedang")]
    Moderate,
    #[value(alias = "tinggi")]
    High,
    #[value(alias = "sangat-tinggi")]
    VeryHigh,
}

impl StressLevel {
    pub fn label(self) -> &'static str {
        match self {
            StressLevel::VeryLow => "Sangat Rendah",
            StressLevel::Low => "Rendah",
            StressLevel::Moderate => "Sedang",
            StressLevel::High => "Tinggi",
            StressLevel::VeryHigh => "Sangat Tinggi",
        }
    }
}

/// Self-reported time management. Captured but not scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TimeManagement {
    #[value(alias = "sangat-buruk")]
    VeryPoor,
    #[value(alias = "buruk")]
    Poor,
    #[value(alias = "cukup")]
    Adequate,
    #[value(alias = "baik")]
    Good,
    #[value(alias = "sangat-baik")]
    VeryGood,
}

impl TimeManagement {
    pub fn label(self) -> &'static str {
        match self {
            TimeManagement::VeryPoor => "Sangat Buruk",
            TimeManagement::Poor => "Buruk",
            TimeManagement::Adequate => "Cukup",
            TimeManagement::Good => "Baik",
            TimeManagement::VeryGood => "Sangat Baik",
        }
    }
}

/// A validated counselling form. Only `form::CounselingForm::validate` builds one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CounselingProfile {
    pub name: String,
    pub semester: u8,
    pub gpa: f64,
    pub credit_load: u32,
    pub household_income: u64,
    pub dependents: u32,
    pub stress_level: StressLevel,
    pub time_management: TimeManagement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EconomicStatus {
    Critical,
    Vulnerable,
    Prosperous,
}

impl fmt::Display for EconomicStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EconomicStatus::Critical => "CRITICAL",
            EconomicStatus::Vulnerable => "VULNERABLE",
            EconomicStatus::Prosperous => "PROSPEROUS",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MentalHealthStatus {
    Burnout,
    Stable,
}

impl fmt::Display for MentalHealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MentalHealthStatus::Burnout => "BURNOUT",
            MentalHealthStatus::Stable => "STABLE",
        };
        f.write_str(label)
    }
}

/// Gauge banding of the risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    Low,
    Elevated,
    Severe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MandatoryIntervention {
    FinancialAid,
    PsychologicalCounseling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DevelopmentalRecommendation {
    CampusPartTimeWork,
    InternshipAcceleration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Insight {
    BelowPovertyLine {
        income_per_capita: f64,
        poverty_line: f64,
    },
    BurnoutRisk {
        credit_load: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskReport {
    pub student_name: String,
    pub income_per_capita: f64,
    pub economic_ratio: f64,
    pub stress_level: StressLevel,
    pub stress_score: u8,
    /// Echoed from the form; not part of the score.
    pub time_management: TimeManagement,
    pub score: u8,
    pub band: RiskBand,
    pub economic_status: EconomicStatus,
    pub mental_health_status: MentalHealthStatus,
    pub mandatory: Vec<MandatoryIntervention>,
    pub no_urgent_intervention: bool,
    pub developmental: Vec<DevelopmentalRecommendation>,
    pub insights: Vec<Insight>,
}
