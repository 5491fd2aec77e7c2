use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::RecordClassificationError;
use crate::models::{ClassifiedRecord, Field, Reading, Status, StudentRecord};

/// Economic index below which a student counts as economically vulnerable.
pub const ECONOMIC_INDEX_THRESHOLD: f64 = 1.0;
/// Stress-management score below which a student counts as stress vulnerable.
pub const STRESS_MANAGEMENT_THRESHOLD: f64 = 2.5;
pub const DEFAULT_TOP_AT_RISK: usize = 10;

/// First matching rule wins: economic index, then stress management.
pub fn classify(record: &StudentRecord) -> Result<Status, RecordClassificationError> {
    let economic_index = numeric(&record.economic_index, Field::EconomicIndex)?;
    let stress_management = numeric(&record.stress_management, Field::StressManagement)?;

    if economic_index < ECONOMIC_INDEX_THRESHOLD {
        Ok(Status::EconomicallyVulnerable)
    } else if stress_management < STRESS_MANAGEMENT_THRESHOLD {
        Ok(Status::StressVulnerable)
    } else {
        Ok(Status::Safe)
    }
}

fn numeric(reading: &Reading, field: Field) -> Result<f64, RecordClassificationError> {
    match reading {
        Reading::Value(value) => Ok(*value),
        Reading::Missing => Err(RecordClassificationError::Missing { field }),
        Reading::Invalid(raw) => Err(RecordClassificationError::NonNumeric {
            field,
            raw: raw.clone(),
        }),
    }
}

/// Classifies every record independently; unclassifiable records become `Unknown`.
pub fn classify_all(records: Vec<StudentRecord>) -> Vec<ClassifiedRecord> {
    let mut unknown = 0usize;
    let classified: Vec<ClassifiedRecord> = records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let status = match classify(&record) {
                Ok(status) => status,
                Err(err) => {
                    debug!(row = index + 1, error = %err, "record classified as unknown");
                    unknown += 1;
                    Status::Unknown
                }
            };
            ClassifiedRecord { record, status }
        })
        .collect();

    if unknown > 0 {
        warn!(unknown, total = classified.len(), "records could not be classified");
    }
    classified
}

/// Empty lists select everything.
#[derive(Debug, Clone, Default)]
pub struct DashboardFilter {
    pub programs: Vec<String>,
    pub statuses: Vec<Status>,
}

impl DashboardFilter {
    pub fn matches(&self, classified: &ClassifiedRecord) -> bool {
        let program_ok =
            self.programs.is_empty() || self.programs.contains(&classified.record.program);
        let status_ok = self.statuses.is_empty() || self.statuses.contains(&classified.status);
        program_ok && status_ok
    }

    pub fn apply<'a>(&self, records: &'a [ClassifiedRecord]) -> Vec<&'a ClassifiedRecord> {
        records.iter().filter(|record| self.matches(record)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateStats {
    pub total: usize,
    pub at_risk: usize,
    pub safe: usize,
    /// Mean over records with a numeric GPA; 0.0 when there are none.
    pub mean_gpa: f64,
    pub economically_vulnerable: usize,
    pub stress_vulnerable: usize,
    pub unknown: usize,
}

pub fn aggregate(records: &[&ClassifiedRecord]) -> AggregateStats {
    let mut stats = AggregateStats {
        total: records.len(),
        at_risk: 0,
        safe: 0,
        mean_gpa: 0.0,
        economically_vulnerable: 0,
        stress_vulnerable: 0,
        unknown: 0,
    };

    for classified in records {
        match classified.status {
            Status::EconomicallyVulnerable => stats.economically_vulnerable += 1,
            Status::StressVulnerable => stats.stress_vulnerable += 1,
            Status::Safe => stats.safe += 1,
            Status::Unknown => stats.unknown += 1,
        }
    }
    stats.at_risk = stats.total - stats.safe;
    stats.mean_gpa = mean_gpa(records.iter().copied());
    stats
}

fn mean_gpa<'a>(records: impl Iterator<Item = &'a ClassifiedRecord>) -> f64 {
    let (sum, count) = records
        .filter_map(|classified| classified.record.gpa.value())
        .fold((0.0, 0usize), |(sum, count), gpa| (sum + gpa, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// At-risk records, most economically vulnerable first. Records without an
/// economic index sort last.
pub fn top_at_risk<'a>(records: &[&'a ClassifiedRecord], limit: usize) -> Vec<&'a ClassifiedRecord> {
    let mut at_risk: Vec<&ClassifiedRecord> = records
        .iter()
        .copied()
        .filter(|classified| classified.status.is_at_risk())
        .collect();

    at_risk.sort_by(|a, b| {
        match (
            a.record.economic_index.value(),
            b.record.economic_index.value(),
        ) {
            (Some(left), Some(right)) => left.total_cmp(&right),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
    at_risk.truncate(limit);
    at_risk
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramSummary {
    pub program: String,
    pub total: usize,
    pub at_risk: usize,
    pub mean_gpa: f64,
}

pub fn summarize_by_program(records: &[&ClassifiedRecord]) -> Vec<ProgramSummary> {
    let mut map: HashMap<&str, Vec<&ClassifiedRecord>> = HashMap::new();

    for &classified in records {
        map.entry(classified.record.program.as_str())
            .or_default()
            .push(classified);
    }

    let mut summaries: Vec<ProgramSummary> = map
        .into_iter()
        .map(|(program, members)| ProgramSummary {
            program: program.to_string(),
            total: members.len(),
            at_risk: members
                .iter()
                .filter(|classified| classified.status.is_at_risk())
                .count(),
            mean_gpa: mean_gpa(members.iter().copied()),
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.at_risk
            .cmp(&a.at_risk)
            .then_with(|| a.program.cmp(&b.program))
    });
    summaries
}
