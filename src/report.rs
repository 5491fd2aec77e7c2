use std::fmt::Write;

use chrono::NaiveDate;

use crate::classify::{AggregateStats, ProgramSummary};
use crate::models::{
    ClassifiedRecord, DevelopmentalRecommendation, Insight, MandatoryIntervention, Reading,
    RiskReport,
};

pub const DEFAULT_EXPORT_FILE: &str = "laporan_akademik.txt";

/// Downloadable monitoring summary built from already computed statistics.
pub fn build_export(stats: &AggregateStats, printed_on: NaiveDate) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "ACADEMIC MONITORING REPORT");
    let _ = writeln!(output, "--------------------------");
    let _ = writeln!(output, "Print date: {}", printed_on.format("%Y-%m-%d"));
    let _ = writeln!(output, "Total students: {}", stats.total);
    let _ = writeln!(output, "Mean GPA: {:.2}", stats.mean_gpa);
    let _ = writeln!(output);
    let _ = writeln!(output, "AT-RISK STUDENTS:");
    let _ = writeln!(
        output,
        "- Economically vulnerable: {} students",
        stats.economically_vulnerable
    );
    let _ = writeln!(
        output,
        "- Stress vulnerable: {} students",
        stats.stress_vulnerable
    );

    output
}

pub fn build_dashboard(
    stats: &AggregateStats,
    programs: &[ProgramSummary],
    top: &[&ClassifiedRecord],
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Program Monitoring Dashboard");
    let _ = writeln!(
        output,
        "Students {} | mean GPA {:.2} | at risk {} | safe {}",
        stats.total, stats.mean_gpa, stats.at_risk, stats.safe
    );
    let _ = writeln!(
        output,
        "Economically vulnerable {} | stress vulnerable {} | unknown {}",
        stats.economically_vulnerable, stats.stress_vulnerable, stats.unknown
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Programs");

    if programs.is_empty() {
        let _ = writeln!(output, "No students match this filter.");
    } else {
        for summary in programs {
            let _ = writeln!(
                output,
                "- {}: {} students, {} at risk (mean GPA {:.2})",
                display_program(&summary.program),
                summary.total,
                summary.at_risk,
                summary.mean_gpa
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top At-Risk Students");

    if top.is_empty() {
        let _ = writeln!(output, "No at-risk students in this view.");
    } else {
        for classified in top {
            let record = &classified.record;
            let _ = writeln!(
                output,
                "- {} | GPA {} | economic index {} | {}",
                display_program(&record.program),
                display_reading(&record.gpa),
                display_reading(&record.economic_index),
                classified.status
            );
        }
    }

    output
}

pub fn build_risk_report(report: &RiskReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Risk Analysis: {}", report.student_name);
    let _ = writeln!(
        output,
        "Dropout risk score: {}/100 ({:?})",
        report.score, report.band
    );
    let _ = writeln!(
        output,
        "Economic status: {} (ratio {:.2} to the poverty line)",
        report.economic_status, report.economic_ratio
    );
    let _ = writeln!(
        output,
        "Mental health: {} (stress {}, score {}/5)",
        report.mental_health_status,
        report.stress_level.label(),
        report.stress_score
    );
    let _ = writeln!(
        output,
        "Time management: {}",
        report.time_management.label()
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Insights");
    if report.insights.is_empty() {
        let _ = writeln!(output, "No warnings.");
    }
    for insight in &report.insights {
        match insight {
            Insight::BelowPovertyLine {
                income_per_capita,
                poverty_line,
            } => {
                let _ = writeln!(
                    output,
                    "- ECONOMIC WARNING: per-capita income Rp {} is below the poverty line (Rp {}).",
                    rupiah(*income_per_capita),
                    rupiah(*poverty_line)
                );
            }
            Insight::BurnoutRisk { credit_load } => {
                let _ = writeln!(
                    output,
                    "- BURNOUT RISK: heavy load ({credit_load} credits) with very low stress resilience."
                );
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Mandatory Interventions");
    for intervention in &report.mandatory {
        let line = match intervention {
            MandatoryIntervention::FinancialAid => {
                "Financial aid: refer to student affairs for tuition relief, instalments or scholarships."
            }
            MandatoryIntervention::PsychologicalCounseling => {
                "Counselling: at least two sessions this month with the campus psychologist or academic advisor."
            }
        };
        let _ = writeln!(output, "- {line}");
    }
    if report.no_urgent_intervention {
        let _ = writeln!(output, "- No urgent intervention needed.");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Development");
    if report.developmental.is_empty() {
        let _ = writeln!(output, "No development recommendations.");
    }
    for recommendation in &report.developmental {
        let line = match recommendation {
            DevelopmentalRecommendation::CampusPartTimeWork => {
                "Campus work: offer a part-time position (lab or library assistant)."
            }
            DevelopmentalRecommendation::InternshipAcceleration => {
                "Career acceleration: refer to the internship programme."
            }
        };
        let _ = writeln!(output, "- {line}");
    }

    output
}

fn display_program(program: &str) -> &str {
    if program.is_empty() {
        "(no program)"
    } else {
        program
    }
}

fn display_reading(reading: &Reading) -> String {
    match reading {
        Reading::Missing => "-".to_string(),
        other => other.to_string(),
    }
}

/// Whole rupiah with thousands separators.
fn rupiah(amount: f64) -> String {
    let digits = (amount.trunc() as i64).abs().to_string();
    let mut grouped = String::new();
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if amount < 0.0 {
        grouped.insert(0, '-');
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Constants;
    use crate::models::{CounselingProfile, Status, StressLevel, StudentRecord, TimeManagement};
    use crate::risk;

    fn stats() -> AggregateStats {
        AggregateStats {
            total: 3,
            at_risk: 1,
            safe: 2,
            mean_gpa: 3.0,
            economically_vulnerable: 1,
            stress_vulnerable: 0,
            unknown: 0,
        }
    }

    #[test]
    fn export_contains_date_and_counts() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
        let text = build_export(&stats(), date);
        assert!(text.contains("Print date: 2026-02-02"));
        assert!(text.contains("Total students: 3"));
        assert!(text.contains("Mean GPA: 3.00"));
        assert!(text.contains("Economically vulnerable: 1 students"));
        assert!(text.contains("Stress vulnerable: 0 students"));
    }

    #[test]
    fn dashboard_handles_empty_view() {
        let empty = AggregateStats {
            total: 0,
            at_risk: 0,
            safe: 0,
            mean_gpa: 0.0,
            economically_vulnerable: 0,
            stress_vulnerable: 0,
            unknown: 0,
        };
        let text = build_dashboard(&empty, &[], &[]);
        assert!(text.contains("mean GPA 0.00"));
        assert!(text.contains("No students match this filter."));
        assert!(text.contains("No at-risk students in this view."));
    }

    #[test]
    fn dashboard_lists_top_students() {
        let classified = ClassifiedRecord {
            record: StudentRecord {
                gpa: Reading::Value(2.8),
                economic_index: Reading::Missing,
                stress_management: Reading::Value(3.0),
                credit_load: None,
                program: "Informatika".to_string(),
            },
            status: Status::Unknown,
        };
        let text = build_dashboard(&stats(), &[], &[&classified]);
        assert!(text.contains("- Informatika | GPA 2.8 | economic index - | Unknown"));
    }

    #[test]
    fn risk_report_renders_warnings_and_actions() {
        let profile = CounselingProfile {
            name: "Rina".to_string(),
            semester: 5,
            gpa: 2.5,
            credit_load: 21,
            household_income: 3_000_000,
            dependents: 4,
            stress_level: StressLevel::High,
            time_management: TimeManagement::Poor,
        };
        let report = risk::compute_risk(&profile, &Constants::default());
        let text = build_risk_report(&report);
        assert!(text.contains("# Risk Analysis: Rina"));
        assert!(text.contains("Dropout risk score: 99/100 (Severe)"));
        assert!(text.contains("Mental health: BURNOUT (stress Tinggi, score 2/5)"));
        assert!(text.contains("Time management: Buruk"));
        assert!(text.contains("Rp 750,000 is below the poverty line (Rp 928,278)"));
        assert!(text.contains("BURNOUT RISK: heavy load (21 credits)"));
        assert!(text.contains("Financial aid"));
        assert!(text.contains("Counselling"));
        assert!(!text.contains("No urgent intervention"));
    }

    #[test]
    fn rupiah_groups_thousands() {
        assert_eq!(rupiah(0.0), "0");
        assert_eq!(rupiah(999.0), "999");
        assert_eq!(rupiah(5_396_761.0), "5,396,761");
        assert_eq!(rupiah(1_234.9), "1,234");
    }
}
