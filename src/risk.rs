use crate::config::Constants;
use crate::models::{
    CounselingProfile, DevelopmentalRecommendation, EconomicStatus, Insight,
    MandatoryIntervention, MentalHealthStatus, RiskBand, RiskReport, StressLevel,
};

pub const BASE_SCORE: u8 = 10;
pub const MAX_SCORE: u8 = 99;
pub const LOW_GPA_THRESHOLD: f64 = 2.75;
pub const HIGH_GPA_THRESHOLD: f64 = 3.0;
pub const HEAVY_CREDIT_LOAD: u32 = 20;

/// Scores the profile. The caller guarantees a validated profile
/// (`dependents >= 1`, GPA and credit load in range).
pub fn compute_risk(profile: &CounselingProfile, constants: &Constants) -> RiskReport {
    let income_per_capita = profile.household_income as f64 / profile.dependents as f64;
    let economic_ratio = income_per_capita / constants.poverty_line;
    let stress_score = stress_score(profile.stress_level);
    let burnout = stress_score <= 2;

    let score = risk_score(economic_ratio, stress_score, profile.gpa);

    let mut mandatory = Vec::new();
    if economic_ratio < 1.5 {
        mandatory.push(MandatoryIntervention::FinancialAid);
    }
    if burnout {
        mandatory.push(MandatoryIntervention::PsychologicalCounseling);
    }

    let mut developmental = Vec::new();
    if economic_ratio < 2.0 {
        developmental.push(DevelopmentalRecommendation::CampusPartTimeWork);
    }
    if profile.gpa > HIGH_GPA_THRESHOLD {
        developmental.push(DevelopmentalRecommendation::InternshipAcceleration);
    }

    let mut insights = Vec::new();
    if economic_ratio < 1.0 {
        insights.push(Insight::BelowPovertyLine {
            income_per_capita,
            poverty_line: constants.poverty_line,
        });
    }
    if burnout && profile.credit_load > HEAVY_CREDIT_LOAD {
        insights.push(Insight::BurnoutRisk {
            credit_load: profile.credit_load,
        });
    }

    RiskReport {
        student_name: profile.name.clone(),
        income_per_capita,
        economic_ratio,
        stress_level: profile.stress_level,
        stress_score,
        time_management: profile.time_management,
        score,
        band: risk_band(score),
        economic_status: economic_status(economic_ratio),
        mental_health_status: if burnout {
            MentalHealthStatus::Burnout
        } else {
            MentalHealthStatus::Stable
        },
        mandatory,
        no_urgent_intervention: score < 30,
        developmental,
        insights,
    }
}

/// Inverted scale: 5 is the most resilient, 1 the least.
pub fn stress_score(level: StressLevel) -> u8 {
    match level {
        StressLevel::VeryLow => 5,
        StressLevel::Low => 4,
        StressLevel::Moderate => 3,
        StressLevel::High => 2,
        StressLevel::VeryHigh => 1,
    }
}

pub fn economic_penalty(economic_ratio: f64) -> u8 {
    if economic_ratio < 1.0 {
        50
    } else if economic_ratio < 1.5 {
        25
    } else {
        0
    }
}

pub fn risk_score(economic_ratio: f64, stress_score: u8, gpa: f64) -> u8 {
    let mut score = BASE_SCORE + economic_penalty(economic_ratio);
    if stress_score <= 2 {
        score += 30;
    }
    if gpa < LOW_GPA_THRESHOLD {
        score += 15;
    }
    score.min(MAX_SCORE)
}

pub fn economic_status(economic_ratio: f64) -> EconomicStatus {
    if economic_ratio < 1.0 {
        EconomicStatus::Critical
    } else if economic_ratio < 1.5 {
        EconomicStatus::Vulnerable
    } else {
        EconomicStatus::Prosperous
    }
}

pub fn risk_band(score: u8) -> RiskBand {
    match score {
        0..=29 => RiskBand::Low,
        30..=60 => RiskBand::Elevated,
        _ => RiskBand::Severe,
    }
}
