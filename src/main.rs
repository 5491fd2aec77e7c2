use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

mod classify;
mod config;
mod dataset;
mod error;
mod form;
mod models;
mod report;
mod risk;

use classify::{DashboardFilter, DEFAULT_TOP_AT_RISK};
use config::{Constants, DataSource, DEFAULT_MINIMUM_WAGE, DEFAULT_POVERTY_LINE};
use dataset::{DatasetCache, DatasetSnapshot};
use models::Status;

#[derive(Parser)]
#[command(name = "early-warning")]
#[command(about = "Academic early-warning monitoring and counselling simulator", long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: Settings,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Settings {
    /// Processed dataset file; skips the candidate search
    #[arg(long, global = true, env = "EWS_DATA")]
    data: Option<PathBuf>,
    /// Directory searched for the processed dataset
    #[arg(long, global = true, env = "EWS_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,
    /// Regional poverty line, per capita
    #[arg(long, global = true, env = "EWS_POVERTY_LINE", default_value_t = DEFAULT_POVERTY_LINE)]
    poverty_line: f64,
    /// Regional minimum wage (reserved)
    #[arg(long, global = true, env = "EWS_MINIMUM_WAGE", default_value_t = DEFAULT_MINIMUM_WAGE)]
    minimum_wage: f64,
}

impl Settings {
    /// Validated only by commands that score; the dataset commands ignore them.
    fn constants(&self) -> anyhow::Result<Constants> {
        Constants::new(self.poverty_line, self.minimum_wage).context("invalid regional constants")
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate risk view across study programs
    Summary {
        /// Only include these programs
        #[arg(long = "program")]
        programs: Vec<String>,
        /// Only include these statuses
        #[arg(long = "status", value_enum)]
        statuses: Vec<Status>,
        #[arg(long, default_value_t = DEFAULT_TOP_AT_RISK)]
        limit: usize,
        #[arg(long)]
        json: bool,
        /// Re-check the dataset every N seconds and redraw when it changes
        #[arg(long, value_name = "SECONDS")]
        watch: Option<u64>,
    },
    /// Write the dataset with its derived status column
    Classify {
        #[arg(long, default_value = "classified.csv")]
        out: PathBuf,
    },
    /// Score one student profile and print counselling recommendations
    Simulate {
        #[command(flatten)]
        form: form::CounselingForm,
        #[arg(long)]
        json: bool,
    },
    /// Write the plain-text monitoring summary
    Export {
        #[arg(long, default_value = report::DEFAULT_EXPORT_FILE)]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("academic_early_warning=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut cache = DatasetCache::new(DataSource::from_args(
        cli.settings.data.clone(),
        &cli.settings.data_dir,
    ));

    match cli.command {
        Commands::Summary {
            programs,
            statuses,
            limit,
            json,
            watch,
        } => {
            let filter = DashboardFilter { programs, statuses };
            let snapshot = cache.get_or_load()?;
            print!("{}", render_summary(&snapshot, &filter, limit, json)?);

            if let Some(seconds) = watch {
                let mut shown = snapshot.id;
                loop {
                    std::thread::sleep(Duration::from_secs(seconds.max(1)));
                    match cache.refresh_if_changed() {
                        Ok(snapshot) if snapshot.id != shown => {
                            shown = snapshot.id;
                            print!("{}", render_summary(&snapshot, &filter, limit, json)?);
                        }
                        Ok(_) => {}
                        Err(err) => warn!(error = %err, "reload failed, keeping previous snapshot"),
                    }
                }
            }
        }
        Commands::Classify { out } => {
            let snapshot = cache.get_or_load()?;
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            let written = dataset::write_classified(file, &snapshot.records)?;
            println!("Wrote {written} classified records to {}.", out.display());
        }
        Commands::Simulate { form, json } => {
            let constants = cli.settings.constants()?;
            let profile = form.validate().context("invalid counselling form")?;
            let risk_report = risk::compute_risk(&profile, &constants);
            info!(
                score = risk_report.score,
                economic = %risk_report.economic_status,
                mental = %risk_report.mental_health_status,
                "risk computed"
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&risk_report)?);
            } else {
                print!("{}", report::build_risk_report(&risk_report));
            }
        }
        Commands::Export { out } => {
            let snapshot = cache.get_or_load()?;
            let everything = DashboardFilter::default().apply(&snapshot.records);
            let stats = classify::aggregate(&everything);
            let text = report::build_export(&stats, chrono::Local::now().date_naive());
            std::fs::write(&out, text)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn render_summary(
    snapshot: &DatasetSnapshot,
    filter: &DashboardFilter,
    limit: usize,
    json: bool,
) -> anyhow::Result<String> {
    let view = filter.apply(&snapshot.records);
    let stats = classify::aggregate(&view);
    let programs = classify::summarize_by_program(&view);
    let top = classify::top_at_risk(&view, limit);

    if !json {
        return Ok(report::build_dashboard(&stats, &programs, &top));
    }

    let top_rows: Vec<serde_json::Value> = top
        .iter()
        .map(|classified| {
            serde_json::json!({
                "program": classified.record.program,
                "gpa": classified.record.gpa.value(),
                "economic_index": classified.record.economic_index.value(),
                "status": classified.status,
            })
        })
        .collect();
    let body = serde_json::json!({
        "snapshot": snapshot.id,
        "loaded_at": snapshot.loaded_at,
        "stats": stats,
        "programs": programs,
        "top_at_risk": top_rows,
    });
    Ok(format!("{}\n", serde_json::to_string_pretty(&body)?))
}
