use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};

use swing_phase::{
    AnalysisJob, ContactDetectionMethod, CoordinatorBuilder, InputError, Settings, SwingError,
};

/// Detect tennis swing phases in pose-landmark documents.
#[derive(Parser, Debug)]
#[command(name = "swing-phase", version, about, long_about = None)]
struct Args {
    /// Landmark documents (JSON) to analyze.
    #[arg(required = true, value_name = "FILE")]
    inputs: Vec<PathBuf>,

    /// TOML settings file; `SWING_` environment variables override it.
    #[arg(short, long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Analyzer preset: standard, sensitive or strict.
    #[arg(short, long)]
    preset: Option<String>,

    /// Contact strategy: velocity_peak, kinematic_chain or hybrid.
    #[arg(short, long, value_name = "METHOD")]
    method: Option<ContactDetectionMethod>,

    /// Use rotation-aware detection for unit turn and forward swing.
    #[arg(long, default_value_t = false)]
    kinematic_chain: bool,

    /// Include per-frame phase labels in each report.
    #[arg(long, default_value_t = false)]
    timeline: bool,

    /// Print a readable summary instead of JSON.
    #[arg(long, default_value_t = false)]
    summary: bool,

    /// Log at debug level regardless of the configured level.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn init_logging(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(args: &Args) -> Result<Settings, SwingError> {
    let mut settings = Settings::load(args.settings.as_deref())?;

    if let Some(preset) = &args.preset {
        settings.analyzer.preset = preset.clone();
    }
    if let Some(method) = args.method {
        settings.analyzer.contact_detection_method = Some(method);
    }
    if args.kinematic_chain {
        settings.analyzer.kinematic_chain_mode = Some(true);
    }
    if args.timeline {
        settings.batch.include_timeline = true;
    }

    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<ExitCode, SwingError> {
    let args = Args::parse();

    let configuration = load_settings(&args)?;
    let level = if args.verbose {
        Level::DEBUG
    } else {
        configuration.max_level()?
    };
    init_logging(level);

    let coordinator = CoordinatorBuilder::new(configuration).build()?;

    let mut failures = 0usize;
    let mut jobs = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        match AnalysisJob::from_path(path).await {
            Ok(job) => jobs.push(job),
            Err(e) => {
                error!("{}", e);
                failures += 1;
            }
        }
    }

    let mut reports = Vec::with_capacity(jobs.len());
    for outcome in coordinator.run(jobs).await {
        match outcome {
            Ok(report) => reports.push(report),
            Err(e) => {
                error!("Analysis failed: {}", e);
                failures += 1;
            }
        }
    }

    if args.summary {
        for report in &reports {
            println!("{} ({:?})", report.source, report.status);
            println!("{}\n", report.result.summary());
        }
    } else {
        let text = serde_json::to_string_pretty(&reports).map_err(InputError::Encode)?;
        println!("{}", text);
    }

    info!(analyzed = reports.len(), failures, "Done");
    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
