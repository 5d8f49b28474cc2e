//! Ventilator Triage Core - simulation CLI
//!
//! The main entry point for vt-core, handling:
//! - Multi-trial policy comparison runs
//! - Single-cohort generation for inspection
//! - Calibration validation

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;
use vt_config::{
    load_calibration, resolve_calibration, AgeTable, CalibrationPreset, SeverityTable,
    SimulationConstants, CONFIG_SCHEMA_VERSION,
};
use vt_core::exit_codes::ExitCode;
use vt_core::logging::{init_logging, LogConfig, LogFormat};
use vt_core::seed::cohort_rng;
use vt_core::trial::ventilators_for_scarcity;
use vt_core::{
    CohortGenerator, ExecutionMode, Policy, PolicyComparisonReport, RunConfig, SimError,
    TrialRunner,
};

/// Ventilator Triage - Monte Carlo comparison of allocation policies
#[derive(Parser)]
#[command(name = "vt-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Log format on stderr
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Pretty-printed JSON on stdout
    Json,
    /// Short human-readable summary
    Summary,
}

#[derive(Subcommand)]
enum Commands {
    /// Run repeated trials and compare policies
    Run(RunArgs),

    /// Generate one cohort and print it
    Cohort(CohortArgs),

    /// List available policies
    Policies,

    /// Validate calibration tables and constants
    Check(CalibrationArgs),
}

/// Calibration inputs shared by every command.
#[derive(Args, Debug)]
struct CalibrationArgs {
    /// Age-band table (JSON)
    #[arg(long)]
    age_table: Option<PathBuf>,

    /// Severity mortality table (JSON)
    #[arg(long)]
    severity_table: Option<PathBuf>,

    /// Simulation constants overrides (JSON)
    #[arg(long)]
    constants: Option<PathBuf>,

    /// Built-in tables used when no file is given
    #[arg(long, default_value = "cdc-2020")]
    preset: CalibrationPreset,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Patients per cohort (N)
    #[arg(long, short = 'n', default_value_t = 1000)]
    patients: usize,

    /// Ventilators per trial (K; default: half of patients)
    #[arg(long, short = 'k', conflicts_with = "scarcity")]
    ventilators: Option<usize>,

    /// Ventilators as a fraction of patients (K/N)
    #[arg(long)]
    scarcity: Option<f64>,

    /// Number of trials
    #[arg(long, short = 't', default_value_t = 100)]
    trials: usize,

    /// Root seed
    #[arg(long, short = 's', default_value_t = 0)]
    seed: u64,

    /// Policies to compare (comma-separated; default: all)
    #[arg(long = "policy", value_delimiter = ',')]
    policies: Vec<Policy>,

    /// Policy the others are compared against (default: first policy)
    #[arg(long)]
    baseline: Option<String>,

    /// Spread trials across threads
    #[arg(long)]
    parallel: bool,

    #[command(flatten)]
    calibration: CalibrationArgs,
}

#[derive(Args, Debug)]
struct CohortArgs {
    /// Patients in the cohort
    #[arg(long, short = 'n', default_value_t = 100)]
    patients: usize,

    /// Root seed
    #[arg(long, short = 's', default_value_t = 0)]
    seed: u64,

    /// Trial index whose cohort stream is used
    #[arg(long, default_value_t = 0)]
    trial: usize,

    #[command(flatten)]
    calibration: CalibrationArgs,
}

fn main() {
    let cli = Cli::parse();

    let cli_level = if cli.global.quiet {
        Some(LevelFilter::ERROR)
    } else {
        match cli.global.verbose {
            0 => None,
            1 => Some(LevelFilter::DEBUG),
            _ => Some(LevelFilter::TRACE),
        }
    };
    init_logging(&LogConfig::from_env(cli_level, cli.global.log_format));

    let exit_code = match &cli.command {
        Commands::Run(args) => run_simulation(&cli.global, args),
        Commands::Cohort(args) => run_cohort(&cli.global, args),
        Commands::Policies => run_policies(&cli.global),
        Commands::Check(args) => run_check(&cli.global, args),
    };

    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Command implementations
// ============================================================================

struct Calibration {
    age: AgeTable,
    severity: SeverityTable,
    constants: SimulationConstants,
}

fn load(args: &CalibrationArgs) -> Result<Calibration, SimError> {
    let constants = match &args.constants {
        Some(path) => SimulationConstants::from_file(path)?,
        None => SimulationConstants::default(),
    };
    let paths = resolve_calibration(args.age_table.as_deref(), args.severity_table.as_deref());
    let (age, severity) = load_calibration(&paths, args.preset, &constants)?;
    Ok(Calibration {
        age,
        severity,
        constants,
    })
}

fn run_simulation(global: &GlobalOpts, args: &RunArgs) -> ExitCode {
    match simulate(args) {
        Ok(report) => match global.format {
            OutputFormat::Json => emit_json(&report),
            OutputFormat::Summary => emit_lines(&summary_lines(&report)),
        },
        Err(err) => output_error(global, &err),
    }
}

fn simulate(args: &RunArgs) -> Result<PolicyComparisonReport, SimError> {
    let calibration = load(&args.calibration)?;
    let ventilators = match (args.ventilators, args.scarcity) {
        (Some(k), _) => k,
        (None, Some(ratio)) => ventilators_for_scarcity(args.patients, ratio)?,
        (None, None) => args.patients / 2,
    };
    let config = RunConfig {
        patients: args.patients,
        ventilators,
        trials: args.trials,
        seed: args.seed,
        policies: if args.policies.is_empty() {
            Policy::defaults()
        } else {
            args.policies.clone()
        },
        execution: if args.parallel {
            ExecutionMode::Parallel
        } else {
            ExecutionMode::Sequential
        },
    };

    if let Some(name) = &args.baseline {
        if !config.policies.iter().any(|p| p.label() == *name) {
            return Err(SimError::invalid(
                "baseline",
                format!("policy '{}' is not part of this run", name),
            ));
        }
    }

    let runner = TrialRunner::new(
        config,
        &calibration.age,
        &calibration.severity,
        &calibration.constants,
    )?;
    let run = runner.run()?;
    PolicyComparisonReport::from_run(&run, args.baseline.as_deref())
}

fn summary_lines(report: &PolicyComparisonReport) -> Vec<String> {
    let mut lines = vec![format!(
        "{} trials, N={} K={} seed={} baseline={}",
        report.trials, report.patients, report.ventilators, report.seed, report.baseline
    )];
    for policy in &report.policies {
        let lives = policy
            .lives_saved_summary
            .as_ref()
            .map(|s| format!("{:8.2} ±{:6.2}", s.mean, s.std_dev))
            .unwrap_or_default();
        let years = policy
            .life_years_saved_summary
            .as_ref()
            .map(|s| format!("{:.4}", s.mean))
            .unwrap_or_default();
        let versus = policy
            .vs_baseline
            .as_ref()
            .map(|c| format!("  wins {:5.1}%", c.lives_saved_win_rate * 100.0))
            .unwrap_or_default();
        lines.push(format!(
            "  {:<20} lives {}  life-years {}{}",
            policy.policy, lives, years, versus
        ));
    }
    lines
}

fn run_cohort(global: &GlobalOpts, args: &CohortArgs) -> ExitCode {
    let result = load(&args.calibration).and_then(|calibration| {
        let generator = CohortGenerator::new(
            &calibration.age,
            &calibration.severity,
            &calibration.constants,
        )?;
        generator.generate(args.patients, &mut cohort_rng(args.seed, args.trial))
    });

    match result {
        Ok(cohort) => match global.format {
            OutputFormat::Json => emit_json(&cohort),
            OutputFormat::Summary => emit_lines(&[format!(
                "{} patients, {} survive if treated, band counts {:?}",
                cohort.len(),
                cohort.survivors(),
                cohort.band_counts()
            )]),
        },
        Err(err) => output_error(global, &err),
    }
}

#[derive(Serialize)]
struct PolicyListing {
    name: &'static str,
    description: &'static str,
    definition: Policy,
}

fn run_policies(global: &GlobalOpts) -> ExitCode {
    let listing: Vec<PolicyListing> = Policy::defaults()
        .into_iter()
        .map(|policy| PolicyListing {
            name: policy.name(),
            description: policy.description(),
            definition: policy,
        })
        .collect();

    match global.format {
        OutputFormat::Json => emit_json(&listing),
        OutputFormat::Summary => emit_lines(
            &listing
                .iter()
                .map(|p| format!("{:<20} {}", p.name, p.description))
                .collect::<Vec<_>>(),
        ),
    }
}

fn run_check(global: &GlobalOpts, args: &CalibrationArgs) -> ExitCode {
    let paths = resolve_calibration(args.age_table.as_deref(), args.severity_table.as_deref());
    match load(args) {
        Ok(calibration) => {
            info!("calibration valid");
            let response = serde_json::json!({
                "schema_version": CONFIG_SCHEMA_VERSION,
                "status": "ok",
                "preset": args.preset.as_str(),
                "age_table": {
                    "source": paths.age_table_source.to_string(),
                    "path": paths.age_table.as_ref().map(|p| p.display().to_string()),
                    "bands": calibration.age.bands.len(),
                },
                "severity_table": {
                    "source": paths.severity_table_source.to_string(),
                    "path": paths.severity_table.as_ref().map(|p| p.display().to_string()),
                    "rows": calibration.severity.rows.len(),
                },
                "constants": calibration.constants,
            });
            match global.format {
                OutputFormat::Json => emit_json(&response),
                OutputFormat::Summary => emit_lines(&[format!(
                    "ok: age table from {}, severity table from {}",
                    paths.age_table_source, paths.severity_table_source
                )]),
            }
        }
        Err(err) => output_error(global, &err),
    }
}

// ============================================================================
// Output helpers
// ============================================================================

fn emit_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => emit_lines(&[json]),
        Err(err) => {
            error!(error = %err, "failed to serialize output");
            ExitCode::InternalError
        }
    }
}

fn emit_lines(lines: &[String]) -> ExitCode {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for line in lines {
        if let Err(err) = writeln!(out, "{}", line) {
            error!(error = %err, "failed to write output");
            return ExitCode::IoError;
        }
    }
    ExitCode::Ok
}

fn output_error(global: &GlobalOpts, err: &SimError) -> ExitCode {
    let exit_code = ExitCode::from(err);
    error!(code = err.code(), exit = %exit_code, fatal = err.is_fatal(), "{}", err);

    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "status": "error",
                "error": {
                    "code": err.code(),
                    "kind": exit_code.code_name(),
                    "field": err.field(),
                    "message": err.to_string(),
                }
            });
            eprintln!("{}", response);
        }
        OutputFormat::Summary => eprintln!("error: {}", err),
    }

    exit_code
}
