use std::process::ExitCode;

use camino::Utf8PathBuf;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use nasr_check::app::{
    App, CheckRequest, CheckResult, CycleResult, FetchResult, cycle_summary, source_label,
};
use nasr_check::analysis::ConflictPolicy;
use nasr_check::config::{ConfigLoader, Overrides};
use nasr_check::cycle::parse_requested_date;
use nasr_check::error::NasrError;
use nasr_check::nasr::NasrHttpClient;
use nasr_check::output::{JsonOutput, LogSink, OutputMode};
use nasr_check::report::DEFAULT_OUT_FILE;

#[derive(Parser)]
#[command(name = "nasr-check")]
#[command(about = "Check drone flight locations against FAA NASR controlled airspace")]
#[command(version, author)]
struct Cli {
    /// JSON config file (defaults to nasr-check.json when present)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Print a JSON summary on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Classify flight locations as legal or illegal and write a CSV report")]
    Check(CheckArgs),
    #[command(about = "Download (or locate) the airspace archive for a date")]
    Fetch(FetchArgs),
    #[command(about = "Show the NASR cycle governing a date")]
    Cycle(CycleArgs),
}

#[derive(Args, Clone)]
struct DateArgs {
    /// Flight date, YYYY-MM-DD (defaults to today)
    #[arg(long)]
    date: Option<String>,
}

#[derive(Args, Clone)]
struct ArchiveArgs {
    #[command(flatten)]
    date: DateArgs,

    /// Use this archive instead of the cached or downloaded one
    #[arg(long)]
    query_file: Option<Utf8PathBuf>,

    /// Directory holding downloaded archives
    #[arg(long)]
    cache_dir: Option<Utf8PathBuf>,
}

#[derive(Args, Clone)]
struct CheckArgs {
    /// Zipped point shapefile of flight locations
    #[arg(long)]
    locations: Utf8PathBuf,

    #[arg(long, default_value = DEFAULT_OUT_FILE)]
    out_file: Utf8PathBuf,

    /// Highest airspace floor (ft) considered relevant
    #[arg(long)]
    max_altitude: Option<i64>,

    /// Report every overlapping restriction instead of the first
    #[arg(long)]
    all_conflicts: bool,

    #[command(flatten)]
    archive: ArchiveArgs,
}

#[derive(Args, Clone)]
struct FetchArgs {
    #[command(flatten)]
    archive: ArchiveArgs,
}

#[derive(Args, Clone)]
struct CycleArgs {
    #[command(flatten)]
    date: DateArgs,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(nasr) = report.downcast_ref::<NasrError>() {
            return ExitCode::from(map_exit_code(nasr));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &NasrError) -> u8 {
    match error {
        NasrError::OutOfRangeDate { .. }
        | NasrError::NoNextCycle(_)
        | NasrError::DateFormat(_)
        | NasrError::OffCycleDate(_)
        | NasrError::ConfigRead(_)
        | NasrError::ConfigParse(_) => 2,
        NasrError::Http(_) | NasrError::RemoteStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    match cli.command {
        Commands::Check(args) => run_check(cli.config.as_deref(), args, output_mode),
        Commands::Fetch(args) => run_fetch(cli.config.as_deref(), args, output_mode),
        Commands::Cycle(args) => run_cycle(args, output_mode),
    }
}

fn requested_date(args: &DateArgs) -> Result<NaiveDate, NasrError> {
    match &args.date {
        Some(value) => parse_requested_date(value),
        None => Ok(Local::now().date_naive()),
    }
}

fn build_app(config: Option<&str>, overrides: Overrides) -> miette::Result<App<NasrHttpClient>> {
    let settings = ConfigLoader::resolve(config, overrides)?;
    let client = NasrHttpClient::new(settings.timeout)?;
    Ok(App::new(settings, client))
}

fn run_check(
    config: Option<&str>,
    args: CheckArgs,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let CheckArgs {
        locations,
        out_file,
        max_altitude,
        all_conflicts,
        archive,
    } = args;

    let date = requested_date(&archive.date)?;
    let app = build_app(
        config,
        Overrides {
            cache_dir: archive.cache_dir,
            max_altitude_ft: max_altitude,
        },
    )?;
    let request = CheckRequest {
        date,
        locations,
        out_file,
        query_file: archive.query_file,
        policy: if all_conflicts {
            ConflictPolicy::All
        } else {
            ConflictPolicy::First
        },
    };

    match output_mode {
        OutputMode::Json => {
            let result = app.check(&request, &JsonOutput)?;
            JsonOutput::print_check(&result).into_diagnostic()?;
        }
        OutputMode::Human => {
            let result = app.check(&request, &LogSink)?;
            print_check_summary(&result);
        }
    }
    Ok(())
}

fn run_fetch(
    config: Option<&str>,
    args: FetchArgs,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let FetchArgs { archive } = args;
    let date = requested_date(&archive.date)?;
    let app = build_app(
        config,
        Overrides {
            cache_dir: archive.cache_dir,
            max_altitude_ft: None,
        },
    )?;

    match output_mode {
        OutputMode::Json => {
            let result = app.fetch(date, archive.query_file.as_deref(), &JsonOutput)?;
            JsonOutput::print_fetch(&result).into_diagnostic()?;
        }
        OutputMode::Human => {
            let result = app.fetch(date, archive.query_file.as_deref(), &LogSink)?;
            print_fetch_summary(&result);
        }
    }
    Ok(())
}

fn run_cycle(args: CycleArgs, output_mode: OutputMode) -> miette::Result<()> {
    let date = requested_date(&args.date)?;
    let result = cycle_summary(date)?;
    match output_mode {
        OutputMode::Json => JsonOutput::print_cycle(&result).into_diagnostic()?,
        OutputMode::Human => print_cycle_summary(&result),
    }
    Ok(())
}

fn print_cycle_summary(result: &CycleResult) {
    println!("requested: {}", result.requested);
    println!("effective: {}", result.effective);
    println!("next:      {}", result.next);
}

fn print_fetch_summary(result: &FetchResult) {
    println!("cycle {} ({})", result.effective, source_label(result.source));
    println!("{}", result.shape_files);
}

fn print_check_summary(result: &CheckResult) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    println!(
        "{cyan}NASR cycle {} ({}){reset}",
        result.effective,
        source_label(result.source)
    );
    println!(
        "{cyan}{} of {} restrictions at or below {} ft{reset}",
        result.relevant_restrictions, result.restrictions, result.max_altitude_ft
    );
    let color = if result.illegal > 0 { yellow } else { green };
    println!(
        "{color}{} of {} locations in restricted airspace{reset}",
        result.illegal, result.locations
    );
    println!("{green}results: {}{reset}", result.out_file);
}
