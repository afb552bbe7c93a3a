use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use timetable_extract::{
    ExtractionReport, LanguageMode, PageSelection, ParseOptions, ParseResult,
    courses_to_csv_string, parse_pages, parse_timetable_pdf, runs_from_json,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "pdf2courses",
    version,
    about = "Extract course records from student timetable PDFs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Parse a timetable PDF.
    Parse(ParseArgs),
    /// Parse positioned text runs produced by another extractor (JSON).
    ParseRuns(ParseArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Input path.
    #[arg(short, long)]
    input: PathBuf,

    /// Output path; standard output when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Page selection like 1-3,5.
    #[arg(long)]
    pages: Option<String>,

    /// Layout language: auto, zh or en.
    #[arg(long, default_value = "auto")]
    lang: String,

    /// Pretty-print JSON output.
    #[arg(long)]
    pretty: bool,

    /// Enable verbose warning output.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_options(args: &ParseArgs) -> Result<ParseOptions> {
    let pages = args
        .pages
        .as_deref()
        .map(PageSelection::from_str)
        .transpose()
        .map_err(|error| anyhow!("invalid page selection: {error}"))
        .context("failed to parse --pages")?;
    let language = LanguageMode::from_str(&args.lang)
        .map_err(|error| anyhow!(error))
        .context("failed to parse --lang")?;

    Ok(ParseOptions {
        pages,
        language,
        ..ParseOptions::default()
    })
}

fn render(result: &ParseResult, args: &ParseArgs) -> Result<String> {
    match args.format {
        OutputFormat::Json if args.pretty => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Json => Ok(serde_json::to_string(result)?),
        OutputFormat::Csv => Ok(courses_to_csv_string(&result.courses)?),
    }
}

fn write_output(rendered: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("failed to write '{}'", path.display())),
        None => {
            println!("{rendered}");
            Ok(())
        }
    }
}

fn log_report(report: &ExtractionReport, verbose: bool) {
    if report.warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", report.warnings.len());
    if verbose {
        for warning in &report.warnings {
            eprintln!(
                "  - {:?} page={:?}: {}",
                warning.code, warning.page, warning.message
            );
        }
    }
}

fn run(args: &ParseArgs, from_runs: bool) -> Result<ExtractionReport> {
    let options = parse_options(args)?;
    let (result, report) = if from_runs {
        let json = std::fs::read_to_string(&args.input)
            .with_context(|| format!("failed to read '{}'", args.input.display()))?;
        let pages = runs_from_json(&json).context("failed to decode text runs")?;
        parse_pages(&pages, &options)
    } else {
        parse_timetable_pdf(&args.input, &options)
    }
    .with_context(|| format!("failed to parse timetable from '{}'", args.input.display()))?;

    let rendered = render(&result, args)?;
    write_output(&rendered, args.output.as_deref())?;
    Ok(report)
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("timetable_extract=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    let (args, from_runs) = match &cli.command {
        Commands::Parse(args) => (args, false),
        Commands::ParseRuns(args) => (args, true),
    };
    match run(args, from_runs) {
        Ok(report) => {
            log_report(&report, args.verbose);
            if report.course_count > 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(1)
        }
    }
}
