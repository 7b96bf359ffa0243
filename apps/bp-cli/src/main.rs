use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bp_report::{
    DEFAULT_SIZE, Layout, ReportError, ReportOptions, build_report, load_yaml, output_path,
    render_png,
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

const DEFAULT_INPUT: &str = "TanklessBoilers.Examples.PrimarySecondaryBoilerTest_res.mat";

#[derive(Parser, Debug)]
#[command(name = "bp-cli")]
#[command(about = "Plot hydronic boiler simulation results", long_about = None)]
struct Cli {
    /// Simulation result file (.mat or .jsonl)
    #[arg(default_value = DEFAULT_INPUT)]
    input: PathBuf,
    /// Report layout YAML; the built-in boiler/baseboard layout if omitted
    #[arg(long)]
    layout: Option<PathBuf>,
    /// Add the local generation time to the subtitle
    #[arg(long)]
    timestamp: bool,
    /// Image width in pixels
    #[arg(long, default_value_t = DEFAULT_SIZE.0)]
    width: u32,
    /// Image height in pixels
    #[arg(long, default_value_t = DEFAULT_SIZE.1)]
    height: u32,
    /// Print the summary without writing the image
    #[arg(long)]
    summary_only: bool,
}

/// How a run ended when it did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Completed,
    MissingInput,
    NoTimeBase,
}

impl Outcome {
    fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Completed | Outcome::NoTimeBase => ExitCode::SUCCESS,
            Outcome::MissingInput => ExitCode::from(1),
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let program = std::env::args()
        .next()
        .unwrap_or_else(|| "bp-cli".to_string());

    match run(&cli, &program) {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli, program: &str) -> Result<Outcome, ReportError> {
    if !cli.input.exists() {
        eprintln!("Error: File '{}' not found!", cli.input.display());
        eprintln!("Usage: {program} [path/to/results.mat]");
        return Ok(Outcome::MissingInput);
    }

    println!("Loading {}...", cli.input.display());
    let source = bp_results::open(&cli.input)?;
    println!("Found {} variables", source.variable_names().len());

    let layout = load_layout(cli.layout.as_deref())?;
    let options = ReportOptions {
        generated_at: cli
            .timestamp
            .then(|| chrono::Local::now().format("%Y-%m-%d %H:%M").to_string()),
        size: (cli.width, cli.height),
    };

    let report_run = match build_report(source.as_ref(), &layout, &options) {
        Ok(report_run) => report_run,
        Err(ReportError::NoTimeBase { reason }) => {
            eprintln!("Error: Could not extract time vector from results file");
            eprintln!("  {reason}");
            return Ok(Outcome::NoTimeBase);
        }
        Err(e) => return Err(e),
    };

    if !cli.summary_only {
        let path = output_path(&cli.input);
        render_png(&report_run.report, &path, options.size)?;
        println!("Plots saved to: {}", path.display());
    }

    println!();
    print!("{}", report_run.summary);
    Ok(Outcome::Completed)
}

fn load_layout(path: Option<&Path>) -> Result<Layout, ReportError> {
    match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading layout");
            load_yaml(path)
        }
        None => Layout::boiler_baseboard(),
    }
}
