//! CLI definition, tracing setup, and the batch command.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use grayscout_core::pipeline::{self, PipelineConfig, ProgressReporter};
use grayscout_shared::{ImageOutcome, ImageSlot, RunReport, load_config, load_config_from, read_api_key};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// grayscout — discover public-domain images with a text model and convert them to grayscale.
#[derive(Debug, Parser)]
#[command(
    name = "grayscout",
    version,
    about = "Ask a text model for public-domain image URLs, download them, and convert them to grayscale.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Number of images to process.
    #[arg(allow_negative_numbers = true)]
    pub count: Option<String>,

    /// Config file (defaults to ./grayscout.toml, then ~/.grayscout/grayscout.toml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// File holding the API key on its first line (overrides gemini.key_file).
    #[arg(long, env = "GRAYSCOUT_KEY_FILE")]
    pub key_file: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Parse the process arguments.
///
/// Help and version requests exit 0 through clap. Every other parse failure
/// is a usage error and exits 1.
pub(crate) fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if is_informational(&e) => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    }
}

fn is_informational(err: &clap::Error) -> bool {
    matches!(
        err.kind(),
        clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
    )
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "grayscout=info",
        1 => "grayscout=debug",
        _ => "grayscout=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// Validate arguments and config, then run the batch.
///
/// Everything that can fail before the first network call is checked here:
/// the image count, the config file, and the credential file.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let count = parse_count(cli.count.as_deref())?;

    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    let key_path = cli
        .key_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.gemini.key_file));
    let api_key = read_api_key(&key_path)?;

    let pipeline_config = PipelineConfig::from_app_config(&config, api_key, count);

    info!(
        count,
        model = %config.gemini.model,
        images_dir = %pipeline_config.images_dir.display(),
        grayscale_dir = %pipeline_config.grayscale_dir.display(),
        "starting batch"
    );

    let reporter = CliProgress::new();
    let report = pipeline::run(&pipeline_config, &reporter).await?;

    print_summary(&report);
    Ok(())
}

/// Parse the positional image count.
fn parse_count(raw: Option<&str>) -> Result<usize> {
    let raw = raw.ok_or_else(|| {
        eyre!("the number of images to process is missing\n\nUsage: grayscout <COUNT>")
    })?;

    raw.trim()
        .parse::<usize>()
        .map_err(|e| eyre!("invalid image count '{raw}': {e}"))
}

fn print_summary(report: &RunReport) {
    println!();
    println!("  Batch finished.");
    println!("  Requested: {}", report.requested);
    println!("  Accepted:  {}", report.accepted.len());
    println!("  Converted: {}", report.converted());
    println!("  Failed:    {}", report.failed());
    println!("  Time:      {:.1}s", report.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn image_started(&self, slot: &ImageSlot, total: usize) {
        self.spinner
            .set_message(format!("Fetching [{}/{total}] {}", slot.index, slot.url));
    }

    fn image_finished(&self, slot: &ImageSlot, outcome: &ImageOutcome) {
        match outcome {
            ImageOutcome::Converted { .. } => {
                self.spinner
                    .set_message(format!("Saved {}", slot.grayscale.display()));
            }
            ImageOutcome::FetchFailed { reason } | ImageOutcome::TransformFailed { reason } => {
                self.spinner
                    .println(format!("  [{}] {} failed: {reason}", slot.index, slot.url));
            }
        }
    }

    fn done(&self, _report: &RunReport) {
        self.spinner.finish_and_clear();
    }
}
