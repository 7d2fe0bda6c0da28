//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use singlehtml_core::{ConversionState, Converter, ProgressReporter, convert_all};
use singlehtml_markdown::MarkdownRenderer;
use singlehtml_shared::{AppConfig, init_config, load_config, load_config_from};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// singlehtml — Markdown to a single portable HTML file.
#[derive(Parser)]
#[command(
    name = "singlehtml",
    version,
    about = "Convert Markdown into a single self-contained HTML file.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Convert one Markdown file.
    Convert {
        /// Markdown file to convert.
        file: PathBuf,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Convert every Markdown file in a directory (non-recursive).
    ConvertAll {
        /// Directory to scan; a file path means its directory.
        path: PathBuf,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Per-run settings layered over the config file.
#[derive(Args, Debug, Default)]
pub(crate) struct Overrides {
    /// Inject the table-of-contents sidebar.
    #[arg(long)]
    pub toc: bool,

    /// Extra stylesheet, relative to the Markdown file's directory.
    #[arg(long)]
    pub style_sheet: Option<String>,

    /// Output directory (`~/...`, absolute, or relative to the source).
    #[arg(long)]
    pub out_dir: Option<String>,

    /// Config file to use instead of ~/.singlehtml/singlehtml.toml.
    #[arg(long, env = "SINGLEHTML_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Overrides {
    /// Load the config file and apply command-line values on top.
    fn resolve(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => load_config_from(path)?,
            None => load_config()?,
        };
        self.apply(&mut config);
        Ok(config)
    }

    fn apply(&self, config: &mut AppConfig) {
        if self.toc {
            config.generate_toc = true;
        }
        if let Some(sheet) = &self.style_sheet {
            config.style_sheet = Some(sheet.clone());
        }
        if let Some(dir) = &self.out_dir {
            config.output_directory = Some(dir.clone());
        }
    }
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "singlehtml=warn",
        1 => "singlehtml=info",
        2 => "singlehtml=debug",
        _ => "singlehtml=trace",
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
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Convert { file, overrides } => cmd_convert(&file, &overrides).await,
        Command::ConvertAll { path, overrides } => cmd_convert_all(&path, &overrides).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_convert(file: &Path, overrides: &Overrides) -> Result<()> {
    let config = overrides.resolve()?;
    let renderer = MarkdownRenderer::new(config.render.clone());
    let converter = Converter::new(renderer, config)?;

    info!(file = %file.display(), "converting");

    let progress = CliProgress::new();
    let result = converter.convert(file, &progress).await;
    progress.finish();

    let outcome = result.wrap_err_with(|| format!("failed to convert {}", file.display()))?;
    println!(
        "Converted {} -> {} ({:.1}s)",
        file.display(),
        outcome.output_path.display(),
        outcome.elapsed.as_secs_f64()
    );
    Ok(())
}

async fn cmd_convert_all(path: &Path, overrides: &Overrides) -> Result<()> {
    let dir = if path.is_file() {
        path.parent().unwrap_or(Path::new(".")).to_path_buf()
    } else {
        path.to_path_buf()
    };

    let config = overrides.resolve()?;
    let renderer = MarkdownRenderer::new(config.render.clone());
    let converter = Rc::new(Converter::new(renderer, config)?);

    let progress = Rc::new(CliProgress::new());
    let outcomes = convert_all(converter, &dir, progress.clone()).await;
    progress.finish();
    let outcomes = outcomes.wrap_err_with(|| format!("cannot scan {}", dir.display()))?;

    if outcomes.is_empty() {
        println!("No Markdown files found in {}", dir.display());
        return Ok(());
    }

    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(done) => println!(
                "  ok    {} -> {}",
                outcome.source.display(),
                done.output_path.display()
            ),
            Err(e) => {
                failed += 1;
                println!("  fail  {}: {e}", outcome.source.display());
            }
        }
    }

    if failed > 0 {
        return Err(eyre!("{failed} of {} files failed to convert", outcomes.len()));
    }
    println!("Converted {} files", outcomes.len());
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
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
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("valid progress template")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn state(&self, source: &Path, state: &ConversionState) {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.spinner.set_message(format!("{name}: {state}"));
    }
}
