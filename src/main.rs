//! # Formletter CLI
//!
//! Usage:
//!   formletter merge --template letterhead.pdf --data people.csv --out out \
//!       --text 'Dear {name},\n\tthank you.' --filename '{name}_{surname}'
//!   formletter merge --job job.json --stop-on-error
//!   formletter headers --data people.csv

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use formletter::data::read_headers;
use formletter::font::FontFamily;
use formletter::{BodyTemplate, MergeConfig, MergeError, OnError, RawSettings};

#[derive(Parser)]
#[command(name = "formletter")]
#[command(version)]
#[command(about = "Mail-merge CSV rows onto a PDF template", long_about = None)]
struct Cli {
    /// Show per-row detail
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write one PDF per data row
    Merge(MergeArgs),

    /// List the tags a data file provides
    Headers {
        /// CSV data file
        #[arg(long, value_name = "FILE")]
        data: PathBuf,
    },
}

#[derive(Args)]
struct MergeArgs {
    /// JSON job file; other flags override its fields
    #[arg(long, value_name = "FILE", env = "FORMLETTER_JOB")]
    job: Option<PathBuf>,

    /// Template PDF (first page is used)
    #[arg(long, value_name = "FILE")]
    template: Option<PathBuf>,

    /// CSV data file
    #[arg(long, value_name = "FILE")]
    data: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Body text with {field} tags
    #[arg(long, conflicts_with = "text_file")]
    text: Option<String>,

    /// Read the body text from a file
    #[arg(long, value_name = "FILE")]
    text_file: Option<PathBuf>,

    /// Treat the body as markup with <b>, <i> and <u> tags
    #[arg(long)]
    styled: bool,

    /// Output filename template
    #[arg(long)]
    filename: Option<String>,

    /// Helvetica, Times-Roman or Courier
    #[arg(long)]
    font: Option<String>,

    /// Font size in points
    #[arg(long)]
    font_size: Option<String>,

    /// Left edge, percent of page width
    #[arg(long)]
    x: Option<String>,

    /// First baseline, percent of page height from the top
    #[arg(long)]
    y: Option<String>,

    /// Wrap at this many characters per line
    #[arg(long, conflicts_with = "page_fraction")]
    max_chars: Option<String>,

    /// Wrap at this fraction of the page width, measured
    #[arg(long)]
    page_fraction: Option<String>,

    /// Stop at the first row that fails
    #[arg(long)]
    stop_on_error: bool,
}

impl MergeArgs {
    fn into_config(self) -> formletter::Result<MergeConfig> {
        let mut config = match &self.job {
            Some(path) => MergeConfig::load(path)?,
            None => MergeConfig::default(),
        };

        if let Some(template) = self.template {
            config.template = template;
        }
        if let Some(data) = self.data {
            config.data = data;
        }
        if let Some(out) = self.out {
            config.output_dir = out;
        }
        if let Some(filename) = self.filename {
            config.filename = filename;
        }
        if let Some(font) = &self.font {
            config.font = font.parse::<FontFamily>()?;
        }

        let text = match (self.text, &self.text_file) {
            (Some(text), _) => Some(text),
            (None, Some(path)) => Some(fs::read_to_string(path)?),
            (None, None) => None,
        };
        if let Some(text) = text {
            config.body = if self.styled {
                BodyTemplate::Markup { text }
            } else {
                BodyTemplate::Plain { text }
            };
        }
        if self.stop_on_error {
            config.on_error = OnError::Abort;
        }

        RawSettings {
            font_size: self.font_size,
            x: self.x,
            y: self.y,
            max_chars: self.max_chars,
            page_fraction: self.page_fraction,
        }
        .parse(config)
    }
}

fn run_merge(args: MergeArgs) -> Result<bool, MergeError> {
    let config = args.into_config()?;
    let report = formletter::merge(&config)?;
    println!("{}", report.summary());
    Ok(report.is_success())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let outcome = match cli.command {
        Commands::Merge(args) => run_merge(args),
        Commands::Headers { data } => read_headers(&data).map(|headers| {
            println!("Available tags: {}", headers.join(", "));
            true
        }),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
