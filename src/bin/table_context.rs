//! table-context - segment a document and summarize its tables
//!
//! Usage:
//!   table-context --layout lines.json --detection-dir det/ --structure-dir html/ --pdf "in/Docs/report.pdf"
//!   table-context --layout lines.json --detection-dir det/ --structure-dir html/ --prefix Docs_report --segments-only
//!   table-context --words words.json --detection-dir det/ --structure-dir html/ --prefix Docs_report --segments-only
//!
//! The API key is read from the environment variable named in the service
//! configuration (`OPENAI_API_KEY` by default).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use table_context::layout::WordDocument;
use table_context::services::{OpenAiChatGenerator, OpenAiEmbedder};
use table_context::{
    document_prefix, ArtifactLayout, BreakpointKind, BreakpointThreshold, DocumentLayout,
    DocumentPipeline, Error, PipelineConfig, ReferenceMode, Result, SummaryReport,
};

#[derive(Debug, Parser)]
#[command(name = "table-context", version, about = "Segment a document and summarize its tables with context")]
struct Cli {
    /// Document layout JSON (pages with text lines in native units)
    #[arg(long, conflicts_with = "words", required_unless_present = "words")]
    layout: Option<PathBuf>,

    /// Word geometry JSON (pages with words in page-image pixels at --dpi)
    #[arg(long)]
    words: Option<PathBuf>,

    /// Directory holding `<prefix>_page<N>_objects.json` detection files
    #[arg(long)]
    detection_dir: PathBuf,

    /// Directory holding `<prefix>_page<N>_<T>_0.html` structure files
    #[arg(long)]
    structure_dir: PathBuf,

    /// Artifact name prefix
    #[arg(long, conflicts_with = "pdf", required_unless_present = "pdf")]
    prefix: Option<String>,

    /// Source PDF path; the prefix is derived as `<folder>_<stem>`
    #[arg(long)]
    pdf: Option<PathBuf>,

    /// Configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Resolution the detection artifacts were produced at
    #[arg(long)]
    dpi: Option<f64>,

    /// Breakpoint statistic: percentile, standard_deviation or interquartile
    #[arg(long)]
    breakpoint: Option<BreakpointKind>,

    /// Percentile or multiplier of the breakpoint statistic
    #[arg(long)]
    breakpoint_amount: Option<f64>,

    /// Compare context chunks against the table content instead of the neighbor text
    #[arg(long)]
    table_reference: bool,

    /// Maximum number of generation requests in flight
    #[arg(long)]
    max_concurrency: Option<usize>,

    /// Only segment and render tables, do not call any service
    #[arg(long)]
    segments_only: bool,

    /// Write the JSON report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(dpi) = self.dpi {
            config = config.with_dpi(dpi);
        }
        if self.breakpoint.is_some() || self.breakpoint_amount.is_some() {
            let kind = self.breakpoint.unwrap_or(config.breakpoint.kind);
            let mut breakpoint = BreakpointThreshold::new(kind);
            // an amount from the file only applies to the kind it was written for
            let amount = self.breakpoint_amount.or(if kind == config.breakpoint.kind {
                config.breakpoint.amount
            } else {
                None
            });
            if let Some(amount) = amount {
                breakpoint = breakpoint.with_amount(amount);
            }
            config = config.with_breakpoint(breakpoint);
        }
        if self.table_reference {
            config = config.with_reference(ReferenceMode::TableContent);
        }
        if let Some(max_concurrency) = self.max_concurrency {
            config = config.with_max_concurrency(max_concurrency);
        }

        config.validate()?;
        Ok(config)
    }

    fn artifact_layout(&self) -> Result<ArtifactLayout> {
        let prefix = match (&self.prefix, &self.pdf) {
            (Some(prefix), _) => prefix.clone(),
            (None, Some(pdf)) => document_prefix(pdf),
            (None, None) => return Err(Error::Config("either --prefix or --pdf is required".into())),
        };
        Ok(ArtifactLayout::new(&self.detection_dir, &self.structure_dir, prefix))
    }

    fn document_layout(&self, dpi: f64) -> Result<DocumentLayout> {
        let (layout, path) = match (&self.layout, &self.words) {
            (Some(path), _) => (DocumentLayout::from_json_file(path)?, path),
            (None, Some(path)) => (WordDocument::from_json_file(path)?.to_layout(dpi), path),
            (None, None) => return Err(Error::Config("either --layout or --words is required".into())),
        };
        log::info!("Loaded {} pages from {}", layout.page_count(), path.display());
        Ok(layout)
    }
}

async fn run(cli: &Cli) -> Result<SummaryReport> {
    let config = cli.pipeline_config()?;
    let artifacts = cli.artifact_layout()?;
    let layout = cli.document_layout(config.dpi)?;

    if cli.segments_only {
        let pipeline = DocumentPipeline::new(config, artifacts)?;
        return Ok(pipeline.segments_only(&layout));
    }

    let embedder = OpenAiEmbedder::from_config(&config.service)?;
    let generator = OpenAiChatGenerator::from_config(&config.service)?;
    let pipeline = DocumentPipeline::new(config, artifacts)?;
    Ok(pipeline.run(&layout, &embedder, &generator).await)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let report = match run(&cli).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        },
    };

    let written = match &cli.output {
        Some(path) => report.write_json(path),
        None => report.to_json().map(|json| println!("{}", json)),
    };
    if let Err(e) = written {
        eprintln!("Error: cannot write report: {}", e);
        return ExitCode::FAILURE;
    }

    let stats = report.stats;
    eprintln!(
        "{} segments ({} tables), {} pages skipped, {} summaries, {} failed",
        stats.text_segments + stats.table_segments,
        stats.table_segments,
        stats.skipped_pages,
        stats.summaries_succeeded,
        stats.summaries_failed
    );

    ExitCode::SUCCESS
}
