//! paperprep: research papers in, JSON-lines chunk records out.
use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::EnvFilter;

use paperprep_core::config::{expand_path, Config, PipelineSettings};
use paperprep_core::metadata;
use paperprep_core::types::Document;
use paperprep_pdf::AutoMetadataSource;
use paperprep_pipeline::{collect_documents, Collaborators, JsonlSink, OrderedSink, Pipeline};
use paperprep_text::{RecursiveChunker, TextNormalizer};

#[derive(Parser)]
#[command(name = "paperprep", version, about = "Normalize and chunk research papers into JSON lines")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process documents into a JSONL file
    Run(RunArgs),
    /// Print the metadata record of one document
    Metadata { path: PathBuf },
    /// Normalize and chunk a text file (or stdin), one JSON string per line
    Chunk(ChunkArgs),
}

#[derive(Args)]
struct ChunkOptions {
    #[arg(long)]
    chunk_size: Option<usize>,
    #[arg(long)]
    chunk_overlap: Option<usize>,
}

impl ChunkOptions {
    fn apply(&self, settings: &mut PipelineSettings) {
        if let Some(size) = self.chunk_size {
            settings.chunk_size = size;
        }
        if let Some(overlap) = self.chunk_overlap {
            settings.chunk_overlap = overlap;
        }
    }
}

#[derive(Args)]
struct RunArgs {
    /// Files or directories; defaults to `[[documents]]` from config
    paths: Vec<PathBuf>,
    /// Output file; defaults to `output.path` from config
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Abort on the first document that fails
    #[arg(long)]
    fail_fast: bool,
    #[arg(long)]
    workers: Option<usize>,
    #[command(flatten)]
    chunking: ChunkOptions,
}

#[derive(Args)]
struct ChunkArgs {
    file: Option<PathBuf>,
    /// Chunk the input as-is, without normalization
    #[arg(long)]
    raw: bool,
    #[command(flatten)]
    chunking: ChunkOptions,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("loading configuration")?;
    match cli.command {
        Commands::Run(args) => run(&config, args),
        Commands::Metadata { path } => print_metadata(&config, path),
        Commands::Chunk(args) => chunk(&config, args),
    }
}

fn run(config: &Config, args: RunArgs) -> Result<()> {
    let mut settings = config.pipeline()?;
    args.chunking.apply(&mut settings);
    settings.fail_fast |= args.fail_fast;
    if let Some(workers) = args.workers {
        settings.workers = workers;
    }

    let docs = if args.paths.is_empty() {
        let base = env::current_dir()?;
        config.documents()?.iter().map(|entry| entry.to_document(&base)).collect()
    } else {
        collect_documents(&args.paths)?
    };
    if docs.is_empty() {
        bail!("no documents to process; pass paths or configure [[documents]]");
    }

    let output = match args.output {
        Some(path) => path,
        None => expand_path(config.output()?.path),
    };
    let collaborators = Collaborators::from_settings(&config.vision()?)?;
    let pipeline = Pipeline::new(settings, collaborators)?;
    info!(documents = docs.len(), output = %output.display(), "processing");

    let pb = ProgressBar::new(docs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents {msg}")?
            .progress_chars("#>-"),
    );
    let mut sink = OrderedSink::new(JsonlSink::create(&output)?);
    let result = pipeline.process_blocking_with(docs, |index, record| {
        pb.inc(1);
        sink.push(index, record.as_ref().ok().cloned())
    });
    let written = sink.written();
    sink.finish()?;

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            pb.abandon_with_message("aborted");
            return Err(e).context("run aborted (fail-fast)");
        }
    };
    pb.finish_with_message("done");
    println!("{report}");
    println!("wrote {written} records to {}", output.display());
    Ok(())
}

fn print_metadata(config: &Config, path: PathBuf) -> Result<()> {
    let doc = Document::new(path);
    let mut record = metadata::extract(&AutoMetadataSource, &doc)?;
    if let Some(overrides) = config.pipeline()?.parsed_overrides()?.get(&doc.id) {
        record.apply_overrides(overrides);
    }
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn chunk(config: &Config, args: ChunkArgs) -> Result<()> {
    let mut settings = config.pipeline()?;
    args.chunking.apply(&mut settings);
    let chunker = RecursiveChunker::new(settings.chunk_config())?;

    let raw = match &args.file {
        Some(path) => fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let text = if args.raw { raw } else { TextNormalizer::new(settings.citation_order).normalize(&raw) };
    for piece in chunker.split_text(&text) {
        println!("{}", serde_json::to_string(&piece)?);
    }
    Ok(())
}
