use clap::{Parser, Subcommand};
use cli::{load_config, render_output, write_output, OutputFormat};
use color_eyre::eyre::Result;
use flowchart::{ExtractionConfig, NoopOcrEngine, Pipeline, TesseractEngine};
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the node/connection graph from a flowchart image
    Extract {
        /// Path to the flowchart image
        #[arg(short, long)]
        input: PathBuf,
        /// Configuration file (.toml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output format: graph or layout
        #[arg(short, long, default_value = "graph")]
        format: OutputFormat,
        /// Skip OCR and leave node text empty
        #[arg(long)]
        no_ocr: bool,
        /// Path to the tesseract executable
        #[arg(long)]
        tesseract: Option<PathBuf>,
        /// OCR language code (overrides the configuration)
        #[arg(long)]
        language: Option<String>,
        /// Per-region OCR timeout in milliseconds
        #[arg(long)]
        ocr_timeout_ms: Option<u64>,
        /// Concurrent OCR calls
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Print the JSON schema of the configuration file
    Schema,
    /// Write the default configuration to a file
    InitConfig {
        /// Destination (.toml or .json)
        #[arg(short, long, default_value = "flowchart.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            input,
            config,
            output,
            format,
            no_ocr,
            tesseract,
            language,
            ocr_timeout_ms,
            workers,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(language) = language {
                config.ocr_language = language;
            }
            if ocr_timeout_ms.is_some() {
                config.ocr_timeout_ms = ocr_timeout_ms;
            }
            if let Some(workers) = workers {
                config.ocr_workers = workers;
            }

            let ocr = if no_ocr { None } else { Some(tesseract) };
            extract(input, output, format, config, ocr).await?;
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&ExtractionConfig::schema())?);
        }
        Commands::InitConfig { output } => {
            ExtractionConfig::default().to_file(&output)?;
            info!("Default configuration written to {:?}", output);
        }
    }

    Ok(())
}

/// `ocr` is `None` for geometry-only runs, otherwise an optional explicit tesseract path
async fn extract(
    input: PathBuf,
    output: Option<PathBuf>,
    format: OutputFormat,
    config: ExtractionConfig,
    ocr: Option<Option<PathBuf>>,
) -> Result<()> {
    let builder = Pipeline::builder().with_config(config.clone());
    let builder = match ocr {
        None => builder.set_ocr_engine(NoopOcrEngine),
        Some(path) => {
            let engine = match path {
                Some(path) => TesseractEngine::with_path(path)?,
                None => TesseractEngine::new()?,
            };
            info!("Using OCR engine at {:?}", engine.executable());
            builder.set_ocr_engine(engine.with_page_segmentation_mode(config.page_segmentation_mode))
        }
    };
    let pipeline = builder.build()?;

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling pending OCR");
            let _ = cancel_tx.send(true);
        }
    });

    info!("Processing {:?}", input);
    let extraction = pipeline.process_path_with_cancel(&input, cancel_rx).await?;

    for warning in &extraction.warnings {
        warn!(node_id = warning.node_id, "{}", warning.message);
    }
    info!(
        "Extracted {} nodes and {} connections",
        extraction.graph.nodes().len(),
        extraction.graph.connections().len()
    );

    let content = render_output(extraction, format, &config)?;
    write_output(&content, output.as_deref())?;
    Ok(())
}
