//! PDF OCR handler binary
//!
//! Runs one handler invocation and prints the response record.
//!
//! Run with: cargo run -p pdf-ocr-processor --bin pdf-ocr-handler -- --backend local

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use pdf_ocr_processor::config::StoreBackend;
use pdf_ocr_processor::{InvocationContext, PdfOcrProcessor, ProcessorConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Library and binary events at info unless RUST_LOG says otherwise
const DEFAULT_LOG_FILTER: &str = "pdf_ocr_processor=info,pdf_ocr_handler=info";

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Backend {
    S3,
    Local,
}

impl From<Backend> for StoreBackend {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::S3 => StoreBackend::S3,
            Backend::Local => StoreBackend::Local,
        }
    }
}

#[derive(Parser)]
#[command(name = "pdf-ocr-handler")]
#[command(about = "OCR the newest PDF under the source prefix and store the text and run log")]
struct Cli {
    /// TOML configuration file; environment variables override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Event JSON file, or "-" for stdin
    #[arg(long)]
    event: Option<String>,

    /// Process this object key instead of the newest one
    #[arg(long)]
    key: Option<String>,

    /// Object store backend
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Root directory for the local backend
    #[arg(long)]
    local_root: Option<PathBuf>,

    /// Request ID attached to the run span
    #[arg(long)]
    request_id: Option<String>,
}

fn read_event(source: Option<&str>) -> anyhow::Result<serde_json::Value> {
    let raw = match source {
        None => return Ok(serde_json::json!({})),
        Some("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read event from stdin")?;
            buf
        }
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event file {}", path))?,
    };

    if raw.trim().is_empty() {
        return Ok(serde_json::json!({}));
    }
    serde_json::from_str(&raw).context("Event is not valid JSON")
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = ProcessorConfig::load(cli.config.as_deref())?;
    if let Some(backend) = cli.backend {
        config.store.backend = backend.into();
    }
    if let Some(root) = cli.local_root {
        config.store.local_root = root;
    }

    tracing::info!("Configuration loaded");
    tracing::info!("  - Store backend: {:?}", config.store.backend);
    tracing::info!("  - Bucket: {}", config.store.bucket);
    tracing::info!("  - Source prefix: {}", config.paths.source_prefix);
    tracing::info!("  - OCR model: {}", config.ocr.model);

    let event = read_event(cli.event.as_deref())?;
    let invocation = InvocationContext {
        request_id: cli.request_id,
        function_name: Some("pdf-ocr-handler".to_string()),
    };

    let processor = PdfOcrProcessor::from_config(config)?;
    let response = match cli.key.as_deref() {
        Some(key) => processor.handle_object(key, &invocation).await,
        None => processor.handle(&event, &invocation).await,
    };

    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(if response.is_server_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    run(Cli::parse()).await
}
