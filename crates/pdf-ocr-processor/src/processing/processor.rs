//! Run orchestrator
//!
//! One invocation: validate config → connect store → locate → download →
//! size guard → extract → persist text → persist log. Every failure ends in
//! a structured `HandlerResponse`; nothing escapes the handler.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use super::locator::find_latest_object;
use crate::config::{ProcessorConfig, StoreBackend, StoreConfig};
use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::extraction::{LopdfTextExtractor, TextExtractor};
use crate::providers::{LocalConnector, MistralOcrClient, ObjectStore, ObjectStoreConnector};
use crate::types::{
    join_key, strip_pdf_extension, truncate_for_display, DocumentRef, ExtractionMethod,
    ExtractionResult, ExtractionStatus, HandlerResponse, InvocationContext, RunLog,
};

/// Text persisted (and reported) when nothing could be extracted
pub const NO_TEXT_PLACEHOLDER: &str = "No text extracted";

const SUCCESS_MESSAGE: &str = "Processing complete";
const PARTIAL_MESSAGE: &str = "Processing complete with persistence errors";
const ERROR_MESSAGE: &str = "Processing failed";

/// Why a document was deliberately left alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Bucket is not the configured target
    WrongBucket,
    /// PDF exceeds the size limit
    SizeLimit,
}

impl SkipReason {
    /// `processing_status` value reported to the caller
    pub fn processing_status(&self) -> &'static str {
        match self {
            SkipReason::WrongBucket => "skipped",
            SkipReason::SizeLimit => "skipped_size_limit",
        }
    }
}

/// Text extracted from one document
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub result: ExtractionResult,
    /// Extraction produced only whitespace; `result.text` holds the placeholder
    pub no_text: bool,
    /// Hosted OCR failure that forced the fallback
    pub ocr_error: Option<String>,
}

/// Result of processing one document
#[derive(Debug, Clone)]
pub enum ProcessOutcome {
    Skipped {
        reason: SkipReason,
        message: String,
        result: ExtractionResult,
    },
    Extracted(ExtractedDocument),
}

/// Outcome of the two artifact writes
#[derive(Debug, Clone, Default)]
pub struct PersistReport {
    pub text_key: String,
    pub log_key: String,
    pub text_error: Option<String>,
    pub log_error: Option<String>,
}

impl PersistReport {
    pub fn is_complete(&self) -> bool {
        self.text_error.is_none() && self.log_error.is_none()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "text": { "key": self.text_key, "error": self.text_error },
            "log": { "key": self.log_key, "error": self.log_error },
        })
    }
}

/// Serverless PDF OCR handler
pub struct PdfOcrProcessor {
    config: ProcessorConfig,
    connector: Arc<dyn ObjectStoreConnector>,
    extractor: TextExtractor,
}

impl PdfOcrProcessor {
    pub fn new(
        config: ProcessorConfig,
        connector: Arc<dyn ObjectStoreConnector>,
        extractor: TextExtractor,
    ) -> Self {
        Self {
            config,
            connector,
            extractor,
        }
    }

    /// Build the production wiring: Mistral OCR, lopdf fallback, configured store
    pub fn from_config(config: ProcessorConfig) -> Result<Self> {
        let ocr = Arc::new(MistralOcrClient::new(&config.ocr)?);
        let extractor = TextExtractor::new(ocr, Arc::new(LopdfTextExtractor::new()))
            .with_fallback_timeout(Duration::from_secs(config.limits.fallback_timeout_secs));
        let connector = connector_for(&config.store)?;
        Ok(Self::new(config, connector, extractor))
    }

    /// Process the newest object under the source prefix. The event is not inspected.
    pub async fn handle(
        &self,
        _event: &serde_json::Value,
        invocation: &InvocationContext,
    ) -> HandlerResponse {
        self.run(invocation, None).await
    }

    /// Process a specific object key instead of the newest one
    pub async fn handle_object(&self, key: &str, invocation: &InvocationContext) -> HandlerResponse {
        self.run(invocation, Some(key)).await
    }

    async fn run(&self, invocation: &InvocationContext, requested_key: Option<&str>) -> HandlerResponse {
        let ctx = RunContext::new(invocation);
        let mut log = RunLog::new(ctx.run_id);
        let mut store: Option<Arc<dyn ObjectStore>> = None;

        tracing::info!(parent: &ctx.span, "Handler started");

        let response = match self.execute(&ctx, requested_key, &mut log, &mut store).await {
            Ok(response) => response,
            Err(e) => self.fail(&ctx, &mut log, store.as_deref(), e).await,
        };

        tracing::info!(
            parent: &ctx.span,
            "Handler finished with status {} in {}ms",
            response.status_code,
            ctx.elapsed_ms()
        );
        response
    }

    async fn execute(
        &self,
        ctx: &RunContext,
        requested_key: Option<&str>,
        log: &mut RunLog,
        store_slot: &mut Option<Arc<dyn ObjectStore>>,
    ) -> Result<HandlerResponse> {
        self.config.validate()?;
        tracing::info!(
            parent: &ctx.span,
            "OCR API key found: {}",
            crate::config::redact(&self.config.ocr.api_key)
        );

        let bucket = self.config.store.bucket.as_str();
        if let Some(key) = requested_key {
            ensure_pdf(&DocumentRef::new(bucket, key))?;
        }

        let store = self.connector.connect().await?;
        *store_slot = Some(store.clone());

        let doc = match requested_key {
            Some(key) => DocumentRef::new(bucket, key),
            None => {
                find_latest_object(ctx, store.as_ref(), bucket, &self.config.paths.source_prefix)
                    .await?
            }
        };
        log.metadata.file_name = doc.file_name().to_string();

        let extracted = match self.process_object(ctx, store.as_ref(), &doc).await? {
            ProcessOutcome::Skipped {
                reason,
                message,
                result,
            } => {
                tracing::info!(
                    parent: &ctx.span,
                    "Run skipped: document={} size={} bytes status={:?} at {}",
                    result.object_key,
                    result.byte_length,
                    result.status,
                    result.processed_at
                );
                return Ok(HandlerResponse::skipped(&message, reason.processing_status()));
            }
            ProcessOutcome::Extracted(extracted) => extracted,
        };

        if extracted.no_text {
            log.ocr_mut().fail(NO_TEXT_PLACEHOLDER);
            tracing::warn!(parent: &ctx.span, "No OCR text found for {}", doc);
            self.persist_log_best_effort(ctx, store.as_ref(), log).await;
            return Ok(HandlerResponse::business_failure(NO_TEXT_PLACEHOLDER));
        }

        if extracted.result.method == ExtractionMethod::FailureMarker {
            let message = extracted.result.text.clone();
            log.ocr_mut().fail(message.clone());
            tracing::error!(parent: &ctx.span, "OCR failed for {}: {}", doc, message);
            self.persist_log_best_effort(ctx, store.as_ref(), log).await;
            return Ok(HandlerResponse::business_failure(&message));
        }

        log.ocr_mut()
            .succeed("Processed", stage_data(&extracted));
        tracing::info!(
            parent: &ctx.span,
            "Successfully processed {} ({} characters)",
            doc,
            extracted.result.text_length
        );

        let report = self
            .persist_artifacts(ctx, store.as_ref(), &doc, &extracted.result, log)
            .await;

        if report.is_complete() {
            Ok(HandlerResponse::success(SUCCESS_MESSAGE, log))
        } else {
            Ok(HandlerResponse::partial_success(PARTIAL_MESSAGE, log, report.to_json()))
        }
    }

    /// Validate, download, size-check and extract one document
    pub async fn process_object(
        &self,
        ctx: &RunContext,
        store: &dyn ObjectStore,
        doc: &DocumentRef,
    ) -> Result<ProcessOutcome> {
        tracing::info!(parent: &ctx.span, "Processing PDF: {}", doc);
        ensure_pdf(doc)?;

        let target = self.config.target_bucket();
        if doc.bucket != target {
            tracing::warn!(
                parent: &ctx.span,
                "Skipping bucket {} (expected {})",
                doc.bucket,
                target
            );
            return Ok(ProcessOutcome::Skipped {
                reason: SkipReason::WrongBucket,
                message: format!("Processing skipped for bucket {}", doc.bucket),
                result: skipped_result(ctx, doc, 0),
            });
        }

        let pdf = store.get_object(&doc.bucket, &doc.key).await.map_err(|e| {
            tracing::error!(parent: &ctx.span, "PDF download failed: {}", e);
            e
        })?;

        let size_mb = pdf.len() as f64 / (1024.0 * 1024.0);
        if pdf.len() as u64 > self.config.limits.max_pdf_bytes {
            tracing::warn!(parent: &ctx.span, "PDF too large ({:.1}MB), skipped", size_mb);
            return Ok(ProcessOutcome::Skipped {
                reason: SkipReason::SizeLimit,
                message: format!("PDF too large ({:.1}MB) - skipped", size_mb),
                result: skipped_result(ctx, doc, pdf.len()),
            });
        }
        tracing::info!(
            parent: &ctx.span,
            "Download succeeded: {} bytes ({:.1}MB)",
            pdf.len(),
            size_mb
        );

        let extraction = self.extractor.extract(ctx, &pdf).await;
        let no_text = extraction.is_blank();
        let full_text = if no_text {
            tracing::warn!(parent: &ctx.span, "No text could be extracted");
            NO_TEXT_PLACEHOLDER.to_string()
        } else {
            extraction.text
        };

        let text_length = full_text.chars().count();
        let display_text = truncate_for_display(&full_text, self.config.limits.display_char_limit);
        let status = match extraction.method {
            ExtractionMethod::FailureMarker => ExtractionStatus::Error,
            _ => ExtractionStatus::Success,
        };

        tracing::info!(
            parent: &ctx.span,
            "Extracted text: document={} size={} bytes length={} characters method={:?}",
            doc.key,
            pdf.len(),
            text_length,
            extraction.method
        );
        tracing::debug!(parent: &ctx.span, "{}", display_text);

        Ok(ProcessOutcome::Extracted(ExtractedDocument {
            result: ExtractionResult::new(
                ctx.run_id,
                &doc.bucket,
                &doc.key,
                status,
                extraction.method,
                display_text,
                pdf.len(),
                text_length,
                Utc::now(),
            ),
            no_text,
            ocr_error: extraction.ocr_error,
        }))
    }

    /// `{output_prefix}/OCR_{base}.txt`
    pub fn text_key(&self, doc: &DocumentRef) -> String {
        join_key(
            &self.config.paths.output_prefix,
            &format!("OCR_{}.txt", doc.base_name()),
        )
    }

    /// `{log_prefix}/{base}.json`, or a run-scoped name before a file is known
    pub fn log_key(&self, log: &RunLog) -> String {
        let base = strip_pdf_extension(&log.metadata.file_name);
        let leaf = if base.is_empty() {
            format!("run_{}.json", log.metadata.run_id)
        } else {
            format!("{}.json", base)
        };
        join_key(&self.config.paths.log_prefix, &leaf)
    }

    /// Write the text, then the log. A failed write does not stop the other.
    async fn persist_artifacts(
        &self,
        ctx: &RunContext,
        store: &dyn ObjectStore,
        doc: &DocumentRef,
        result: &ExtractionResult,
        log: &mut RunLog,
    ) -> PersistReport {
        let mut report = PersistReport {
            text_key: self.text_key(doc),
            log_key: self.log_key(log),
            ..Default::default()
        };

        match store
            .put_object(
                &self.config.store.bucket,
                &report.text_key,
                result.text.as_bytes().to_vec(),
                "text/plain; charset=utf-8",
            )
            .await
        {
            Ok(()) => {
                tracing::info!(
                    parent: &ctx.span,
                    "OCR result saved: s3://{}/{}",
                    self.config.store.bucket,
                    report.text_key
                );
                log.ocr_mut().data["output_key"] = serde_json::json!(report.text_key);
            }
            Err(e) => {
                tracing::error!(parent: &ctx.span, "Failed to save OCR result: {}", e);
                log.ocr_mut().data["output_error"] = serde_json::json!(e.to_string());
                report.text_error = Some(e.to_string());
            }
        }

        if let Err(e) = self.persist_log(ctx, store, log).await {
            report.log_error = Some(e.to_string());
        }

        report
    }

    async fn persist_log(&self, ctx: &RunContext, store: &dyn ObjectStore, log: &RunLog) -> Result<()> {
        let key = self.log_key(log);
        let body = serde_json::to_vec_pretty(log)?;

        store
            .put_object(&self.config.store.bucket, &key, body, "application/json")
            .await
            .map_err(|e| {
                tracing::error!(parent: &ctx.span, "Failed to save run log: {}", e);
                e
            })?;

        tracing::info!(
            parent: &ctx.span,
            "Run log saved: s3://{}/{}",
            self.config.store.bucket,
            key
        );
        Ok(())
    }

    async fn persist_log_best_effort(&self, ctx: &RunContext, store: &dyn ObjectStore, log: &RunLog) {
        // Failure is already logged inside persist_log
        let _ = self.persist_log(ctx, store, log).await;
    }

    /// Error path: record the failure, save the log if a store exists, build the 500
    async fn fail(
        &self,
        ctx: &RunContext,
        log: &mut RunLog,
        store: Option<&dyn ObjectStore>,
        error: Error,
    ) -> HandlerResponse {
        log.ocr_mut().fail(error.to_string());
        tracing::error!(parent: &ctx.span, "Error processing PDF: {}", error);

        match store {
            Some(store) => self.persist_log_best_effort(ctx, store, log).await,
            None => tracing::warn!(
                parent: &ctx.span,
                "No object store client available, run log not persisted"
            ),
        }

        HandlerResponse::error(ERROR_MESSAGE, &error, log)
    }
}

/// Pick the connector matching the configured backend
pub fn connector_for(store: &StoreConfig) -> Result<Arc<dyn ObjectStoreConnector>> {
    match store.backend {
        StoreBackend::Local => Ok(Arc::new(LocalConnector {
            root: store.local_root.clone(),
        })),
        #[cfg(feature = "s3")]
        StoreBackend::S3 => Ok(Arc::new(crate::providers::S3Connector {
            config: store.clone(),
        })),
        #[cfg(not(feature = "s3"))]
        StoreBackend::S3 => Err(Error::Config(
            "S3 backend requested but the `s3` feature is disabled".to_string(),
        )),
    }
}

fn ensure_pdf(doc: &DocumentRef) -> Result<()> {
    if doc.is_pdf() {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("{} is not a PDF", doc.key)))
    }
}

fn skipped_result(ctx: &RunContext, doc: &DocumentRef, byte_length: usize) -> ExtractionResult {
    ExtractionResult::new(
        ctx.run_id,
        &doc.bucket,
        &doc.key,
        ExtractionStatus::Skipped,
        ExtractionMethod::Ocr,
        String::new(),
        byte_length,
        0,
        Utc::now(),
    )
}

fn stage_data(extracted: &ExtractedDocument) -> serde_json::Value {
    let result = &extracted.result;
    serde_json::json!({
        "text": result.text,
        "document_id": result.document_id,
        "object_key": result.object_key,
        "byte_length": result.byte_length,
        "text_length": result.text_length,
        "method": result.method,
        "processed_at": result.processed_at,
        "ocr_error": extracted.ocr_error,
    })
}
