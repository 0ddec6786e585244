//! Configuration for the OCR processor
//!
//! Values come from an optional TOML file and are then overridden by
//! environment variables, which is how the handler is configured when
//! deployed.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main processor configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Hosted OCR configuration
    #[serde(default)]
    pub ocr: OcrConfig,
    /// Object store configuration
    #[serde(default)]
    pub store: StoreConfig,
    /// Key prefixes for inputs and artifacts
    #[serde(default)]
    pub paths: PathsConfig,
    /// Size and display limits
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl ProcessorConfig {
    /// Load from an optional TOML file, then apply process environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Override fields from a variable lookup (the process environment in production)
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("MISTRAL_API_KEY") {
            self.ocr.api_key = v;
        }
        if let Some(v) = get("OCR_MODEL") {
            self.ocr.model = v;
        }
        if let Some(v) = get("OCR_BASE_URL") {
            self.ocr.base_url = v;
        }
        if let Some(v) = get("OCR_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.ocr.timeout_secs = v;
        }

        if let Some(v) = get("STORE_BACKEND") {
            match v.to_lowercase().as_str() {
                "s3" => self.store.backend = StoreBackend::S3,
                "local" => self.store.backend = StoreBackend::Local,
                other => tracing::warn!("Ignoring unknown STORE_BACKEND '{}'", other),
            }
        }
        if let Some(v) = get("BUCKET_NAME") {
            self.store.bucket = v;
        }
        if let Some(v) = get("TARGET_BUCKET") {
            self.store.target_bucket = Some(v);
        }
        if let Some(v) = get("AWS_REGION") {
            self.store.region = Some(v);
        }
        if let Some(v) = get("AWS_ENDPOINT_URL") {
            self.store.endpoint_url = Some(v);
        }
        if let Some(v) = get("AWS_ACCESS_KEY_ID") {
            self.store.access_key_id = Some(v);
        }
        if let Some(v) = get("AWS_SECRET_ACCESS_KEY") {
            self.store.secret_access_key = Some(v);
        }
        if let Some(v) = get("LOCAL_STORE_ROOT") {
            self.store.local_root = PathBuf::from(v);
        }

        if let Some(v) = get("SOURCE_PREFIX") {
            self.paths.source_prefix = v;
        }
        if let Some(v) = get("OUTPUT_PREFIX") {
            self.paths.output_prefix = v;
        }
        if let Some(v) = get("LOG_PREFIX") {
            self.paths.log_prefix = v;
        }

        if let Some(v) = get("MAX_PDF_BYTES").and_then(|v| v.parse().ok()) {
            self.limits.max_pdf_bytes = v;
        }
        if let Some(v) = get("FALLBACK_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.limits.fallback_timeout_secs = v;
        }
    }

    /// Check required settings. Runs before any network call.
    pub fn validate(&self) -> Result<()> {
        if self.ocr.api_key.trim().is_empty() {
            return Err(Error::Config(
                "MISTRAL_API_KEY environment variable is required".to_string(),
            ));
        }
        if self.store.bucket.trim().is_empty() {
            return Err(Error::Config("bucket name must not be empty".to_string()));
        }
        if self.limits.max_pdf_bytes == 0 {
            return Err(Error::Config("max_pdf_bytes must be positive".to_string()));
        }
        if self.limits.fallback_timeout_secs == 0 {
            return Err(Error::Config("fallback_timeout_secs must be positive".to_string()));
        }
        if self.limits.display_char_limit == 0 {
            return Err(Error::Config("display_char_limit must be positive".to_string()));
        }
        Ok(())
    }

    /// Container a run is allowed to process
    pub fn target_bucket(&self) -> &str {
        self.store
            .target_bucket
            .as_deref()
            .unwrap_or(&self.store.bucket)
    }
}

/// Hosted OCR configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// API credential, never serialized
    #[serde(default, skip_serializing)]
    pub api_key: String,
    /// OCR model name (default: "mistral-ocr-latest")
    #[serde(default = "default_ocr_model")]
    pub model: String,
    /// API base URL
    #[serde(default = "default_ocr_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_ocr_timeout")]
    pub timeout_secs: u64,
    /// Ask the API to return inline page images
    #[serde(default = "default_include_images")]
    pub include_image_base64: bool,
}

fn default_ocr_model() -> String {
    "mistral-ocr-latest".to_string()
}

fn default_ocr_base_url() -> String {
    "https://api.mistral.ai".to_string()
}

fn default_ocr_timeout() -> u64 {
    120
}

fn default_include_images() -> bool {
    true
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_ocr_model(),
            base_url: default_ocr_base_url(),
            timeout_secs: default_ocr_timeout(),
            include_image_base64: default_include_images(),
        }
    }
}

impl std::fmt::Debug for OcrConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("include_image_base64", &self.include_image_base64)
            .finish()
    }
}

/// Show only a short prefix of a secret
pub fn redact(secret: &str) -> String {
    if secret.is_empty() {
        return "<unset>".to_string();
    }
    let visible: String = secret.chars().take(4).collect();
    format!("{}...", visible)
}

/// Object store backend selection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Amazon S3 (or any S3-compatible endpoint)
    #[default]
    S3,
    /// Local filesystem, one directory per bucket
    Local,
}

/// Object store configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Bucket the handler reads from and writes to
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Bucket the handler is allowed to process (defaults to `bucket`)
    #[serde(default)]
    pub target_bucket: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    /// Custom S3 endpoint (MinIO, LocalStack, ...)
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default, skip_serializing)]
    pub access_key_id: Option<String>,
    #[serde(default, skip_serializing)]
    pub secret_access_key: Option<String>,
    /// Root directory for the local backend
    #[serde(default = "default_local_root")]
    pub local_root: PathBuf,
}

fn default_bucket() -> String {
    "hubspot-tickets-pdf".to_string()
}

fn default_local_root() -> PathBuf {
    PathBuf::from("./object-store")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            bucket: default_bucket(),
            target_bucket: None,
            region: None,
            endpoint_url: None,
            access_key_id: None,
            secret_access_key: None,
            local_root: default_local_root(),
        }
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("backend", &self.backend)
            .field("bucket", &self.bucket)
            .field("target_bucket", &self.target_bucket)
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .field("access_key_id", &self.access_key_id.as_deref().map(redact))
            .field(
                "secret_access_key",
                &self.secret_access_key.as_deref().map(redact),
            )
            .field("local_root", &self.local_root)
            .finish()
    }
}

/// Key prefixes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Where incoming PDFs land (default: "PDF_TEST/")
    #[serde(default = "default_source_prefix")]
    pub source_prefix: String,
    /// Where OCR text artifacts are written (default: "PDF_OCR")
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,
    /// Where run logs are written (default: "PDF_LOGS")
    #[serde(default = "default_log_prefix")]
    pub log_prefix: String,
}

fn default_source_prefix() -> String {
    "PDF_TEST/".to_string()
}

fn default_output_prefix() -> String {
    "PDF_OCR".to_string()
}

fn default_log_prefix() -> String {
    "PDF_LOGS".to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_prefix: default_source_prefix(),
            output_prefix: default_output_prefix(),
            log_prefix: default_log_prefix(),
        }
    }
}

/// Size and display limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// PDFs larger than this are skipped (default: 10MB)
    #[serde(default = "default_max_pdf_bytes")]
    pub max_pdf_bytes: u64,
    /// Characters kept in the persisted text (default: 2000)
    #[serde(default = "default_display_char_limit")]
    pub display_char_limit: usize,
    /// Bound on the local text-layer fallback (default: 60s)
    #[serde(default = "default_fallback_timeout")]
    pub fallback_timeout_secs: u64,
}

fn default_max_pdf_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_display_char_limit() -> usize {
    2000
}

fn default_fallback_timeout() -> u64 {
    60
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_pdf_bytes: default_max_pdf_bytes(),
            display_char_limit: default_display_char_limit(),
            fallback_timeout_secs: default_fallback_timeout(),
        }
    }
}
