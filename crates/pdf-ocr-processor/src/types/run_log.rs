//! Structured run log persisted next to every processed PDF
//!
//! The log mirrors the downstream workflow: OCR is the only stage this
//! handler drives, LLM and DEAL stay "Not started" for the stages that pick
//! the document up later.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of one workflow stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageStatus {
    #[default]
    #[serde(rename = "Not started")]
    NotStarted,
    Success,
    Failed,
}

impl StageStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StageStatus::NotStarted)
    }
}

/// One workflow stage entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageEntry {
    pub status: StageStatus,
    pub details: String,
    #[serde(default = "empty_object")]
    pub data: serde_json::Value,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}

impl StageEntry {
    pub fn not_started() -> Self {
        Self {
            status: StageStatus::NotStarted,
            details: String::new(),
            data: empty_object(),
        }
    }

    /// Mark the stage successful with a payload
    pub fn succeed(&mut self, details: impl Into<String>, data: serde_json::Value) {
        self.status = StageStatus::Success;
        self.details = details.into();
        self.data = data;
    }

    /// Mark the stage failed; any payload already recorded is kept
    pub fn fail(&mut self, details: impl Into<String>) {
        self.status = StageStatus::Failed;
        self.details = details.into();
    }
}

/// Deal identifiers filled in by the CRM stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DealTransaction {
    pub dealname: String,
    pub id_deal: String,
}

/// DEAL stage placeholder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealStage {
    pub status: StageStatus,
    pub details: String,
    pub transaction: DealTransaction,
    pub matching_company: serde_json::Value,
    pub matching_products: serde_json::Value,
}

impl Default for DealStage {
    fn default() -> Self {
        Self {
            status: StageStatus::NotStarted,
            details: String::new(),
            transaction: DealTransaction::default(),
            matching_company: empty_object(),
            matching_products: empty_object(),
        }
    }
}

/// Per-stage workflow block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(rename = "OCR")]
    pub ocr: StageEntry,
    #[serde(rename = "LLM")]
    pub llm: StageEntry,
    #[serde(rename = "DEAL")]
    pub deal: DealStage,
}

impl Default for Workflow {
    fn default() -> Self {
        Self {
            ocr: StageEntry::not_started(),
            llm: StageEntry::not_started(),
            deal: DealStage::default(),
        }
    }
}

/// Metadata block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Source file name without its prefix
    pub file_name: String,
    /// ISO-8601 UTC creation time
    pub created_at: String,
    /// Run identifier
    pub run_id: Uuid,
}

/// Run log record for one invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLog {
    pub metadata: RunMetadata,
    pub workflow: Workflow,
}

impl RunLog {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            metadata: RunMetadata {
                file_name: String::new(),
                created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
                run_id,
            },
            workflow: Workflow::default(),
        }
    }

    pub fn ocr_mut(&mut self) -> &mut StageEntry {
        &mut self.workflow.ocr
    }

    pub fn ocr_status(&self) -> StageStatus {
        self.workflow.ocr.status
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| empty_object())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_log_shape() {
        let log = RunLog::new(Uuid::new_v4());
        let json = log.to_json();

        assert_eq!(json["workflow"]["OCR"]["status"], "Not started");
        assert_eq!(json["workflow"]["OCR"]["details"], "");
        assert!(json["workflow"]["OCR"]["data"].as_object().unwrap().is_empty());
        assert_eq!(json["workflow"]["LLM"]["status"], "Not started");
        assert_eq!(json["workflow"]["DEAL"]["transaction"]["dealname"], "");
        assert_eq!(json["workflow"]["DEAL"]["transaction"]["id_deal"], "");
        assert!(json["workflow"]["DEAL"]["matching_company"].is_object());
        assert!(json["metadata"]["created_at"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_stage_transitions() {
        let mut log = RunLog::new(Uuid::new_v4());
        assert!(!log.ocr_status().is_terminal());

        log.ocr_mut()
            .succeed("Processed", serde_json::json!({ "text": "Hello" }));
        assert_eq!(log.ocr_status(), StageStatus::Success);

        log.ocr_mut().fail("upload failed");
        assert_eq!(log.ocr_status(), StageStatus::Failed);
        assert_eq!(log.workflow.ocr.data["text"], "Hello");
        assert!(log.ocr_status().is_terminal());
    }

    #[test]
    fn test_status_serialization() {
        let decoded: RunLog = serde_json::from_value(RunLog::new(Uuid::nil()).to_json()).unwrap();
        assert_eq!(decoded.workflow.deal.status, StageStatus::NotStarted);
        assert_eq!(
            serde_json::to_value(StageStatus::Failed).unwrap(),
            serde_json::json!("Failed")
        );
    }
}
