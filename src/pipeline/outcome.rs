//! Caller-facing results of orchestrator operations.

use serde::Serialize;

use super::state::DocumentState;
use super::store::{DocumentId, SubmissionRecord};
use crate::core::ValidationError;
use crate::sunat::{ProtocolError, Receipt};

/// One error attached to an [`Outcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl ErrorDetail {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            field: None,
            message: message.into(),
        }
    }
}

impl From<&ValidationError> for ErrorDetail {
    fn from(e: &ValidationError) -> Self {
        Self {
            code: e.stage.as_str().to_string(),
            field: Some(e.field.clone()),
            message: e.message.clone(),
        }
    }
}

impl From<&ProtocolError> for ErrorDetail {
    fn from(e: &ProtocolError) -> Self {
        match e {
            ProtocolError::Fault { code, message } => Self::new(code.clone(), message.clone()),
            ProtocolError::Transport(message) => Self::new("transport", message.clone()),
            ProtocolError::Malformed(message) => Self::new("malformed_response", message.clone()),
        }
    }
}

/// Uniform result returned to external callers.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome<T> {
    pub success: bool,
    pub message: String,
    pub errors: Vec<ErrorDetail>,
    pub data: Option<T>,
}

impl<T> Outcome<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            errors: Vec::new(),
            data: Some(data),
        }
    }

    pub fn failed(message: impl Into<String>, errors: Vec<ErrorDetail>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors,
            data: None,
        }
    }

    /// Failure that still reports data (e.g. the state the document ended in).
    pub fn failed_with(message: impl Into<String>, errors: Vec<ErrorDetail>, data: T) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors,
            data: Some(data),
        }
    }
}

/// Data of a successful `validate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedDocument {
    pub id: DocumentId,
    pub document_id: String,
}

/// Data of a successful `build`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuiltDocument {
    pub xml_name: String,
    pub zip_name: String,
}

/// Data of `submit`, `retry` and `poll_status`.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionSummary {
    pub id: DocumentId,
    pub state: DocumentState,
    pub ticket: Option<String>,
    pub receipt: Option<Receipt>,
}

/// Data of `status`.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentStatus {
    pub id: DocumentId,
    pub document_id: String,
    pub state: DocumentState,
    pub ticket: Option<String>,
    pub errors: Option<String>,
    pub receipt_zip_path: Option<String>,
    pub receipt_xml_path: Option<String>,
    pub latest_submission: Option<SubmissionRecord>,
}

/// Per-document line of a bulk report.
#[derive(Debug, Clone, Serialize)]
pub struct BulkItem {
    pub id: DocumentId,
    pub success: bool,
    pub state: Option<DocumentState>,
    pub message: String,
}

/// Result of `bulk_submit`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub items: Vec<BulkItem>,
}

impl BulkReport {
    pub(crate) fn from_items(items: Vec<BulkItem>) -> Self {
        let succeeded = items.iter().filter(|i| i.success).count();
        Self {
            total: items.len(),
            succeeded,
            failed: items.len() - succeeded,
            items,
        }
    }
}

/// Result of `sweep_pending_tickets`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub checked: usize,
    pub items: Vec<BulkItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ValidationStage;

    #[test]
    fn validation_error_detail_keeps_field() {
        let e = ValidationError::new(ValidationStage::Semantic, "customer.idType", "must be 1");
        let detail = ErrorDetail::from(&e);
        assert_eq!(detail.code, "semantic");
        assert_eq!(detail.field.as_deref(), Some("customer.idType"));
    }

    #[test]
    fn fault_detail_keeps_code() {
        let detail = ErrorDetail::from(&ProtocolError::Fault {
            code: "soap-env:Client.0111".into(),
            message: "sin perfil".into(),
        });
        assert_eq!(detail.code, "soap-env:Client.0111");
        assert_eq!(detail.message, "sin perfil");
    }

    #[test]
    fn outcome_serializes_uniformly() {
        let outcome: Outcome<BuiltDocument> = Outcome::failed("nope", vec![]);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["success"], false);
        assert!(json["data"].is_null());
        assert!(json["errors"].as_array().unwrap().is_empty());
    }

    #[test]
    fn bulk_report_counts() {
        let id = DocumentId::nil();
        let report = BulkReport::from_items(vec![
            BulkItem { id, success: true, state: None, message: String::new() },
            BulkItem { id, success: false, state: None, message: String::new() },
            BulkItem { id, success: true, state: None, message: String::new() },
        ]);
        assert_eq!((report.total, report.succeeded, report.failed), (3, 2, 1));
    }
}
