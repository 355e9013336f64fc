use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while turning validated data into a document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CpeError {
    /// One or more validation rules failed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The document could not be assembled from the invoice.
    #[error("build error: {0}")]
    Build(String),

    /// XML generation or parsing error.
    #[error("XML error: {0}")]
    Xml(String),
}

/// Validation stage that produced an error.
///
/// Stages run in order and validation stops after the first stage that
/// reports anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStage {
    /// Presence, parseability and shape of the raw fields.
    Structural,
    /// Catalog membership and per-document-type rules.
    Semantic,
    /// Tax identifier check digit.
    Checksum,
    /// Totals reconciliation across fields.
    CrossField,
}

impl ValidationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structural => "structural",
            Self::Semantic => "semantic",
            Self::Checksum => "checksum",
            Self::CrossField => "cross_field",
        }
    }
}

/// A single validation error with field path and message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Dot-separated path to the invalid field (e.g. "customer.id", "lines[0].quantity").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
    pub stage: ValidationStage,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.stage.as_str(), self.field, self.message)
    }
}

impl ValidationError {
    pub fn new(
        stage: ValidationStage,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            stage,
        }
    }

    pub fn structural(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ValidationStage::Structural, field, message)
    }

    pub fn semantic(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ValidationStage::Semantic, field, message)
    }

    pub fn checksum(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ValidationStage::Checksum, field, message)
    }

    pub fn cross_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ValidationStage::CrossField, field, message)
    }
}

/// Join validation errors into a single message, one per line.
pub fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
