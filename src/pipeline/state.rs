use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a document.
///
/// `Accepted`, `BuildError` and `Submitted` are terminal. `Submitted` means
/// SUNAT took the archive without returning a receipt or a ticket, so there
/// is nothing left to poll and resending would duplicate the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentState {
    #[default]
    Draft,
    Validated,
    Built,
    BuildError,
    ValidationError,
    /// Acknowledged without a receipt or ticket.
    Submitted,
    AwaitingTicket,
    Processing,
    Accepted,
    Rejected,
}

impl DocumentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentState::Draft => "draft",
            DocumentState::Validated => "validated",
            DocumentState::Built => "built",
            DocumentState::BuildError => "build_error",
            DocumentState::ValidationError => "validation_error",
            DocumentState::Submitted => "submitted",
            DocumentState::AwaitingTicket => "awaiting_ticket",
            DocumentState::Processing => "processing",
            DocumentState::Accepted => "accepted",
            DocumentState::Rejected => "rejected",
        }
    }

    /// Whether a ticket is outstanding for this document.
    pub fn is_pending_ticket(&self) -> bool {
        matches!(self, DocumentState::AwaitingTicket | DocumentState::Processing)
    }

    /// Allowed state machine edges. Polling may leave a pending document
    /// in its current state.
    pub fn can_transition_to(&self, next: DocumentState) -> bool {
        use DocumentState::*;
        matches!(
            (self, next),
            (Draft, Validated)
                | (Validated, Built | BuildError)
                | (Built, Submitted | AwaitingTicket | Accepted | Rejected | ValidationError)
                | (AwaitingTicket, AwaitingTicket | Processing | Accepted | Rejected)
                | (Processing, Processing | Accepted | Rejected)
                | (Rejected | ValidationError, Built)
        )
    }
}

impl fmt::Display for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// States from which each orchestrator operation may start.
pub mod allowed {
    use super::DocumentState::{self, *};

    pub const BUILD: &[DocumentState] = &[Validated];
    pub const SUBMIT: &[DocumentState] = &[Built];
    pub const POLL: &[DocumentState] = &[AwaitingTicket, Processing];
    pub const RETRY: &[DocumentState] = &[Rejected, ValidationError];
}
