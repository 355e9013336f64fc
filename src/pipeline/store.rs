//! Document persistence abstraction.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::state::DocumentState;
use crate::core::Invoice;
use crate::package::DocumentName;
use crate::sunat::{Receipt, SoapMethod};

/// Identifier of a stored document.
pub type DocumentId = Uuid;

/// One exchange with the remote service. Append-only; the latest is
/// authoritative.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionRecord {
    pub method: SoapMethod,
    pub success: bool,
    pub raw_response: Option<String>,
    pub ticket: Option<String>,
    pub receipt_zip_path: Option<String>,
    pub receipt_xml_path: Option<String>,
    pub receipt: Option<Receipt>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl SubmissionRecord {
    pub fn new(method: SoapMethod, success: bool) -> Self {
        Self {
            method,
            success,
            raw_response: None,
            ticket: None,
            receipt_zip_path: None,
            receipt_xml_path: None,
            receipt: None,
            error: None,
            timestamp: Utc::now(),
        }
    }
}

/// Stored document with its lifecycle data.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub invoice: Invoice,
    #[serde(skip)]
    pub name: DocumentName,
    pub state: DocumentState,
    pub xml_name: Option<String>,
    pub zip_name: Option<String>,
    pub ticket: Option<String>,
    pub errors: Option<String>,
    pub receipt_zip_path: Option<String>,
    pub receipt_xml_path: Option<String>,
    pub submissions: Vec<SubmissionRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// New record in [`DocumentState::Draft`] with a time-ordered id.
    pub fn new(invoice: Invoice) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: DocumentName::for_invoice(&invoice),
            invoice,
            state: DocumentState::Draft,
            xml_name: None,
            zip_name: None,
            ticket: None,
            errors: None,
            receipt_zip_path: None,
            receipt_xml_path: None,
            submissions: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn latest_submission(&self) -> Option<&SubmissionRecord> {
        self.submissions.last()
    }
}

/// Store errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(DocumentId),
    #[error("document {id} is {state}, expected one of {expected}")]
    InvalidState {
        id: DocumentId,
        state: DocumentState,
        expected: String,
    },
    #[error("document {0} has a transition in flight")]
    InFlight(DocumentId),
    #[error("document {id} changed from {expected} to {actual}")]
    Conflict {
        id: DocumentId,
        expected: DocumentState,
        actual: DocumentState,
    },
    #[error("illegal transition {from} -> {to}")]
    IllegalTransition {
        from: DocumentState,
        to: DocumentState,
    },
    #[error("document already exists: {0}")]
    AlreadyExists(DocumentId),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Persistence of document records.
///
/// Transitions follow a claim/commit protocol: [`claim`](Self::claim) marks
/// a document in flight if its state is allowed, and
/// [`commit`](Self::commit) writes the new record only if the state is still
/// the one observed at claim time.
pub trait DocumentStore: Send + Sync {
    /// Insert a new record.
    fn insert(&self, record: DocumentRecord) -> Result<(), StoreError>;

    /// Snapshot of a record.
    fn get(&self, id: DocumentId) -> Result<Option<DocumentRecord>, StoreError>;

    /// Claim a document whose state is in `allowed`.
    fn claim(&self, id: DocumentId, allowed: &[DocumentState]) -> Result<DocumentRecord, StoreError>;

    /// Compare-and-set commit of a claimed document; releases the claim.
    fn commit(&self, observed: DocumentState, record: DocumentRecord) -> Result<(), StoreError>;

    /// Release a claim without changes.
    fn release(&self, id: DocumentId);

    /// Ids of documents in any of `states`, oldest first.
    fn list_by_state(&self, states: &[DocumentState]) -> Result<Vec<DocumentId>, StoreError>;
}

#[derive(Debug, Default)]
struct Inner {
    documents: HashMap<DocumentId, DocumentRecord>,
    in_flight: HashSet<DocumentId>,
}

/// In-memory document store for tests and single-process use.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.documents.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Storage("lock poisoned".into())
}

fn describe(states: &[DocumentState]) -> String {
    states
        .iter()
        .map(DocumentState::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl DocumentStore for InMemoryStore {
    fn insert(&self, record: DocumentRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        if inner.documents.contains_key(&record.id) {
            return Err(StoreError::AlreadyExists(record.id));
        }
        inner.documents.insert(record.id, record);
        Ok(())
    }

    fn get(&self, id: DocumentId) -> Result<Option<DocumentRecord>, StoreError> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.documents.get(&id).cloned())
    }

    fn claim(&self, id: DocumentId, allowed: &[DocumentState]) -> Result<DocumentRecord, StoreError> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        let record = inner
            .documents
            .get(&id)
            .ok_or(StoreError::NotFound(id))?;
        if !allowed.contains(&record.state) {
            return Err(StoreError::InvalidState {
                id,
                state: record.state,
                expected: describe(allowed),
            });
        }
        let snapshot = record.clone();
        if !inner.in_flight.insert(id) {
            return Err(StoreError::InFlight(id));
        }
        Ok(snapshot)
    }

    fn commit(&self, observed: DocumentState, mut record: DocumentRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        let id = record.id;
        inner.in_flight.remove(&id);
        let current = inner
            .documents
            .get_mut(&id)
            .ok_or(StoreError::NotFound(id))?;
        if current.state != observed {
            return Err(StoreError::Conflict {
                id,
                expected: observed,
                actual: current.state,
            });
        }
        if !observed.can_transition_to(record.state) {
            return Err(StoreError::IllegalTransition {
                from: observed,
                to: record.state,
            });
        }
        if record.submissions.len() < current.submissions.len() {
            return Err(StoreError::Storage(
                "submission history is append-only".into(),
            ));
        }
        record.updated_at = Utc::now();
        *current = record;
        Ok(())
    }

    fn release(&self, id: DocumentId) {
        if let Ok(mut inner) = self.inner.write() {
            inner.in_flight.remove(&id);
        }
    }

    fn list_by_state(&self, states: &[DocumentState]) -> Result<Vec<DocumentId>, StoreError> {
        let inner = self.inner.read().map_err(poisoned)?;
        let mut found: Vec<_> = inner
            .documents
            .values()
            .filter(|r| states.contains(&r.state))
            .map(|r| (r.created_at, r.id))
            .collect();
        found.sort();
        Ok(found.into_iter().map(|(_, id)| id).collect())
    }
}
