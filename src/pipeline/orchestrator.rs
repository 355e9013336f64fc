//! Submission orchestrator: drives documents through their lifecycle.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use quick_xml::Reader;
use quick_xml::events::Event;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::outcome::{
    BuiltDocument, BulkItem, BulkReport, DocumentStatus, ErrorDetail, Outcome, SubmissionSummary,
    SweepReport, ValidatedDocument,
};
use super::state::{DocumentState, allowed};
use super::store::{DocumentId, DocumentRecord, DocumentStore, StoreError, SubmissionRecord};
use super::throttle::Throttle;
use crate::config::{Config, ConfigError};
use crate::core::{DocumentType, RawInvoice, summarize, validate_invoice};
use crate::package::{self, PackageError};
use crate::sign::{self, DocumentSigner, SigningError};
use crate::sunat::{
    BillReply, BillResponse, BillService, ProtocolError, Receipt, ReceiptStore, SoapMethod,
    process_receipt,
};
use crate::ubl;

/// Internal failures of a pipeline step.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("build failed: {0}")]
    Build(#[from] crate::core::CpeError),
    #[error("signing failed: {0}")]
    Signing(#[from] SigningError),
    #[error("packaging failed: {0}")]
    Package(#[from] PackageError),
    #[error("artifact I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("pre-flight check failed: {0}")]
    Preflight(String),
}

impl PipelineError {
    fn detail(&self) -> ErrorDetail {
        match self {
            PipelineError::Protocol(e) => ErrorDetail::from(e),
            PipelineError::Store(StoreError::NotFound(_)) => {
                ErrorDetail::new("not_found", self.to_string())
            }
            PipelineError::Store(StoreError::InvalidState { .. }) => {
                ErrorDetail::new("invalid_state", self.to_string())
            }
            PipelineError::Store(StoreError::InFlight(_) | StoreError::Conflict { .. }) => {
                ErrorDetail::new("conflict", self.to_string())
            }
            PipelineError::Store(_) => ErrorDetail::new("storage", self.to_string()),
            PipelineError::Build(_) => ErrorDetail::new("build", self.to_string()),
            PipelineError::Signing(_) => ErrorDetail::new("signing", self.to_string()),
            PipelineError::Package(_) | PipelineError::Io(_) => {
                ErrorDetail::new("artifact", self.to_string())
            }
            PipelineError::Preflight(_) => ErrorDetail::new("preflight", self.to_string()),
        }
    }

    fn into_outcome<T>(self, message: &str) -> Outcome<T> {
        let detail = self.detail();
        Outcome::failed(format!("{message}: {self}"), vec![detail])
    }
}

/// Orchestrator tuning, usually derived from [`Config`].
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub xml_dir: PathBuf,
    pub zip_dir: PathBuf,
    pub receipt_dir: PathBuf,
    pub max_concurrency: usize,
    pub min_request_interval: Duration,
    pub retry_attempts: u32,
    pub retry_backoff: Duration,
    pub receipts_via_summary: bool,
}

impl From<&Config> for OrchestratorSettings {
    fn from(config: &Config) -> Self {
        Self {
            xml_dir: config.xml_dir.clone(),
            zip_dir: config.zip_dir.clone(),
            receipt_dir: config.receipt_dir.clone(),
            max_concurrency: config.max_concurrency.max(1),
            min_request_interval: config.min_request_interval,
            retry_attempts: config.retry_attempts.max(1),
            retry_backoff: config.retry_backoff,
            receipts_via_summary: config.receipts_via_summary,
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl OrchestratorSettings {
    /// Artifact directories under a single root.
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            xml_dir: root.join("xml"),
            zip_dir: root.join("zip"),
            receipt_dir: root.to_path_buf(),
            ..Self::default()
        }
    }
}

struct Inner {
    store: Arc<dyn DocumentStore>,
    signer: Arc<dyn DocumentSigner>,
    service: Arc<dyn BillService>,
    throttle: Throttle,
    receipts: ReceiptStore,
    settings: OrchestratorSettings,
}

/// Claim on a document, released on drop unless committed.
struct ClaimGuard<'a> {
    store: &'a dyn DocumentStore,
    id: DocumentId,
    observed: DocumentState,
    committed: bool,
}

impl ClaimGuard<'_> {
    fn commit(mut self, record: DocumentRecord) -> Result<(), StoreError> {
        self.committed = true;
        self.store.commit(self.observed, record)
    }
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.store.release(self.id);
        }
    }
}

/// What a remote exchange did to a document.
struct Applied {
    state: DocumentState,
    receipt: Option<Receipt>,
    errors: Vec<ErrorDetail>,
    message: String,
}

/// Drives validation, building, submission and polling of documents.
///
/// Cheap to clone; clones share the store, signer, service and throttle.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("settings", &self.inner.settings)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    pub fn new(
        settings: OrchestratorSettings,
        store: Arc<dyn DocumentStore>,
        signer: Arc<dyn DocumentSigner>,
        service: Arc<dyn BillService>,
    ) -> Self {
        let inner = Inner {
            store,
            signer,
            service,
            throttle: Throttle::new(settings.min_request_interval),
            receipts: ReceiptStore::new(settings.receipt_dir.clone()),
            settings,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Wire the signer and SOAP client described by `config`.
    pub fn from_config(config: &Config, store: Arc<dyn DocumentStore>) -> Result<Self, ConfigError> {
        let signer = config.build_signer()?;
        let client = config.build_client()?;
        Ok(Self::new(
            OrchestratorSettings::from(config),
            store,
            signer,
            Arc::new(client),
        ))
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.inner.settings
    }

    fn claim(&self, id: DocumentId, states: &[DocumentState]) -> Result<(ClaimGuard<'_>, DocumentRecord), StoreError> {
        let record = self.inner.store.claim(id, states)?;
        let guard = ClaimGuard {
            store: self.inner.store.as_ref(),
            id,
            observed: record.state,
            committed: false,
        };
        Ok((guard, record))
    }

    /// Validate a raw payload and store it as a new document.
    ///
    /// Invalid payloads create no record.
    pub fn validate(&self, raw: &RawInvoice) -> Outcome<ValidatedDocument> {
        self.validate_at(raw, Local::now().naive_local())
    }

    /// [`validate`](Self::validate) with an explicit clock for defaults.
    pub fn validate_at(&self, raw: &RawInvoice, now: NaiveDateTime) -> Outcome<ValidatedDocument> {
        let invoice = match validate_invoice(raw, now) {
            Ok(invoice) => invoice,
            Err(errors) => {
                debug!(errors = errors.len(), "payload rejected by validation");
                return Outcome::failed(
                    format!("validation failed: {}", summarize(&errors)),
                    errors.iter().map(ErrorDetail::from).collect(),
                );
            }
        };

        let mut record = DocumentRecord::new(invoice);
        record.state = DocumentState::Validated;
        let data = ValidatedDocument {
            id: record.id,
            document_id: record.invoice.document_id(),
        };
        if let Err(e) = self.inner.store.insert(record) {
            return PipelineError::from(e).into_outcome("cannot store document");
        }
        info!(id = %data.id, document_id = %data.document_id, state = "validated", "document validated");
        Outcome::ok("document validated", data)
    }

    /// Render, sign and package a validated document.
    pub fn build(&self, id: DocumentId) -> Outcome<BuiltDocument> {
        let (guard, mut record) = match self.claim(id, allowed::BUILD) {
            Ok(claimed) => claimed,
            Err(e) => return PipelineError::from(e).into_outcome("cannot build"),
        };

        match self.render(&record) {
            Ok(built) => {
                record.state = DocumentState::Built;
                record.xml_name = Some(built.xml_name.clone());
                record.zip_name = Some(built.zip_name.clone());
                record.errors = None;
                if let Err(e) = guard.commit(record) {
                    return PipelineError::from(e).into_outcome("cannot store build result");
                }
                info!(id = %id, xml = %built.xml_name, state = "built", "document built");
                Outcome::ok("document built", built)
            }
            Err(e) => {
                warn!(id = %id, error = %e, state = "build_error", "document build failed");
                let detail = e.detail();
                record.state = DocumentState::BuildError;
                record.errors = Some(e.to_string());
                if let Err(e) = guard.commit(record) {
                    return PipelineError::from(e).into_outcome("cannot store build result");
                }
                Outcome::failed(format!("build failed: {e}"), vec![detail])
            }
        }
    }

    fn render(&self, record: &DocumentRecord) -> Result<BuiltDocument, PipelineError> {
        let xml = ubl::to_ubl_xml(&record.invoice)?;
        let signed = self.inner.signer.sign(&xml)?;
        let xml_name = record.name.xml_name();
        let zip_name = record.name.zip_name();
        let archive = package::pack(&xml_name, signed.as_bytes())?;

        let settings = &self.inner.settings;
        std::fs::create_dir_all(&settings.xml_dir)?;
        std::fs::create_dir_all(&settings.zip_dir)?;
        std::fs::write(settings.xml_dir.join(&xml_name), signed.as_bytes())?;
        std::fs::write(settings.zip_dir.join(&zip_name), &archive)?;
        Ok(BuiltDocument { xml_name, zip_name })
    }

    /// Send a built document to the authority.
    pub async fn submit(&self, id: DocumentId) -> Outcome<SubmissionSummary> {
        let (guard, record) = match self.claim(id, allowed::SUBMIT) {
            Ok(claimed) => claimed,
            Err(e) => return PipelineError::from(e).into_outcome("cannot submit"),
        };
        self.send_claimed(guard, record).await
    }

    async fn send_claimed(&self, guard: ClaimGuard<'_>, mut record: DocumentRecord) -> Outcome<SubmissionSummary> {
        let id = record.id;

        let archive = match self.preflight(&record) {
            Ok(archive) => archive,
            Err(e) => {
                warn!(id = %id, error = %e, state = "validation_error", "pre-flight check failed");
                let detail = e.detail();
                record.state = DocumentState::ValidationError;
                record.errors = Some(e.to_string());
                let summary = summary_of(&record, None);
                if let Err(e) = guard.commit(record) {
                    return PipelineError::from(e).into_outcome("cannot store submission");
                }
                return Outcome::failed_with(format!("{e}"), vec![detail], summary);
            }
        };

        let method = if self.inner.settings.receipts_via_summary
            && record.invoice.document_type == DocumentType::Receipt
        {
            SoapMethod::SendSummary
        } else {
            SoapMethod::SendBill
        };
        let file_name = record.name.zip_name();

        info!(id = %id, method = method.as_str(), file = %file_name, "sending document");
        let result = self.send_with_retry(method, &file_name, &archive).await;
        let mut submission = SubmissionRecord::new(method, result.is_ok());

        let applied = match result {
            Ok(reply) => {
                submission.raw_response = Some(reply.raw.clone());
                match reply.response {
                    BillResponse::Ticket(ticket) => {
                        submission.ticket = Some(ticket.clone());
                        record.ticket = Some(ticket.clone());
                        Applied {
                            state: DocumentState::AwaitingTicket,
                            receipt: None,
                            errors: Vec::new(),
                            message: format!("document queued with ticket {ticket}"),
                        }
                    }
                    BillResponse::Receipt(bytes) => {
                        self.apply_receipt(&mut record, &mut submission, &bytes)
                    }
                    BillResponse::Pending { .. } | BillResponse::Acknowledged => Applied {
                        state: DocumentState::Submitted,
                        receipt: None,
                        errors: Vec::new(),
                        message: "document submitted".into(),
                    },
                }
            }
            Err(e) => {
                submission.error = Some(e.to_string());
                Applied {
                    state: DocumentState::Rejected,
                    receipt: None,
                    errors: vec![ErrorDetail::from(&e)],
                    message: format!("submission failed: {e}"),
                }
            }
        };

        self.finish(guard, record, submission, applied)
    }

    fn finish(
        &self,
        guard: ClaimGuard<'_>,
        mut record: DocumentRecord,
        submission: SubmissionRecord,
        applied: Applied,
    ) -> Outcome<SubmissionSummary> {
        let id = record.id;
        record.state = applied.state;
        record.errors = if applied.errors.is_empty() {
            None
        } else {
            Some(applied.message.clone())
        };
        record.submissions.push(submission);
        let summary = summary_of(&record, applied.receipt);

        if let Err(e) = guard.commit(record) {
            return PipelineError::from(e).into_outcome("cannot store submission");
        }
        info!(id = %id, state = summary.state.as_str(), "document state updated");

        if applied.errors.is_empty() {
            Outcome::ok(applied.message, summary)
        } else {
            Outcome::failed_with(applied.message, applied.errors, summary)
        }
    }

    /// Check the stored artifacts before anything is sent.
    fn preflight(&self, record: &DocumentRecord) -> Result<Vec<u8>, PipelineError> {
        let settings = &self.inner.settings;
        let (Some(xml_name), Some(zip_name)) = (&record.xml_name, &record.zip_name) else {
            return Err(PipelineError::Preflight("document has no built artifacts".into()));
        };
        let xml = std::fs::read_to_string(settings.xml_dir.join(xml_name))
            .map_err(|e| PipelineError::Preflight(format!("cannot read {xml_name}: {e}")))?;

        let root = document_root(&xml)?;
        if !ubl::is_document_root(&root) {
            return Err(PipelineError::Preflight(format!(
                "unexpected document root {root}"
            )));
        }
        if self.inner.signer.produces_signature() {
            sign::verify_signed_document(&xml)
                .map_err(|e| PipelineError::Preflight(e.to_string()))?;
        }

        std::fs::read(settings.zip_dir.join(zip_name))
            .map_err(|e| PipelineError::Preflight(format!("cannot read {zip_name}: {e}")))
    }

    async fn send_with_retry(
        &self,
        method: SoapMethod,
        file_name: &str,
        archive: &[u8],
    ) -> Result<BillReply, ProtocolError> {
        let settings = &self.inner.settings;
        let mut attempt = 1;
        loop {
            self.inner.throttle.wait().await;
            let result = match method {
                SoapMethod::SendSummary => self.inner.service.send_summary(file_name, archive).await,
                _ => self.inner.service.send_bill(file_name, archive).await,
            };
            match result {
                Err(e) if e.is_retryable() && attempt < settings.retry_attempts => {
                    let delay = settings.retry_backoff * 2u32.saturating_pow(attempt - 1);
                    warn!(method = method.as_str(), attempt, error = %e, "transport error, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Store and interpret a receipt archive.
    fn apply_receipt(
        &self,
        record: &mut DocumentRecord,
        submission: &mut SubmissionRecord,
        archive: &[u8],
    ) -> Applied {
        match self.inner.receipts.save(archive, &record.name) {
            Ok(stored) => {
                record.receipt_zip_path = Some(stored.zip_path.clone());
                record.receipt_xml_path = stored.xml_path.clone();
                submission.receipt_zip_path = Some(stored.zip_path);
                submission.receipt_xml_path = stored.xml_path;
            }
            Err(e) => warn!(id = %record.id, error = %e, "cannot store receipt"),
        }

        match process_receipt(archive, &record.name) {
            Ok(receipt) => {
                submission.receipt = Some(receipt.clone());
                let status = receipt.status();
                let description = receipt.description.clone().unwrap_or_default();
                if status.is_rejection() {
                    Applied {
                        state: DocumentState::Rejected,
                        errors: vec![ErrorDetail::new(receipt.response_code.clone(), description.clone())],
                        message: format!("rejected with code {}: {description}", receipt.response_code),
                        receipt: Some(receipt),
                    }
                } else {
                    Applied {
                        state: DocumentState::Accepted,
                        errors: Vec::new(),
                        message: format!("accepted with code {}", receipt.response_code),
                        receipt: Some(receipt),
                    }
                }
            }
            Err(e) => {
                warn!(id = %record.id, error = %e, "receipt could not be parsed");
                submission.error = Some(format!("receipt parse error: {e}"));
                Applied {
                    state: DocumentState::Accepted,
                    receipt: None,
                    errors: Vec::new(),
                    message: "receipt received".into(),
                }
            }
        }
    }

    /// Query the ticket of a document awaiting confirmation.
    pub async fn poll_status(&self, id: DocumentId) -> Outcome<SubmissionSummary> {
        let (guard, mut record) = match self.claim(id, allowed::POLL) {
            Ok(claimed) => claimed,
            Err(e) => return PipelineError::from(e).into_outcome("cannot poll"),
        };
        let Some(ticket) = record.ticket.clone() else {
            return Outcome::failed(
                "document has no ticket",
                vec![ErrorDetail::new("invalid_state", "document has no ticket")],
            );
        };

        debug!(id = %id, ticket = %ticket, "polling ticket");
        self.inner.throttle.wait().await;
        let result = self.inner.service.get_status(&ticket).await;
        let mut submission = SubmissionRecord::new(SoapMethod::GetStatus, result.is_ok());
        submission.ticket = Some(ticket.clone());

        let applied = match result {
            Ok(reply) => {
                submission.raw_response = Some(reply.raw.clone());
                match reply.response {
                    BillResponse::Receipt(bytes) => {
                        self.apply_receipt(&mut record, &mut submission, &bytes)
                    }
                    BillResponse::Pending { .. }
                    | BillResponse::Acknowledged
                    | BillResponse::Ticket(_) => Applied {
                        state: DocumentState::Processing,
                        receipt: None,
                        errors: Vec::new(),
                        message: format!("ticket {ticket} still processing"),
                    },
                }
            }
            Err(e) if e.is_retryable() => {
                warn!(id = %id, ticket = %ticket, error = %e, "status query failed, keeping state");
                submission.error = Some(e.to_string());
                Applied {
                    state: record.state,
                    receipt: None,
                    errors: vec![ErrorDetail::from(&e)],
                    message: format!("status query failed: {e}"),
                }
            }
            Err(e) => {
                submission.error = Some(e.to_string());
                Applied {
                    state: DocumentState::Rejected,
                    receipt: None,
                    errors: vec![ErrorDetail::from(&e)],
                    message: format!("status query rejected: {e}"),
                }
            }
        };

        self.finish(guard, record, submission, applied)
    }

    /// Reset a failed document to `Built` and send it again.
    pub async fn retry(&self, id: DocumentId) -> Outcome<SubmissionSummary> {
        let (guard, mut record) = match self.claim(id, allowed::RETRY) {
            Ok(claimed) => claimed,
            Err(e) => return PipelineError::from(e).into_outcome("cannot retry"),
        };
        record.state = DocumentState::Built;
        record.errors = None;
        if let Err(e) = guard.commit(record) {
            return PipelineError::from(e).into_outcome("cannot reset document");
        }
        info!(id = %id, state = "built", "document reset for retry");
        self.submit(id).await
    }

    /// Submit many documents concurrently, bounded by `max_concurrency`.
    pub async fn bulk_submit(&self, ids: Vec<DocumentId>) -> BulkReport {
        let items = self
            .fan_out(ids, |orchestrator, id| async move { orchestrator.submit(id).await })
            .await;
        let report = BulkReport::from_items(items);
        info!(total = report.total, succeeded = report.succeeded, failed = report.failed, "bulk submission finished");
        report
    }

    /// Poll every document with an outstanding ticket.
    pub async fn sweep_pending_tickets(&self) -> SweepReport {
        let ids = match self.inner.store.list_by_state(allowed::POLL) {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "cannot list pending tickets");
                return SweepReport::default();
            }
        };
        let items = self
            .fan_out(ids, |orchestrator, id| async move { orchestrator.poll_status(id).await })
            .await;
        debug!(checked = items.len(), "ticket sweep finished");
        SweepReport {
            checked: items.len(),
            items,
        }
    }

    async fn fan_out<F, Fut>(&self, ids: Vec<DocumentId>, operation: F) -> Vec<BulkItem>
    where
        F: Fn(Orchestrator, DocumentId) -> Fut,
        Fut: Future<Output = Outcome<SubmissionSummary>> + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.inner.settings.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();
        for (index, id) in ids.iter().copied().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let call = operation(self.clone(), id);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                (index, id, call.await)
            });
        }

        let mut items: Vec<Option<BulkItem>> = vec![None; ids.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, id, outcome)) => {
                    items[index] = Some(BulkItem {
                        id,
                        success: outcome.success,
                        state: outcome.data.as_ref().map(|d| d.state),
                        message: outcome.message,
                    });
                }
                Err(e) => warn!(error = %e, "bulk task failed"),
            }
        }

        ids.into_iter()
            .zip(items)
            .map(|(id, item)| {
                item.unwrap_or_else(|| BulkItem {
                    id,
                    success: false,
                    state: None,
                    message: "task aborted".into(),
                })
            })
            .collect()
    }

    /// Current state, ticket and latest exchange of a document.
    pub fn status(&self, id: DocumentId) -> Outcome<DocumentStatus> {
        match self.inner.store.get(id) {
            Ok(Some(record)) => Outcome::ok(
                format!("document is {}", record.state),
                DocumentStatus {
                    id: record.id,
                    document_id: record.invoice.document_id(),
                    state: record.state,
                    ticket: record.ticket.clone(),
                    errors: record.errors.clone(),
                    receipt_zip_path: record.receipt_zip_path.clone(),
                    receipt_xml_path: record.receipt_xml_path.clone(),
                    latest_submission: record.latest_submission().cloned(),
                },
            ),
            Ok(None) => PipelineError::from(StoreError::NotFound(id)).into_outcome("unknown document"),
            Err(e) => PipelineError::from(e).into_outcome("cannot read document"),
        }
    }
}

fn summary_of(record: &DocumentRecord, receipt: Option<Receipt>) -> SubmissionSummary {
    SubmissionSummary {
        id: record.id,
        state: record.state,
        ticket: record.ticket.clone(),
        receipt,
    }
}

/// Local name of the document element.
fn document_root(xml: &str) -> Result<String, PipelineError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Ok(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) => {
                return Err(PipelineError::Preflight("document has no root element".into()));
            }
            Ok(_) => {}
            Err(e) => return Err(PipelineError::Preflight(format!("malformed XML: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_detection() {
        assert_eq!(
            document_root("<?xml version=\"1.0\"?><Invoice xmlns=\"x\"/>").unwrap(),
            "Invoice"
        );
        assert_eq!(document_root("<a:CreditNote xmlns:a=\"x\"></a:CreditNote>").unwrap(), "CreditNote");
        assert!(document_root("").is_err());
    }

    #[test]
    fn settings_from_root() {
        let settings = OrchestratorSettings::with_root("/tmp/cpe");
        assert_eq!(settings.xml_dir, PathBuf::from("/tmp/cpe/xml"));
        assert_eq!(settings.zip_dir, PathBuf::from("/tmp/cpe/zip"));
        assert_eq!(settings.receipt_dir, PathBuf::from("/tmp/cpe"));
    }
}
