//! Document lifecycle: validation, build, submission and ticket polling.
//!
//! Every document moves through [`DocumentState`]; transitions go through
//! the [`DocumentStore`] claim/commit protocol so two operations can never
//! race on the same document.
//!
//! ```rust,no_run
//! use comprobante::config::Config;
//! use comprobante::core::RawInvoice;
//! use comprobante::pipeline::{InMemoryStore, Orchestrator};
//!
//! # async fn run(raw: RawInvoice) -> Result<(), comprobante::config::ConfigError> {
//! let config = Config::from_env()?;
//! let orchestrator = Orchestrator::from_config(&config, InMemoryStore::arc())?;
//!
//! let validated = orchestrator.validate(&raw);
//! if let Some(doc) = validated.data {
//!     orchestrator.build(doc.id);
//!     let submitted = orchestrator.submit(doc.id).await;
//!     println!("{}", submitted.message);
//! }
//! # Ok(())
//! # }
//! ```

mod orchestrator;
mod outcome;
mod state;
mod store;
mod sweeper;
mod throttle;

pub use orchestrator::{Orchestrator, OrchestratorSettings, PipelineError};
pub use outcome::{
    BuiltDocument, BulkItem, BulkReport, DocumentStatus, ErrorDetail, Outcome, SubmissionSummary,
    SweepReport, ValidatedDocument,
};
pub use state::{DocumentState, allowed};
pub use store::{
    DocumentId, DocumentRecord, DocumentStore, InMemoryStore, StoreError, SubmissionRecord,
};
pub use sweeper::{SweeperHandle, SweeperStats, spawn_ticket_sweeper};
pub use throttle::Throttle;
