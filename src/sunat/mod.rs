//! SUNAT `billService` integration: SOAP client and receipt handling.
//!
//! Documents are uploaded with `sendBill` (immediate receipt) or
//! `sendSummary` (deferred ticket), and tickets are polled with `getStatus`.
//!
//! ```rust,no_run
//! use comprobante::sunat::{BillResponse, BillService, Environment, SoapClient, SolCredentials};
//!
//! # async fn run(archive: Vec<u8>) -> Result<(), comprobante::sunat::ProtocolError> {
//! let client = SoapClient::for_environment(Environment::Beta, SolCredentials::beta_test())?;
//! let reply = client.send_bill("20000000001-01-F001-00000001.zip", &archive).await?;
//! if let BillResponse::Ticket(ticket) = reply.response {
//!     let _ = client.get_status(&ticket).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod cdr;
mod client;
mod config;
pub mod soap;

pub use cdr::{Receipt, ReceiptError, ReceiptStatus, ReceiptStore, StoredReceipt, process_receipt};
pub use client::{BillReply, BillService, DEFAULT_TIMEOUT, SoapClient};
pub use config::{Environment, EnvironmentParseError, SolCredentials};
pub use soap::{BillResponse, ProtocolError, SoapMethod, parse_response};
