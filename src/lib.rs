//! # comprobante
//!
//! Peruvian electronic tax documents (comprobantes de pago electrónicos)
//! from payload to SUNAT receipt: validation, UBL 2.1 generation, XML-DSig
//! signing, zip packaging, SOAP submission and CDR processing.
//!
//! All monetary values use [`rust_decimal::Decimal`]; amounts are rounded
//! half-up to two places and reconciled with a tolerance of `0.01`.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use comprobante::core::*;
//!
//! let raw: RawInvoice = serde_json::from_value(serde_json::json!({
//!     "documentType": "01",
//!     "series": "F001",
//!     "number": 123,
//!     "issueDate": "2025-03-01",
//!     "currency": "PEN",
//!     "grossTaxable": "156.78",
//!     "tax": "28.22",
//!     "taxInclusive": "185.00",
//!     "payable": "185.00",
//!     "issuer": {
//!         "idType": "6",
//!         "id": "20100066603",
//!         "legalName": "EMPRESA DE PRUEBAS S.A.C.",
//!         "address": { "ubigeo": "150101", "line": "AV. LIMA 123", "district": "LIMA",
//!                      "province": "LIMA", "department": "LIMA" }
//!     },
//!     "customer": { "idType": "6", "id": "20601030013", "legalName": "CLIENTE S.A.C." },
//!     "lines": [{
//!         "quantity": "1",
//!         "unitCode": "ZZ",
//!         "unitPrice": "156.78",
//!         "lineTotal": "156.78",
//!         "description": "Servicio de consultoría"
//!     }]
//! }))
//! .unwrap();
//!
//! let now = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
//! let invoice = validate_invoice(&raw, now).unwrap();
//! assert_eq!(invoice.document_id(), "F001-00000123");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` | Document types, RUC checksum, staged validation |
//! | `ubl` | UBL 2.1 generation, zip packaging |
//! | `sign` | Exclusive c14n, XML-DSig enveloped RSA-SHA256 signing and verification |
//! | `sunat` | `billService` SOAP client, CDR receipt parsing |
//! | `pipeline` | Orchestrator state machine, configuration, telemetry |
//! | `all` (default) | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "ubl")]
pub mod ubl;

#[cfg(feature = "ubl")]
pub mod package;

#[cfg(feature = "sign")]
pub mod sign;

#[cfg(feature = "sunat")]
pub mod sunat;

#[cfg(feature = "pipeline")]
pub mod pipeline;

#[cfg(feature = "pipeline")]
pub mod config;

#[cfg(feature = "pipeline")]
pub mod telemetry;
